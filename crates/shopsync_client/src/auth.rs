//! Request signing.
//!
//! The platform authenticates every request with a keyed hash over
//!
//! ```text
//! public_key|METHOD|uri|body|timestamp
//! ```
//!
//! where `uri` is the request path and query with the base URL removed and
//! `timestamp` is UTC in `YYYY-MM-DDTHH:MM:SSZ`. The hash is HMAC-SHA512 with
//! the secret key, hex encoded. Headers sent: `x-public`, `x-date`, `x-hash`.
//! Timestamps are single use, so a signature is computed per attempt.

use crate::transport::Method;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Header carrying the public key.
pub const HEADER_PUBLIC: &str = "x-public";
/// Header carrying the signing timestamp.
pub const HEADER_DATE: &str = "x-date";
/// Header carrying the signature.
pub const HEADER_HASH: &str = "x-hash";

/// Computes authentication headers for one request.
pub trait RequestSigner: Send + Sync {
    /// Returns the headers to attach to a request to `url`.
    fn sign(
        &self,
        method: Method,
        url: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Vec<(String, String)>;
}

/// HMAC-SHA512 signer.
#[derive(Clone)]
pub struct HmacSigner {
    base_url: String,
    public_key: String,
    secret_key: String,
}

impl HmacSigner {
    /// Creates a signer for requests below `base_url`.
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Returns the part of `url` that is signed.
    pub fn relative_uri<'a>(&self, url: &'a str) -> &'a str {
        if self.base_url.is_empty() {
            return url;
        }
        url.strip_prefix(self.base_url.as_str()).unwrap_or(url)
    }

    /// Formats a signing timestamp.
    pub fn timestamp(now: DateTime<Utc>) -> String {
        now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }

    /// Computes the hex signature of a request.
    pub fn signature(&self, method: Method, url: &str, body: &str, timestamp: &str) -> String {
        let message = format!(
            "{}|{}|{}|{}|{}",
            self.public_key,
            method.as_str(),
            self.relative_uri(url),
            body,
            timestamp
        );
        let mut mac = HmacSha512::new_from_slice(self.secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for HmacSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSigner")
            .field("base_url", &self.base_url)
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

impl RequestSigner for HmacSigner {
    fn sign(
        &self,
        method: Method,
        url: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Vec<(String, String)> {
        let timestamp = Self::timestamp(now);
        let hash = self.signature(method, url, body, &timestamp);
        vec![
            (HEADER_PUBLIC.to_string(), self.public_key.clone()),
            (HEADER_HASH.to_string(), hash),
            (HEADER_DATE.to_string(), timestamp),
        ]
    }
}

/// Signer that adds no headers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSigner;

impl RequestSigner for NoopSigner {
    fn sign(&self, _: Method, _: &str, _: &str, _: DateTime<Utc>) -> Vec<(String, String)> {
        Vec::new()
    }
}
