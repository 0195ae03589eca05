//! The resilient client.

use crate::auth::{HmacSigner, RequestSigner};
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
use chrono::Utc;
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, error, warn};

/// Result of one API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status_code: u16,
    /// Parsed JSON body, if the method returns one.
    pub data: Option<Value>,
}

impl ApiResponse {
    /// Returns the numeric `id` field of the body.
    pub fn id(&self) -> Option<i64> {
        self.data.as_ref().and_then(|d| d.get("id")).and_then(Value::as_i64)
    }
}

/// Authenticated HTTP client with retry and pagination.
///
/// Every call goes through the same policy:
/// 1. transport failures are retried with exponential backoff,
/// 2. HTTP 429 is retried after a fixed wait, counted separately,
/// 3. any other non-2xx is returned as [`ClientError::Http`],
/// 4. a 2xx body that should be JSON but is not is [`ClientError::Parse`].
pub struct ShopClient<T = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    signer: Box<dyn RequestSigner>,
}

impl ShopClient<ReqwestTransport> {
    /// Creates a client talking HTTP through `reqwest`.
    pub fn from_config(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(config.timeout, config.verify_tls)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: HttpTransport> ShopClient<T> {
    /// Creates a client over a custom transport, signing with HMAC-SHA512.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        let signer = HmacSigner::new(
            config.base_url.clone(),
            config.public_key.clone(),
            config.secret_key.clone(),
        );
        Self {
            config,
            transport,
            signer: Box::new(signer),
        }
    }

    /// Replaces the request signer.
    pub fn with_signer(mut self, signer: impl RequestSigner + 'static) -> Self {
        self.signer = Box::new(signer);
        self
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Builds the absolute URL for `uri`, normalized to `/<path>/`.
    pub fn url_for(&self, uri: &str, params: &[(&str, String)]) -> ClientResult<String> {
        let path = format!("/{}/", uri.trim_matches('/'));
        let mut url = Url::parse(&format!("{}{}", self.config.base_url, path))
            .map_err(|e| ClientError::InvalidConfig(format!("invalid url for {uri}: {e}")))?;
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url.into())
    }

    /// Issues a GET.
    pub async fn get(&self, uri: &str, params: &[(&str, String)]) -> ClientResult<ApiResponse> {
        self.request(Method::Get, uri, params, None).await
    }

    /// Issues a POST with a JSON body.
    pub async fn post(&self, uri: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.request(Method::Post, uri, &[], Some(body)).await
    }

    /// Issues a PATCH with a JSON body.
    pub async fn patch(&self, uri: &str, body: &Value) -> ClientResult<ApiResponse> {
        self.request(Method::Patch, uri, &[], Some(body)).await
    }

    /// Issues a DELETE.
    pub async fn delete(&self, uri: &str) -> ClientResult<ApiResponse> {
        self.request(Method::Delete, uri, &[], None).await
    }

    /// Issues a request under the retry policy.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
    ) -> ClientResult<ApiResponse> {
        let url = self.url_for(uri, params)?;
        let body = body.map(Value::to_string);
        let retry = &self.config.retry;
        let rate_limit = &self.config.rate_limit;

        let mut connection_retries = 0u32;
        let mut rate_limit_retries = 0u32;
        loop {
            let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
            headers.extend(self.signer.sign(
                method,
                &url,
                body.as_deref().unwrap_or(""),
                Utc::now(),
            ));
            let request = HttpRequest {
                method,
                url: url.clone(),
                headers,
                body: body.clone(),
            };
            debug!(%method, url = %url, "sending request");

            let response = match self.transport.send(request).await {
                Ok(response) => response,
                Err(err) if err.is_transient() => {
                    if connection_retries >= retry.max_attempts {
                        error!(%method, url = %url, attempts = connection_retries + 1, error = %err, "connection failed");
                        return Err(ClientError::Connection {
                            attempts: connection_retries + 1,
                            message: err.to_string(),
                        });
                    }
                    connection_retries += 1;
                    let wait = retry.delay_for_retry(connection_retries);
                    warn!(
                        %method,
                        url = %url,
                        attempt = connection_retries,
                        max_attempts = retry.max_attempts,
                        wait_secs = wait.as_secs_f64(),
                        error = %err,
                        "connection error, retrying"
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
                Err(err) => return Err(ClientError::Request(err.to_string())),
            };

            if response.status == 429 {
                if rate_limit_retries >= rate_limit.max_attempts {
                    error!(%method, url = %url, attempts = rate_limit_retries + 1, "rate limit not lifted");
                    return Err(ClientError::RateLimited {
                        attempts: rate_limit_retries + 1,
                    });
                }
                rate_limit_retries += 1;
                warn!(
                    %method,
                    url = %url,
                    attempt = rate_limit_retries,
                    wait_secs = rate_limit.wait.as_secs_f64(),
                    "rate limited, retrying"
                );
                tokio::time::sleep(rate_limit.wait).await;
                continue;
            }

            return Self::finish(method, response);
        }
    }

    fn finish(method: Method, response: HttpResponse) -> ClientResult<ApiResponse> {
        if !response.is_success() {
            warn!(status = response.status, body = %response.body, "non-2xx response");
            return Err(ClientError::Http {
                status: response.status,
                body: response.body,
            });
        }
        let data = if method.expects_body() && response.status != 204 {
            let value = serde_json::from_str(&response.body)
                .map_err(|e| ClientError::Parse(format!("{e} (status {})", response.status)))?;
            Some(value)
        } else {
            None
        };
        Ok(ApiResponse {
            status_code: response.status,
            data,
        })
    }
}

impl<T> std::fmt::Debug for ShopClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}
