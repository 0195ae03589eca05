//! # shopsync client
//!
//! Resilient, paginated HTTP client for the destination shop platform.
//!
//! This crate provides:
//! - `ShopClient`, applying one retry policy to every outbound call
//! - Exponential backoff for connection failures, fixed wait for HTTP 429
//! - Pagination of list endpoints into one `PagedResult`
//! - Pluggable per-request signing (`HmacSigner` for HMAC-SHA512)
//! - An `HttpTransport` seam with a `reqwest` implementation and a scripted
//!   `MockTransport`
//!
//! ## Key Invariants
//!
//! - Transient failures never reach callers unless the retry budget is spent
//! - Connection and rate-limit retries are counted independently
//! - Every attempt is signed with a fresh timestamp
//! - Only the path below the base URL is signed

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod client;
mod config;
mod endpoints;
mod error;
mod paging;
mod transport;

pub use auth::{HmacSigner, NoopSigner, RequestSigner, HEADER_DATE, HEADER_HASH, HEADER_PUBLIC};
pub use client::{ApiResponse, ShopClient};
pub use config::{ClientConfig, RateLimitConfig, RetryConfig, MAX_PAGE_SIZE};
pub use endpoints::API_PREFIX;
pub use error::{ClientError, ClientResult};
pub use paging::{PageLimit, PagedResult};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, ReqwestTransport,
    TransportError,
};
