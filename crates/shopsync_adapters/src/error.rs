//! Error types for the adapters.

use shopsync_client::ClientError;
use shopsync_core::{CoreError, ModelKind};
use thiserror::Error;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors raised while loading an adapter or running one of its hooks.
#[derive(Error, Debug)]
pub enum AdapterError {
    /// The remote API call failed.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Building or querying the entity graph failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A catalog file is not valid JSON or does not match the row layout.
    #[error("invalid catalog: {0}")]
    Json(#[from] serde_json::Error),

    /// Adapter settings are missing or invalid.
    #[error("invalid settings: {0}")]
    Settings(String),

    /// The configured root category does not exist at the destination.
    #[error("root category {0:?} not found")]
    RootCategoryMissing(String),

    /// A listed item lacks a field the loader needs.
    #[error("malformed {resource} item: {reason}")]
    Malformed {
        /// Listing the item came from.
        resource: &'static str,
        /// What is missing or wrong.
        reason: String,
    },

    /// An item references a remote id that was not loaded.
    #[error("unknown {kind} id {id}")]
    UnknownReference {
        /// Kind of the referenced object.
        kind: ModelKind,
        /// Remote id.
        id: i64,
    },
}

impl AdapterError {
    pub(crate) fn malformed(resource: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            resource,
            reason: reason.into(),
        }
    }
}
