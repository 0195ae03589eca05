//! Error types for diffing and syncing.

use shopsync_core::{CoreError, ModelKind};
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors raised while loading, diffing or applying a diff.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Entity graph error (lookup, validation, malformed identity).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A create hook could not resolve a dependency or the remote rejected it.
    #[error("{kind} {key:?} not created: {reason}")]
    ObjectNotCreated {
        /// Model kind.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
        /// Cause.
        reason: String,
    },

    /// A referenced object is missing locally or remotely.
    #[error("{kind} {key:?} not found: {reason}")]
    ObjectNotFound {
        /// Model kind.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
        /// Cause.
        reason: String,
    },

    /// An update hook failed.
    #[error("{kind} {key:?} not updated: {reason}")]
    ObjectNotUpdated {
        /// Model kind.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
        /// Cause.
        reason: String,
    },

    /// A delete hook failed.
    #[error("{kind} {key:?} not deleted: {reason}")]
    ObjectNotDeleted {
        /// Model kind.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
        /// Cause.
        reason: String,
    },

    /// No hook is registered for this kind and action.
    #[error("no {action} hook registered for {kind}")]
    HookMissing {
        /// Model kind.
        kind: ModelKind,
        /// "create", "update" or "delete".
        action: &'static str,
    },

    /// An adapter failed to load.
    #[error("adapter {adapter} failed to load: {source}")]
    Load {
        /// Adapter name.
        adapter: String,
        /// Underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl SyncError {
    /// Creates an [`SyncError::ObjectNotCreated`].
    pub fn not_created(kind: ModelKind, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::ObjectNotCreated {
            kind,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an [`SyncError::ObjectNotFound`].
    pub fn not_found(kind: ModelKind, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::ObjectNotFound {
            kind,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an [`SyncError::ObjectNotUpdated`].
    pub fn not_updated(kind: ModelKind, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::ObjectNotUpdated {
            kind,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an [`SyncError::ObjectNotDeleted`].
    pub fn not_deleted(kind: ModelKind, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::ObjectNotDeleted {
            kind,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Wraps an adapter load failure.
    pub fn load(
        adapter: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Load {
            adapter: adapter.into(),
            source: source.into(),
        }
    }

    /// Returns true if the error concerns a single entity and a
    /// continue-on-failure run may proceed past it.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            SyncError::ObjectNotCreated { .. }
                | SyncError::ObjectNotFound { .. }
                | SyncError::ObjectNotUpdated { .. }
                | SyncError::ObjectNotDeleted { .. }
        )
    }
}
