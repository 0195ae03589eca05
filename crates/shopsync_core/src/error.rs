//! Error types for the entity graph.

use crate::model::{ModelKind, ValueType};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building or querying an entity graph.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CoreError {
    /// No entity with the given identity exists in the store.
    #[error("{kind} {key:?} not found in store {store}")]
    NotFound {
        /// Store that was searched.
        store: String,
        /// Model kind that was searched.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
    },

    /// An entity with the given identity is already registered.
    #[error("{kind} {key:?} already exists in store {store}")]
    AlreadyExists {
        /// Store holding the entity.
        store: String,
        /// Model kind.
        kind: ModelKind,
        /// Stringified identity.
        key: String,
    },

    /// The entity's identity does not match its schema.
    #[error("malformed {kind}: {reason}")]
    MalformedEntity {
        /// Model kind being built or compared.
        kind: ModelKind,
        /// What is wrong with it.
        reason: String,
    },

    /// An attribute that the schema does not declare.
    #[error("{kind} has no attribute {name:?}")]
    UnknownAttribute {
        /// Model kind.
        kind: ModelKind,
        /// Offending attribute name.
        name: String,
    },

    /// A required attribute was not supplied.
    #[error("{kind} requires attribute {name:?}")]
    MissingAttribute {
        /// Model kind.
        kind: ModelKind,
        /// Missing attribute name.
        name: String,
    },

    /// A field holds a value of the wrong type.
    #[error("{kind}.{field} expects {expected}, got {found}")]
    InvalidValue {
        /// Model kind.
        kind: ModelKind,
        /// Field name.
        field: String,
        /// Declared type.
        expected: ValueType,
        /// Description of the rejected value.
        found: String,
    },

    /// The parent kind has no child slot with this name.
    #[error("{kind} has no child slot {slot:?}")]
    UnknownChildSlot {
        /// Parent kind.
        kind: ModelKind,
        /// Requested slot.
        slot: String,
    },

    /// The child kind does not match the kind declared for the slot.
    #[error("slot {slot:?} holds {expected}, not {found}")]
    ChildKindMismatch {
        /// Slot name.
        slot: String,
        /// Kind declared by the schema.
        expected: ModelKind,
        /// Kind that was offered.
        found: ModelKind,
    },

    /// The child is already attached to another parent in this slot.
    #[error("{kind} {key:?} is already attached to {parent:?}")]
    AlreadyAttached {
        /// Child kind.
        kind: ModelKind,
        /// Child identity.
        key: String,
        /// Identity of the current parent.
        parent: String,
    },

    /// A model name that is not part of the catalogue.
    #[error("unknown model kind: {0}")]
    UnknownModel(String),
}

impl CoreError {
    /// Returns true if this error reports a missing entity.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}
