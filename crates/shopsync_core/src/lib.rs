//! # shopsync core
//!
//! The identity-addressed entity graph shared by every shopsync adapter.
//!
//! This crate provides:
//! - Attribute values and the `fields!` map builder
//! - Model kinds with static schemas (identifiers, attributes, child slots)
//! - Typed records for each kind
//! - `EntityStore`, the per-load container with get-or-instantiate and
//!   child attachment that is safe to call from concurrent workers
//!
//! ## Key Invariants
//!
//! - Identities are immutable; equal identities of one kind are one entity
//! - Registration is first-write-wins
//! - A child is attached to at most one parent, and re-attaching is a no-op

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod identity;
mod model;
mod records;
mod store;
mod value;

pub use entity::Entity;
pub use error::{CoreError, CoreResult};
pub use identity::{Identity, KEY_SEPARATOR};
pub use model::{AttributeSpec, ChildSlot, ModelKind, ModelSchema, ValueType};
pub use records::{
    Attribute, AttributeAssignment, AttributeValue, Brand, Category, CategoryAssignment, Package,
    Product, ProductPhoto, Record, Supplier,
};
pub use store::EntityStore;
pub use value::{Attributes, Value};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
