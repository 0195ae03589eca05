//! # shopsync engine
//!
//! Reconciliation of two entity stores.
//!
//! This crate provides:
//! - The `Adapter` contract and a bounded `WorkerPool` for loading
//! - `DiffEngine`, which turns a source and a destination store into a `DiffTree`
//! - Domain comparators that order size and colour options before diffing
//! - `SyncApplier`, which applies a `DiffTree` through per-kind hooks
//! - Text and JSON renderings of diffs, and `SyncReport` for outcomes
//!
//! ## Architecture
//!
//! A run has three phases:
//! 1. Load: each adapter fills its own `EntityStore`
//! 2. Diff: entities are matched by identity, top-level kinds first, then
//!    child slot by child slot
//! 3. Sync: the tree is walked sequentially and every element is dispatched
//!    to the destination's `Creatable`, `Updatable` or `Deletable` hook
//!
//! ## Key Invariants
//!
//! - Entities correspond across stores by identity only
//! - Unchanged elements are kept so their children are visited
//! - Removal cascades to every descendant
//! - Dependents of a failed create are skipped, never attempted

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod adapter;
mod applier;
mod config;
mod diff;
mod engine;
mod error;
mod ordering;
mod pool;
mod render;
mod report;

pub use adapter::{Adapter, Destination};
pub use applier::{Creatable, Deletable, HookSet, SyncApplier, Updatable};
pub use config::{FailurePolicy, SyncConfig};
pub use diff::{DiffAction, DiffElement, DiffEngine, DiffSummary, DiffTree};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use ordering::{
    normalize, order_by_reference, order_by_size, AttributeOrdering, ChildOrdering, LoadOrder,
    SizeKey,
};
pub use pool::{PoolOutcome, WorkerPool};
pub use render::{render_text, to_json, NO_CHANGES};
pub use report::{SyncFailure, SyncReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
