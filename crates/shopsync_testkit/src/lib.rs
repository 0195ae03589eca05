//! # shopsync testkit
//!
//! Test utilities for shopsync.
//!
//! This crate provides:
//! - Catalog fixtures that build products with their options, category
//!   assignments and photos in an `EntityStore`
//! - In-memory source and destination adapters
//! - Recording hooks with injectable failures
//! - Property-based test generators using proptest
//! - A scripted shop client for retry and pagination scenarios
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopsync_testkit::prelude::*;
//!
//! let log = CallLog::new().shared();
//! let dest = MemoryDestination::new(MemoryAdapter::new("dest"), log.hook_set());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod adapters;
pub mod fixtures;
pub mod generators;
pub mod hooks;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::hooks::*;
}

pub use adapters::*;
pub use fixtures::*;
pub use generators::*;
pub use hooks::*;
