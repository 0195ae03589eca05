//! The adapter contract.

use crate::applier::HookSet;
use crate::error::SyncResult;
use async_trait::async_trait;
use shopsync_core::EntityStore;

/// A source or destination that materializes its records into a store.
///
/// When [`load`](Adapter::load) returns `Ok`, every entity's identity is final
/// and every child slot is fully populated; the diff engine treats the store
/// as a snapshot from then on.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    /// The store this adapter fills.
    fn store(&self) -> &EntityStore;

    /// Populates the store.
    async fn load(&self) -> SyncResult<()>;
}

/// An adapter that can also be written to.
pub trait Destination: Adapter {
    /// Create, update and delete hooks per model kind.
    fn hooks(&self) -> &HookSet;
}
