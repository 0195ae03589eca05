//! CCV Shop destination.
//!
//! [`CcvAdapter`] loads the products under the configured root category,
//! together with the reference data needed to resolve them, and exposes the
//! create, update and delete hooks that write diffs back through the REST API.
//!
//! ## Remote ids
//!
//! Every loaded or created entity carries its remote `id` as an extra.
//! Category assignments additionally carry `category_id` and `product_id`.
//! Hooks never look ids up remotely; an entity without an id in the store
//! cannot be referenced.

mod hooks;
mod loader;

use crate::settings::CcvSettings;
use async_trait::async_trait;
use shopsync_client::{HttpTransport, ReqwestTransport, ShopClient};
use shopsync_core::EntityStore;
use shopsync_engine::{Adapter, Destination, HookSet, SyncError, SyncResult};
use std::sync::Arc;

pub use hooks::remote_id;

/// The CCV Shop destination adapter.
pub struct CcvAdapter<T = ReqwestTransport> {
    client: Arc<ShopClient<T>>,
    store: Arc<EntityStore>,
    settings: CcvSettings,
    hooks: HookSet,
    workers: usize,
}

impl<T: HttpTransport + 'static> CcvAdapter<T> {
    /// Name used for the store and in logs.
    pub const NAME: &'static str = "ccv_shop";

    /// Creates an adapter with 10 load workers.
    pub fn new(client: ShopClient<T>, settings: CcvSettings) -> Self {
        let client = Arc::new(client);
        let hooks = hooks::hook_set(&client);
        Self {
            client,
            store: Arc::new(EntityStore::new(Self::NAME)),
            settings,
            hooks,
            workers: 10,
        }
    }

    /// Sets the number of concurrent per-product load jobs.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Returns the API client.
    pub fn client(&self) -> &ShopClient<T> {
        &self.client
    }

    /// Returns the settings.
    pub fn settings(&self) -> &CcvSettings {
        &self.settings
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Adapter for CcvAdapter<T> {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn store(&self) -> &EntityStore {
        &self.store
    }

    async fn load(&self) -> SyncResult<()> {
        self.settings
            .validate()
            .map_err(|e| SyncError::load(Self::NAME, e))?;
        loader::load(
            &self.client,
            &self.store,
            &self.settings.root_category,
            self.workers,
        )
        .await
        .map_err(|e| SyncError::load(Self::NAME, e))
    }
}

impl<T: HttpTransport + 'static> Destination for CcvAdapter<T> {
    fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}
