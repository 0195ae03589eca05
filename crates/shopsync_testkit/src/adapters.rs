//! In-memory adapters.

use crate::fixtures::{insert_attribute_values, ProductFixture};
use async_trait::async_trait;
use shopsync_core::EntityStore;
use shopsync_engine::{Adapter, Destination, HookSet, SyncError, SyncResult};

/// An adapter that loads a fixed set of fixtures.
#[derive(Debug)]
pub struct MemoryAdapter {
    name: String,
    store: EntityStore,
    products: Vec<ProductFixture>,
    references: Vec<(String, Vec<String>)>,
    load_error: Option<String>,
}

impl MemoryAdapter {
    /// Creates an adapter with nothing to load.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            store: EntityStore::new(name.clone()),
            name,
            products: Vec::new(),
            references: Vec::new(),
            load_error: None,
        }
    }

    /// Adds products to load.
    pub fn with_products(mut self, products: impl IntoIterator<Item = ProductFixture>) -> Self {
        self.products.extend(products);
        self
    }

    /// Adds an attribute and its values to load.
    pub fn with_attribute_values(mut self, attribute: &str, values: &[&str]) -> Self {
        self.references.push((
            attribute.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    /// Makes [`load`](Adapter::load) fail with `reason`.
    pub fn failing_load(mut self, reason: impl Into<String>) -> Self {
        self.load_error = Some(reason.into());
        self
    }
}

#[async_trait]
impl Adapter for MemoryAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn store(&self) -> &EntityStore {
        &self.store
    }

    async fn load(&self) -> SyncResult<()> {
        if let Some(reason) = &self.load_error {
            return Err(SyncError::load(self.name.clone(), reason.clone()));
        }
        for (attribute, values) in &self.references {
            let values: Vec<&str> = values.iter().map(String::as_str).collect();
            insert_attribute_values(&self.store, attribute, &values)?;
        }
        for product in &self.products {
            product.insert(&self.store)?;
        }
        Ok(())
    }
}

/// A [`MemoryAdapter`] with hooks, usable as a sync destination.
pub struct MemoryDestination {
    adapter: MemoryAdapter,
    hooks: HookSet,
}

impl MemoryDestination {
    /// Wraps `adapter` with `hooks`.
    pub fn new(adapter: MemoryAdapter, hooks: HookSet) -> Self {
        Self { adapter, hooks }
    }
}

#[async_trait]
impl Adapter for MemoryDestination {
    fn name(&self) -> &str {
        self.adapter.name()
    }

    fn store(&self) -> &EntityStore {
        self.adapter.store()
    }

    async fn load(&self) -> SyncResult<()> {
        self.adapter.load().await
    }
}

impl Destination for MemoryDestination {
    fn hooks(&self) -> &HookSet {
        &self.hooks
    }
}
