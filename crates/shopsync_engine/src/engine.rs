//! Orchestration of one reconciliation run.

use crate::adapter::{Adapter, Destination};
use crate::applier::SyncApplier;
use crate::config::SyncConfig;
use crate::diff::{DiffEngine, DiffTree};
use crate::error::SyncResult;
use crate::report::SyncReport;
use std::time::Instant;
use tracing::info;

/// Loads a source and a destination, diffs them and applies the diff.
pub struct SyncEngine<S: Adapter, D: Destination> {
    source: S,
    dest: D,
    differ: DiffEngine,
    config: SyncConfig,
}

impl<S: Adapter, D: Destination> SyncEngine<S, D> {
    /// Creates an engine with a load-order [`DiffEngine`].
    pub fn new(source: S, dest: D, config: SyncConfig) -> Self {
        Self {
            source,
            dest,
            differ: DiffEngine::new(),
            config,
        }
    }

    /// Replaces the diff engine (for example to install child ordering).
    pub fn with_diff_engine(mut self, differ: DiffEngine) -> Self {
        self.differ = differ;
        self
    }

    /// Returns the source adapter.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the destination adapter.
    pub fn dest(&self) -> &D {
        &self.dest
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Loads the source, then the destination.
    pub async fn load(&self) -> SyncResult<()> {
        for adapter in [&self.source as &dyn Adapter, &self.dest as &dyn Adapter] {
            let start = Instant::now();
            info!(adapter = adapter.name(), "loading");
            adapter.load().await?;
            info!(
                adapter = adapter.name(),
                entities = adapter.store().total_count(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "loaded"
            );
        }
        Ok(())
    }

    /// Diffs the loaded source store against the destination store.
    pub fn diff(&self) -> SyncResult<DiffTree> {
        self.differ.diff(self.source.store(), self.dest.store())
    }

    /// Applies `tree` to the destination.
    pub async fn sync(&self, tree: &DiffTree) -> SyncResult<SyncReport> {
        SyncApplier::new(self.dest.store(), self.dest.hooks(), &self.config)
            .apply(tree)
            .await
    }
}
