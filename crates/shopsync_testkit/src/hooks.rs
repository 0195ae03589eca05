//! Recording hooks.
//!
//! [`CallLog`] records every hook call of a sync run as a line such as
//! `"create product P1"`. Keys listed with [`CallLog::failing_on`] make the
//! hook fail; [`CallLog::resolving_references`] makes option creates check
//! that the referenced attribute value exists in the destination store, the
//! way a real destination resolves remote ids.

use async_trait::async_trait;
use parking_lot::Mutex;
use shopsync_core::{fields, Attributes, Entity, EntityStore, Identity, ModelKind};
use shopsync_engine::{Creatable, Deletable, HookSet, SyncError, SyncResult, Updatable};
use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Kinds a destination writes to.
pub const WRITABLE_KINDS: [ModelKind; 4] = [
    ModelKind::Product,
    ModelKind::CategoryToDevice,
    ModelKind::AttributeValueToProduct,
    ModelKind::ProductPhoto,
];

/// Shared record of hook calls.
#[derive(Debug, Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
    failing: HashSet<String>,
    resolve_references: bool,
    next_id: AtomicI64,
}

impl CallLog {
    /// Creates a log whose hooks accept everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every hook call for these keys fail.
    pub fn failing_on<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Makes option creates fail when their attribute value is unknown.
    pub fn resolving_references(mut self) -> Self {
        self.resolve_references = true;
        self
    }

    /// Wraps the log for sharing with hooks.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns a hook set recording into this log for every writable kind.
    pub fn hook_set(self: &Arc<Self>) -> HookSet {
        WRITABLE_KINDS
            .into_iter()
            .fold(HookSet::new(), |set, kind| {
                set.with_hooks(
                    kind,
                    RecordingHooks {
                        kind,
                        log: Arc::clone(self),
                    },
                )
            })
    }

    /// Returns the recorded calls in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// Returns the recorded calls starting with `action`.
    pub fn calls_of(&self, action: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.split(' ').next() == Some(action))
            .cloned()
            .collect()
    }

    fn record(&self, action: &str, kind: ModelKind, key: &str) {
        self.calls.lock().push(format!("{action} {kind} {key}"));
    }

    fn fails(&self, key: &str) -> bool {
        self.failing.contains(key)
    }
}

/// Hooks of one model kind writing into a [`CallLog`].
#[derive(Debug, Clone)]
pub struct RecordingHooks {
    kind: ModelKind,
    log: Arc<CallLog>,
}

impl RecordingHooks {
    fn check_option(&self, store: &EntityStore, identity: &Identity) -> SyncResult<()> {
        let key = identity.key();
        let (Some(number), Some(attribute), Some(value)) =
            (identity.part(0), identity.part(1), identity.part(2))
        else {
            return Err(SyncError::not_created(self.kind, key, "malformed identity"));
        };
        if !store.contains(ModelKind::Product, &Identity::from(number)) {
            return Err(SyncError::not_created(
                self.kind,
                key,
                format!("product {number} not found"),
            ));
        }
        if !store.contains(ModelKind::AttributeValue, &Identity::from([attribute, value])) {
            return Err(SyncError::not_created(
                self.kind,
                key,
                format!("attribute value {attribute}/{value} not found"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Creatable for RecordingHooks {
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        _attributes: &Attributes,
    ) -> SyncResult<Attributes> {
        let key = identity.key();
        self.log.record("create", self.kind, &key);
        if self.log.fails(&key) {
            return Err(SyncError::not_created(self.kind, key, "rejected"));
        }
        if self.log.resolve_references && self.kind == ModelKind::AttributeValueToProduct {
            self.check_option(store, identity)?;
        }
        let id = self.log.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(fields! { "id" => id })
    }
}

#[async_trait]
impl Updatable for RecordingHooks {
    async fn update(
        &self,
        _store: &EntityStore,
        entity: &Entity,
        changes: &Attributes,
    ) -> SyncResult<()> {
        let key = entity.key();
        let names: Vec<&str> = changes.keys().map(String::as_str).collect();
        self.log
            .record("update", self.kind, &format!("{key} {}", names.join(",")));
        if self.log.fails(&key) {
            return Err(SyncError::not_updated(self.kind, key, "rejected"));
        }
        Ok(())
    }
}

#[async_trait]
impl Deletable for RecordingHooks {
    async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
        let key = entity.key();
        self.log.record("delete", self.kind, &key);
        if self.log.fails(&key) {
            return Err(SyncError::not_deleted(self.kind, key, "rejected"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_core::Value;

    #[tokio::test]
    async fn records_and_fails_on_request() {
        let log = CallLog::new().failing_on(["P2"]).shared();
        let hooks = RecordingHooks {
            kind: ModelKind::Product,
            log: Arc::clone(&log),
        };
        let store = EntityStore::new("dest");

        let extras = hooks
            .create(&store, &Identity::from("P1"), &Attributes::new())
            .await
            .unwrap();
        assert_eq!(extras.get("id"), Some(&Value::Integer(1)));

        let err = hooks
            .create(&store, &Identity::from("P2"), &Attributes::new())
            .await
            .unwrap_err();
        assert!(err.is_skippable());
        assert_eq!(log.calls(), vec!["create product P1", "create product P2"]);
        assert_eq!(log.calls_of("create").len(), 2);
        assert!(log.calls_of("delete").is_empty());
    }

    #[tokio::test]
    async fn option_create_resolves_references() {
        let log = CallLog::new().resolving_references().shared();
        let hooks = RecordingHooks {
            kind: ModelKind::AttributeValueToProduct,
            log,
        };
        let store = EntityStore::new("dest");
        let identity = Identity::from(["P1", "Maat", "XL"]);

        let err = hooks
            .create(&store, &identity, &Attributes::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("product P1 not found"));
    }
}
