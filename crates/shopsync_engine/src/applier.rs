//! Applying a diff to the destination.
//!
//! The [`SyncApplier`] walks a [`DiffTree`] depth-first, kinds in dependency
//! order, and dispatches every element to the hook registered for its kind:
//! [`Creatable`] for additions, [`Updatable`] for changes, [`Deletable`] for
//! removals. The walk is sequential; a child's hook may resolve its parent's
//! destination-assigned id from the store.
//!
//! ## Key Invariants
//!
//! - Parents are created before their children
//! - Children are deleted before their parents
//! - Descendants of a failed create are never attempted
//! - The destination store mirrors every successful hook call

use crate::config::{FailurePolicy, SyncConfig};
use crate::diff::{DiffAction, DiffElement, DiffTree};
use crate::error::{SyncError, SyncResult};
use crate::report::{SyncFailure, SyncReport};
use async_trait::async_trait;
use futures::future::BoxFuture;
use shopsync_core::{Attributes, CoreResult, Entity, EntityStore, Identity, ModelKind};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Creates an entity at the destination.
#[async_trait]
pub trait Creatable: Send + Sync {
    /// Performs the remote create.
    ///
    /// Dependencies are resolved through `store`, the destination store. A
    /// dependency that cannot be resolved must fail with
    /// [`SyncError::ObjectNotCreated`] before anything is sent. Returns
    /// destination-assigned fields (such as the remote id) to record on the
    /// new entity.
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        attributes: &Attributes,
    ) -> SyncResult<Attributes>;
}

/// Updates an entity at the destination.
#[async_trait]
pub trait Updatable: Send + Sync {
    /// Sends the changed attributes for `entity`.
    async fn update(
        &self,
        store: &EntityStore,
        entity: &Entity,
        changes: &Attributes,
    ) -> SyncResult<()>;
}

/// Deletes an entity at the destination.
#[async_trait]
pub trait Deletable: Send + Sync {
    /// Performs the remote delete. Must succeed if the remote object is
    /// already gone.
    async fn delete(&self, store: &EntityStore, entity: &Entity) -> SyncResult<()>;
}

/// Hooks of a destination, registered per model kind.
#[derive(Clone, Default)]
pub struct HookSet {
    create: HashMap<ModelKind, Arc<dyn Creatable>>,
    update: HashMap<ModelKind, Arc<dyn Updatable>>,
    delete: HashMap<ModelKind, Arc<dyn Deletable>>,
}

impl HookSet {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a create hook.
    pub fn with_create(mut self, kind: ModelKind, hook: impl Creatable + 'static) -> Self {
        self.create.insert(kind, Arc::new(hook));
        self
    }

    /// Registers an update hook.
    pub fn with_update(mut self, kind: ModelKind, hook: impl Updatable + 'static) -> Self {
        self.update.insert(kind, Arc::new(hook));
        self
    }

    /// Registers a delete hook.
    pub fn with_delete(mut self, kind: ModelKind, hook: impl Deletable + 'static) -> Self {
        self.delete.insert(kind, Arc::new(hook));
        self
    }

    /// Registers one value for all three actions.
    pub fn with_hooks<H>(mut self, kind: ModelKind, hook: H) -> Self
    where
        H: Creatable + Updatable + Deletable + 'static,
    {
        let hook = Arc::new(hook);
        self.create.insert(kind, hook.clone());
        self.update.insert(kind, hook.clone());
        self.delete.insert(kind, hook);
        self
    }

    fn creatable(&self, kind: ModelKind) -> SyncResult<&Arc<dyn Creatable>> {
        self.create.get(&kind).ok_or(SyncError::HookMissing {
            kind,
            action: "create",
        })
    }

    fn updatable(&self, kind: ModelKind) -> SyncResult<&Arc<dyn Updatable>> {
        self.update.get(&kind).ok_or(SyncError::HookMissing {
            kind,
            action: "update",
        })
    }

    fn deletable(&self, kind: ModelKind) -> SyncResult<&Arc<dyn Deletable>> {
        self.delete.get(&kind).ok_or(SyncError::HookMissing {
            kind,
            action: "delete",
        })
    }
}

#[derive(Clone, Copy)]
struct Parent<'a> {
    kind: ModelKind,
    identity: &'a Identity,
    slot: &'static str,
}

/// Applies diffs to a destination store through its hooks.
pub struct SyncApplier<'a> {
    store: &'a EntityStore,
    hooks: &'a HookSet,
    config: &'a SyncConfig,
}

impl<'a> SyncApplier<'a> {
    /// Creates an applier for the destination `store`.
    pub fn new(store: &'a EntityStore, hooks: &'a HookSet, config: &'a SyncConfig) -> Self {
        Self {
            store,
            hooks,
            config,
        }
    }

    /// Applies `tree` and reports what happened.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::FailFast`] the first hook error aborts the walk
    /// and is returned unchanged. Under [`FailurePolicy::ContinueOnFailure`]
    /// per-entity errors are collected in the report instead.
    pub async fn apply(&self, tree: &DiffTree) -> SyncResult<SyncReport> {
        let mut report = SyncReport::default();
        self.apply_tree(tree, None, &mut report).await?;
        info!(report = %report, "sync applied");
        Ok(report)
    }

    fn apply_tree<'b>(
        &'b self,
        tree: &'b DiffTree,
        parent: Option<Parent<'b>>,
        report: &'b mut SyncReport,
    ) -> BoxFuture<'b, SyncResult<()>> {
        Box::pin(async move {
            for (_, elements) in tree.iter() {
                for element in elements {
                    self.apply_element(element, parent, report).await?;
                }
            }
            Ok(())
        })
    }

    async fn apply_children(
        &self,
        element: &DiffElement,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        for (slot, child) in element.slots() {
            let parent = Parent {
                kind: element.kind,
                identity: &element.identity,
                slot,
            };
            self.apply_tree(child, Some(parent), report).await?;
        }
        Ok(())
    }

    async fn apply_element(
        &self,
        element: &DiffElement,
        parent: Option<Parent<'_>>,
        report: &mut SyncReport,
    ) -> SyncResult<()> {
        match element.action() {
            DiffAction::Create => {
                let attributes = element.source.clone().unwrap_or_default();
                match self.create(element, &attributes, parent).await {
                    Ok(()) => {
                        report.created += 1;
                        self.apply_children(element, report).await
                    }
                    Err(e) => {
                        let skipped: usize =
                            element.children.values().map(|c| c.summary().total()).sum();
                        self.fail(element, e, report)?;
                        if skipped > 0 {
                            warn!(
                                kind = %element.kind,
                                key = %element.identity,
                                skipped,
                                "skipping dependents of failed create"
                            );
                            report.skipped += skipped;
                        }
                        Ok(())
                    }
                }
            }
            DiffAction::Update => {
                let changes = element.source.clone().unwrap_or_default();
                match self.update(element, changes).await {
                    Ok(()) => report.updated += 1,
                    Err(e) => self.fail(element, e, report)?,
                }
                self.apply_children(element, report).await
            }
            DiffAction::Delete => {
                self.apply_children(element, report).await?;
                match self.delete(element).await {
                    Ok(()) => report.deleted += 1,
                    Err(e) => self.fail(element, e, report)?,
                }
                Ok(())
            }
            DiffAction::None => {
                report.unchanged += 1;
                self.apply_children(element, report).await
            }
        }
    }

    async fn create(
        &self,
        element: &DiffElement,
        attributes: &Attributes,
        parent: Option<Parent<'_>>,
    ) -> SyncResult<()> {
        let hook = self.hooks.creatable(element.kind)?;
        debug!(kind = %element.kind, key = %element.identity, "create");
        let extras = hook.create(self.store, &element.identity, attributes).await?;

        // The remote object exists now; a local failure does not undo that.
        if let Err(e) = self.record_created(element, attributes, extras, parent) {
            error!(
                kind = %element.kind,
                key = %element.identity,
                error = %e,
                "created at destination but not recorded locally"
            );
        }
        Ok(())
    }

    fn record_created(
        &self,
        element: &DiffElement,
        attributes: &Attributes,
        extras: Attributes,
        parent: Option<Parent<'_>>,
    ) -> CoreResult<()> {
        let (_, created) =
            self.store
                .get_or_instantiate(element.kind, element.identity.clone(), attributes.clone())?;
        if !created {
            self.store
                .update_attributes(element.kind, &element.identity, attributes.clone())?;
        }
        self.store.merge_extras(element.kind, &element.identity, extras)?;
        if let Some(parent) = parent {
            self.store.attach_child(
                parent.kind,
                parent.identity,
                parent.slot,
                element.kind,
                &element.identity,
            )?;
        }
        Ok(())
    }

    fn local(&self, element: &DiffElement) -> SyncResult<Entity> {
        self.store
            .get(element.kind, &element.identity)
            .map_err(|e| SyncError::not_found(element.kind, element.key(), e))
    }

    async fn update(&self, element: &DiffElement, changes: Attributes) -> SyncResult<()> {
        let hook = self.hooks.updatable(element.kind)?;
        let entity = self.local(element)?;
        debug!(kind = %element.kind, key = %element.identity, changed = changes.len(), "update");
        hook.update(self.store, &entity, &changes).await?;
        self.store
            .update_attributes(element.kind, &element.identity, changes)?;
        Ok(())
    }

    async fn delete(&self, element: &DiffElement) -> SyncResult<()> {
        let hook = self.hooks.deletable(element.kind)?;
        let entity = self.local(element)?;
        debug!(kind = %element.kind, key = %element.identity, "delete");
        hook.delete(self.store, &entity).await?;
        self.store.remove(element.kind, &element.identity)?;
        Ok(())
    }

    fn fail(&self, element: &DiffElement, err: SyncError, report: &mut SyncReport) -> SyncResult<()> {
        let action = element.action();
        match self.config.failure_policy {
            FailurePolicy::FailFast => {
                error!(kind = %element.kind, key = %element.identity, %action, error = %err, "sync aborted");
                Err(err)
            }
            FailurePolicy::ContinueOnFailure => {
                warn!(kind = %element.kind, key = %element.identity, %action, error = %err, "sync failed, continuing");
                report.failures.push(SyncFailure {
                    kind: element.kind,
                    key: element.key(),
                    action,
                    message: err.to_string(),
                    skippable: err.is_skippable(),
                });
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::DiffEngine;
    use parking_lot::Mutex;
    use shopsync_core::{fields, AttributeAssignment, CategoryAssignment, Product, Value};
    use std::collections::HashSet;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        failing: HashSet<String>,
        next_id: Mutex<i64>,
    }

    impl Recorder {
        fn failing(keys: &[&str]) -> Self {
            Self {
                failing: keys.iter().map(|k| k.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Creatable for Arc<Recorder> {
        async fn create(
            &self,
            _store: &EntityStore,
            identity: &Identity,
            _attributes: &Attributes,
        ) -> SyncResult<Attributes> {
            self.calls.lock().push(format!("create {identity}"));
            if self.failing.contains(&identity.key()) {
                return Err(SyncError::not_created(
                    ModelKind::Product,
                    identity.key(),
                    "rejected",
                ));
            }
            let mut next = self.next_id.lock();
            *next += 1;
            Ok(fields! { "id" => *next })
        }
    }

    #[async_trait]
    impl Updatable for Arc<Recorder> {
        async fn update(
            &self,
            _store: &EntityStore,
            entity: &Entity,
            changes: &Attributes,
        ) -> SyncResult<()> {
            let names: Vec<&str> = changes.keys().map(String::as_str).collect();
            self.calls
                .lock()
                .push(format!("update {} {}", entity.key(), names.join(",")));
            Ok(())
        }
    }

    #[async_trait]
    impl Deletable for Arc<Recorder> {
        async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
            self.calls.lock().push(format!("delete {}", entity.key()));
            Ok(())
        }
    }

    fn hooks(recorder: &Arc<Recorder>) -> HookSet {
        [
            ModelKind::Product,
            ModelKind::CategoryToDevice,
            ModelKind::AttributeValueToProduct,
        ]
        .into_iter()
        .fold(HookSet::new(), |set, kind| set.with_hooks(kind, recorder.clone()))
    }

    fn add_product(store: &EntityStore, number: &str, price: f64) {
        let (p, _) = store
            .get_or_instantiate_record(&Product::new(number, "Jacket", "Doos").with_price(price))
            .unwrap();
        let (c, _) = store
            .get_or_instantiate_record(&CategoryAssignment::new("Jassen", number))
            .unwrap();
        store.attach(&p, &c).unwrap();
        let (a, _) = store
            .get_or_instantiate_record(&AttributeAssignment::new(number, "Maat", "XL", 0.0))
            .unwrap();
        store.attach(&p, &a).unwrap();
    }

    async fn run(
        source: &EntityStore,
        dest: &EntityStore,
        recorder: &Arc<Recorder>,
        config: SyncConfig,
    ) -> SyncResult<SyncReport> {
        let tree = DiffEngine::new().diff(source, dest).unwrap();
        let hooks = hooks(recorder);
        SyncApplier::new(dest, &hooks, &config).apply(&tree).await
    }

    #[tokio::test]
    async fn create_then_rediff_is_clean() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 10.0);
        let dest = EntityStore::new("dest");
        let recorder = Arc::new(Recorder::default());

        let report = run(&source, &dest, &recorder, SyncConfig::new()).await.unwrap();
        assert_eq!(report.created, 3);
        assert!(report.is_success());
        assert_eq!(
            recorder.calls(),
            vec!["create P1", "create Jassen__P1", "create P1__Maat__XL"]
        );

        let p1 = dest.get(ModelKind::Product, &Identity::from("P1")).unwrap();
        assert_eq!(p1.extra("id"), Some(&Value::Integer(1)));
        assert_eq!(p1.children("categories").len(), 1);

        let again = DiffEngine::new().diff(&source, &dest).unwrap();
        assert!(!again.has_changes());
    }

    #[tokio::test]
    async fn delete_cascades_children_first() {
        let dest = EntityStore::new("dest");
        add_product(&dest, "P2", 10.0);
        let recorder = Arc::new(Recorder::default());

        let report = run(&EntityStore::new("source"), &dest, &recorder, SyncConfig::new())
            .await
            .unwrap();
        assert_eq!(report.deleted, 3);
        assert_eq!(
            recorder.calls(),
            vec!["delete Jassen__P2", "delete P2__Maat__XL", "delete P2"]
        );
        assert_eq!(dest.count(ModelKind::Product), 0);
        assert_eq!(dest.total_count(), 0);
    }

    #[tokio::test]
    async fn update_sends_changes_only() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 12.5);
        let dest = EntityStore::new("dest");
        add_product(&dest, "P1", 10.0);
        let recorder = Arc::new(Recorder::default());

        let report = run(&source, &dest, &recorder, SyncConfig::new()).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.unchanged, 2);
        assert_eq!(recorder.calls(), vec!["update P1 price"]);
        let p1 = dest.get(ModelKind::Product, &Identity::from("P1")).unwrap();
        assert_eq!(p1.attribute("price"), Some(&Value::Float(12.5)));
    }

    #[tokio::test]
    async fn fail_fast_aborts() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 1.0);
        add_product(&source, "P2", 1.0);
        let recorder = Arc::new(Recorder::failing(&["P1"]));

        let err = run(&source, &EntityStore::new("dest"), &recorder, SyncConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ObjectNotCreated { .. }));
        assert_eq!(recorder.calls(), vec!["create P1"]);
    }

    #[tokio::test]
    async fn continue_on_failure_skips_dependents_only() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 1.0);
        add_product(&source, "P2", 1.0);
        let dest = EntityStore::new("dest");
        let recorder = Arc::new(Recorder::failing(&["P1", "P2__Maat__XL"]));

        let report = run(&source, &dest, &recorder, SyncConfig::new().continue_on_failure())
            .await
            .unwrap();
        assert_eq!(report.created, 2);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.failed(), 2);
        assert!(report.failures.iter().all(|f| f.skippable));
        assert_eq!(report.failures[0].key, "P1");
        assert!(!recorder.calls().contains(&"create Jassen__P1".to_string()));
        assert!(dest.contains(ModelKind::CategoryToDevice, &Identity::from(["Jassen", "P2"])));
        assert!(!dest.contains(ModelKind::AttributeValueToProduct, &Identity::from(["P2", "Maat", "XL"])));
    }

    #[tokio::test]
    async fn vanished_entity_is_not_found() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 12.5);
        let dest = EntityStore::new("dest");
        add_product(&dest, "P1", 10.0);
        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        dest.remove(ModelKind::Product, &Identity::from("P1")).unwrap();

        let recorder = Arc::new(Recorder::default());
        let hooks = hooks(&recorder);
        let config = SyncConfig::new().continue_on_failure();
        let report = SyncApplier::new(&dest, &hooks, &config)
            .apply(&tree)
            .await
            .unwrap();
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failures[0].key, "P1");
        assert!(report.failures[0].skippable);
        assert!(recorder.calls().is_empty());

        let config = SyncConfig::new();
        let err = SyncApplier::new(&dest, &hooks, &config)
            .apply(&tree)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::ObjectNotFound {
                kind: ModelKind::Product,
                ..
            }
        ));
    }

    /// Option hook that removes the product while the create is in flight.
    struct RemovesParent;

    #[async_trait]
    impl Creatable for RemovesParent {
        async fn create(
            &self,
            store: &EntityStore,
            identity: &Identity,
            _attributes: &Attributes,
        ) -> SyncResult<Attributes> {
            let number = identity.part(0).unwrap_or_default();
            store.remove(ModelKind::Product, &Identity::from(number))?;
            Ok(fields! { "id" => 99 })
        }
    }

    #[tokio::test]
    async fn local_bookkeeping_failure_keeps_the_create() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 1.0);
        let dest = EntityStore::new("dest");
        let recorder = Arc::new(Recorder::default());
        let hooks = hooks(&recorder).with_create(ModelKind::AttributeValueToProduct, RemovesParent);
        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        let config = SyncConfig::new();

        let report = SyncApplier::new(&dest, &hooks, &config)
            .apply(&tree)
            .await
            .unwrap();
        assert_eq!(report.created, 3);
        assert!(report.is_success());
        let option = dest
            .get(ModelKind::AttributeValueToProduct, &Identity::from(["P1", "Maat", "XL"]))
            .unwrap();
        assert_eq!(option.extra("id"), Some(&Value::Integer(99)));
    }

    #[tokio::test]
    async fn missing_hook_is_reported() {
        let source = EntityStore::new("source");
        add_product(&source, "P1", 1.0);
        let dest = EntityStore::new("dest");
        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        let config = SyncConfig::new();
        let hooks = HookSet::new();
        let err = SyncApplier::new(&dest, &hooks, &config)
            .apply(&tree)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::HookMissing {
                kind: ModelKind::Product,
                action: "create"
            }
        ));
    }
}
