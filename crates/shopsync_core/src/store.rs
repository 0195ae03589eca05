//! Entity store.

use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::identity::Identity;
use crate::model::ModelKind;
use crate::records::Record;
use crate::value::{Attributes, Value};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

/// Holds the identity-addressed graph built by one adapter.
///
/// A store is created per load, filled by the adapter, consumed by the diff
/// engine and then dropped. It can be shared by reference across the tasks of
/// a worker pool: every mutation takes the store-wide write lock, so child
/// attachment from concurrent workers is serialized. Lookups return clones.
#[derive(Debug)]
pub struct EntityStore {
    name: String,
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    entities: HashMap<ModelKind, BTreeMap<Identity, Entity>>,
    /// Child (kind, identity) -> (parent kind, parent identity, slot).
    parents: HashMap<(ModelKind, Identity), (ModelKind, Identity, &'static str)>,
}

impl Inner {
    fn entity_mut(&mut self, store: &str, kind: ModelKind, id: &Identity) -> CoreResult<&mut Entity> {
        self.entities
            .get_mut(&kind)
            .and_then(|m| m.get_mut(id))
            .ok_or_else(|| not_found(store, kind, id))
    }
}

fn not_found(store: &str, kind: ModelKind, id: &Identity) -> CoreError {
    CoreError::NotFound {
        store: store.to_string(),
        kind,
        key: id.key(),
    }
}

impl EntityStore {
    /// Creates an empty store.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Returns the store name (usually the adapter name).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entity with this identity, creating it if absent.
    ///
    /// When the entity already exists its attributes are left untouched and
    /// `false` is returned alongside it. Otherwise a new entity is validated,
    /// registered and returned with `true`. The lookup and the registration
    /// happen under one lock acquisition.
    pub fn get_or_instantiate(
        &self,
        kind: ModelKind,
        identity: Identity,
        attributes: Attributes,
    ) -> CoreResult<(Entity, bool)> {
        if let Some(existing) = self.find(kind, &identity) {
            return Ok((existing, false));
        }
        let candidate = Entity::new(kind, identity, attributes)?;
        let mut inner = self.inner.write();
        let map = inner.entities.entry(kind).or_default();
        if let Some(existing) = map.get(candidate.identity()) {
            return Ok((existing.clone(), false));
        }
        map.insert(candidate.identity().clone(), candidate.clone());
        Ok((candidate, true))
    }

    /// Registers a typed record through [`get_or_instantiate`](Self::get_or_instantiate).
    pub fn get_or_instantiate_record<R: Record>(&self, record: &R) -> CoreResult<(Entity, bool)> {
        self.get_or_instantiate(R::KIND, record.identity(), record.attributes())
    }

    /// Registers an entity, failing if its identity is already taken.
    pub fn add(&self, entity: Entity) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let map = inner.entities.entry(entity.kind()).or_default();
        if map.contains_key(entity.identity()) {
            return Err(CoreError::AlreadyExists {
                store: self.name.clone(),
                kind: entity.kind(),
                key: entity.key(),
            });
        }
        map.insert(entity.identity().clone(), entity);
        Ok(())
    }

    /// Returns the entity with this identity.
    pub fn get(&self, kind: ModelKind, identity: &Identity) -> CoreResult<Entity> {
        self.find(kind, identity)
            .ok_or_else(|| not_found(&self.name, kind, identity))
    }

    /// Returns the entity with this identity, if present.
    pub fn find(&self, kind: ModelKind, identity: &Identity) -> Option<Entity> {
        self.inner
            .read()
            .entities
            .get(&kind)
            .and_then(|m| m.get(identity))
            .cloned()
    }

    /// Returns true if an entity with this identity exists.
    pub fn contains(&self, kind: ModelKind, identity: &Identity) -> bool {
        self.inner
            .read()
            .entities
            .get(&kind)
            .is_some_and(|m| m.contains_key(identity))
    }

    /// Returns all entities of a kind, ordered by identity.
    pub fn get_all(&self, kind: ModelKind) -> Vec<Entity> {
        self.inner
            .read()
            .entities
            .get(&kind)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the number of entities of a kind.
    pub fn count(&self, kind: ModelKind) -> usize {
        self.inner.read().entities.get(&kind).map_or(0, BTreeMap::len)
    }

    /// Returns the number of entities across all kinds.
    pub fn total_count(&self) -> usize {
        self.inner.read().entities.values().map(BTreeMap::len).sum()
    }

    /// Attaches a registered child to a parent's named slot.
    ///
    /// Returns `false` if the child is already in that slot. A child can
    /// belong to one parent only; attaching it elsewhere is
    /// [`CoreError::AlreadyAttached`].
    pub fn attach_child(
        &self,
        parent_kind: ModelKind,
        parent: &Identity,
        slot: &str,
        child_kind: ModelKind,
        child: &Identity,
    ) -> CoreResult<bool> {
        let slot = parent_kind
            .schema()
            .child_slot(slot)
            .ok_or_else(|| CoreError::UnknownChildSlot {
                kind: parent_kind,
                slot: slot.to_string(),
            })?;
        if slot.kind != child_kind {
            return Err(CoreError::ChildKindMismatch {
                slot: slot.name.to_string(),
                expected: slot.kind,
                found: child_kind,
            });
        }

        let mut inner = self.inner.write();
        let child_present = inner
            .entities
            .get(&child_kind)
            .is_some_and(|m| m.contains_key(child));
        if !child_present {
            return Err(not_found(&self.name, child_kind, child));
        }
        let link = (child_kind, child.clone());
        if let Some((owner_kind, owner, _)) = inner.parents.get(&link) {
            if *owner_kind == parent_kind && owner == parent {
                return Ok(false);
            }
            return Err(CoreError::AlreadyAttached {
                kind: child_kind,
                key: child.key(),
                parent: owner.key(),
            });
        }
        let added = inner
            .entity_mut(&self.name, parent_kind, parent)?
            .push_child(slot.name, child.clone());
        inner
            .parents
            .insert(link, (parent_kind, parent.clone(), slot.name));
        Ok(added)
    }

    /// Attaches `child` to the slot of `parent` that holds its kind.
    pub fn attach(&self, parent: &Entity, child: &Entity) -> CoreResult<bool> {
        let slot = parent
            .kind()
            .schema()
            .slot_for(child.kind())
            .ok_or_else(|| CoreError::UnknownChildSlot {
                kind: parent.kind(),
                slot: child.kind().to_string(),
            })?;
        self.attach_child(
            parent.kind(),
            parent.identity(),
            slot.name,
            child.kind(),
            child.identity(),
        )
    }

    /// Returns the children of an entity in `slot`, in attachment order.
    pub fn children(&self, kind: ModelKind, identity: &Identity, slot: &str) -> CoreResult<Vec<Entity>> {
        let inner = self.inner.read();
        let parent = inner
            .entities
            .get(&kind)
            .and_then(|m| m.get(identity))
            .ok_or_else(|| not_found(&self.name, kind, identity))?;
        let child_kind = kind
            .schema()
            .child_slot(slot)
            .ok_or_else(|| CoreError::UnknownChildSlot {
                kind,
                slot: slot.to_string(),
            })?
            .kind;
        let map = inner.entities.get(&child_kind);
        parent
            .children(slot)
            .iter()
            .map(|id| {
                map.and_then(|m| m.get(id))
                    .cloned()
                    .ok_or_else(|| not_found(&self.name, child_kind, id))
            })
            .collect()
    }

    /// Returns the parent of an attached child.
    pub fn parent_of(&self, kind: ModelKind, identity: &Identity) -> Option<(ModelKind, Identity)> {
        self.inner
            .read()
            .parents
            .get(&(kind, identity.clone()))
            .map(|(k, id, _)| (*k, id.clone()))
    }

    /// Overwrites attributes of an existing entity and returns the result.
    pub fn update_attributes(
        &self,
        kind: ModelKind,
        identity: &Identity,
        changes: Attributes,
    ) -> CoreResult<Entity> {
        let mut inner = self.inner.write();
        let entity = inner.entity_mut(&self.name, kind, identity)?;
        entity.apply_changes(changes)?;
        Ok(entity.clone())
    }

    /// Sets a destination-assigned field on an existing entity.
    pub fn set_extra(
        &self,
        kind: ModelKind,
        identity: &Identity,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner
            .entity_mut(&self.name, kind, identity)?
            .extras_mut()
            .insert(name.into(), value.into());
        Ok(())
    }

    /// Merges destination-assigned fields into an existing entity.
    pub fn merge_extras(&self, kind: ModelKind, identity: &Identity, extras: Attributes) -> CoreResult<()> {
        let mut inner = self.inner.write();
        inner
            .entity_mut(&self.name, kind, identity)?
            .extras_mut()
            .extend(extras);
        Ok(())
    }

    /// Removes an entity and detaches it from its parent.
    ///
    /// Its own children stay registered but become detached.
    pub fn remove(&self, kind: ModelKind, identity: &Identity) -> CoreResult<Entity> {
        let mut inner = self.inner.write();
        let entity = inner
            .entities
            .get_mut(&kind)
            .and_then(|m| m.remove(identity))
            .ok_or_else(|| not_found(&self.name, kind, identity))?;
        if let Some((parent_kind, parent, slot)) = inner.parents.remove(&(kind, identity.clone())) {
            if let Ok(p) = inner.entity_mut(&self.name, parent_kind, &parent) {
                p.drop_child(slot, identity);
            }
        }
        for slot in kind.schema().children {
            for child in entity.children(slot.name) {
                inner.parents.remove(&(slot.kind, child.clone()));
            }
        }
        Ok(entity)
    }
}
