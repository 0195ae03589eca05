//! Structural diff of two entity stores.
//!
//! The [`DiffEngine`] walks both stores from their top-level kinds down
//! through every diffable child slot and matches entities by identity. The
//! resulting [`DiffTree`] describes how to turn the destination graph into the
//! source graph.

use crate::error::SyncResult;
use crate::ordering::{ChildOrdering, LoadOrder};
use serde::Serialize;
use shopsync_core::{Attributes, CoreError, Entity, EntityStore, Identity, ModelKind, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What applying a diff element does to the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffAction {
    /// Entity exists only in the source.
    Create,
    /// Entity exists on both sides with differing attributes.
    Update,
    /// Entity exists only in the destination.
    Delete,
    /// Entity exists on both sides unchanged.
    None,
}

impl DiffAction {
    /// Returns the marker used in text output.
    pub fn symbol(&self) -> char {
        match self {
            DiffAction::Create => '+',
            DiffAction::Update => '!',
            DiffAction::Delete => '-',
            DiffAction::None => '*',
        }
    }
}

impl fmt::Display for DiffAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiffAction::Create => "create",
            DiffAction::Update => "update",
            DiffAction::Delete => "delete",
            DiffAction::None => "no-change",
        };
        f.write_str(name)
    }
}

/// The change record of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffElement {
    /// Model kind.
    pub kind: ModelKind,
    /// Identity shared by both sides.
    pub identity: Identity,
    /// Source values ("+"): all attributes on create, changed ones on update.
    pub source: Option<Attributes>,
    /// Destination values ("-"): all attributes on delete, changed ones on update.
    pub dest: Option<Attributes>,
    /// Child diffs keyed by slot name. Empty slots are omitted.
    pub children: BTreeMap<&'static str, DiffTree>,
}

impl DiffElement {
    /// Returns the action this element stands for.
    pub fn action(&self) -> DiffAction {
        match (&self.source, &self.dest) {
            (Some(_), Some(_)) => DiffAction::Update,
            (Some(_), None) => DiffAction::Create,
            (None, Some(_)) => DiffAction::Delete,
            (None, None) => DiffAction::None,
        }
    }

    /// Returns the stringified identity.
    pub fn key(&self) -> String {
        self.identity.key()
    }

    /// Returns true if this element or any descendant changes something.
    pub fn has_changes(&self) -> bool {
        self.action() != DiffAction::None || self.children.values().any(DiffTree::has_changes)
    }

    /// Returns the child diff of one slot.
    pub fn slot(&self, name: &str) -> Option<&DiffTree> {
        self.children.get(name)
    }

    /// Iterates over `(slot, child diff)` in schema slot order.
    pub fn slots(&self) -> impl Iterator<Item = (&'static str, &DiffTree)> {
        self.kind
            .schema()
            .children
            .iter()
            .filter_map(|slot| self.children.get(slot.name).map(|tree| (slot.name, tree)))
    }
}

/// Counts of elements per action, over the whole tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    /// Elements to create.
    pub create: usize,
    /// Elements to update.
    pub update: usize,
    /// Elements to delete.
    pub delete: usize,
    /// Elements present and equal on both sides.
    pub no_change: usize,
}

impl DiffSummary {
    /// Total number of elements counted.
    pub fn total(&self) -> usize {
        self.create + self.update + self.delete + self.no_change
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "create: {} | update: {} | delete: {} | no-change: {}",
            self.create, self.update, self.delete, self.no_change
        )
    }
}

/// Diff of one level of the graph: elements grouped by kind.
///
/// Kinds iterate in dependency order; elements within a kind keep the order
/// the engine produced them in (source order, then destination-only).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffTree {
    groups: BTreeMap<ModelKind, Vec<DiffElement>>,
}

impl DiffTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element to its kind's group.
    pub fn push(&mut self, element: DiffElement) {
        self.groups.entry(element.kind).or_default().push(element);
    }

    /// Iterates over `(kind, elements)` in dependency order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelKind, &[DiffElement])> {
        self.groups.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Returns the elements of one kind at this level.
    pub fn elements(&self, kind: ModelKind) -> &[DiffElement] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Looks up an element at this level by stringified identity.
    pub fn get(&self, kind: ModelKind, key: &str) -> Option<&DiffElement> {
        self.elements(kind).iter().find(|e| e.key() == key)
    }

    /// Looks up an element anywhere in the tree.
    pub fn find(&self, kind: ModelKind, key: &str) -> Option<&DiffElement> {
        if let Some(found) = self.get(kind, key) {
            return Some(found);
        }
        self.groups
            .values()
            .flatten()
            .flat_map(|e| e.children.values())
            .find_map(|child| child.find(kind, key))
    }

    /// Returns true if the tree holds no elements at all.
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// Returns true if applying the tree would change anything.
    pub fn has_changes(&self) -> bool {
        self.groups.values().flatten().any(DiffElement::has_changes)
    }

    /// Counts elements by action, recursively.
    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        self.count_into(&mut summary);
        summary
    }

    fn count_into(&self, summary: &mut DiffSummary) {
        for element in self.groups.values().flatten() {
            match element.action() {
                DiffAction::Create => summary.create += 1,
                DiffAction::Update => summary.update += 1,
                DiffAction::Delete => summary.delete += 1,
                DiffAction::None => summary.no_change += 1,
            }
            for child in element.children.values() {
                child.count_into(summary);
            }
        }
    }
}

struct Stores<'a> {
    source: &'a EntityStore,
    dest: &'a EntityStore,
}

/// Computes [`DiffTree`]s between a source and a destination store.
#[derive(Clone)]
pub struct DiffEngine {
    ordering: Arc<dyn ChildOrdering>,
}

impl DiffEngine {
    /// Creates an engine that compares children in load order.
    pub fn new() -> Self {
        Self {
            ordering: Arc::new(LoadOrder),
        }
    }

    /// Sets the comparator used to order children before comparing.
    pub fn with_ordering(mut self, ordering: impl ChildOrdering + 'static) -> Self {
        self.ordering = Arc::new(ordering);
        self
    }

    /// Diffs `source` against `dest`.
    ///
    /// Unchanged entities are kept in the tree so their children can be
    /// visited. Destination-only entities cascade: their whole subtree is
    /// marked for deletion.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::MalformedEntity`] if an identity does not match
    /// its kind's identifier list, and with store errors if a child slot
    /// refers to an unregistered entity.
    pub fn diff(&self, source: &EntityStore, dest: &EntityStore) -> SyncResult<DiffTree> {
        let stores = Stores { source, dest };
        let mut tree = DiffTree::new();
        for kind in ModelKind::top_level() {
            let elements = self.diff_kind(kind, source.get_all(kind), dest.get_all(kind), &stores)?;
            for element in elements {
                tree.push(element);
            }
        }
        debug!(summary = %tree.summary(), "diff computed");
        Ok(tree)
    }

    fn diff_kind(
        &self,
        kind: ModelKind,
        sources: Vec<Entity>,
        dests: Vec<Entity>,
        stores: &Stores<'_>,
    ) -> SyncResult<Vec<DiffElement>> {
        let mut index: HashMap<Identity, Entity> = HashMap::with_capacity(dests.len());
        let mut dest_order = Vec::with_capacity(dests.len());
        for entity in dests {
            check_identity(kind, &entity)?;
            dest_order.push(entity.identity().clone());
            index.insert(entity.identity().clone(), entity);
        }

        let mut out = Vec::with_capacity(sources.len() + index.len());
        for entity in sources {
            check_identity(kind, &entity)?;
            let counterpart = index.remove(entity.identity());
            out.push(self.element(Some(&entity), counterpart.as_ref(), &entity, stores)?);
        }
        for identity in dest_order {
            if let Some(entity) = index.remove(&identity) {
                out.push(self.element(None, Some(&entity), &entity, stores)?);
            }
        }
        Ok(out)
    }

    fn element(
        &self,
        source: Option<&Entity>,
        dest: Option<&Entity>,
        anchor: &Entity,
        stores: &Stores<'_>,
    ) -> SyncResult<DiffElement> {
        let kind = anchor.kind();
        let (plus, minus) = match (source, dest) {
            (Some(s), Some(d)) => {
                let (plus, minus) = compare(s, d);
                if plus.is_empty() {
                    (None, None)
                } else {
                    (Some(plus), Some(minus))
                }
            }
            (Some(s), None) => (Some(s.attributes().clone()), None),
            (None, Some(d)) => (None, Some(d.attributes().clone())),
            (None, None) => (None, None),
        };

        let mut children = BTreeMap::new();
        for slot in kind.schema().children {
            if !slot.kind.is_diffable() {
                continue;
            }
            let src_children = match source {
                Some(s) => self.ordering.order(
                    kind,
                    slot,
                    stores.source.children(kind, s.identity(), slot.name)?,
                ),
                None => Vec::new(),
            };
            let dst_children = match dest {
                Some(d) => self.ordering.order(
                    kind,
                    slot,
                    stores.dest.children(kind, d.identity(), slot.name)?,
                ),
                None => Vec::new(),
            };
            let elements = self.diff_kind(slot.kind, src_children, dst_children, stores)?;
            if !elements.is_empty() {
                let mut tree = DiffTree::new();
                for element in elements {
                    tree.push(element);
                }
                children.insert(slot.name, tree);
            }
        }

        Ok(DiffElement {
            kind,
            identity: anchor.identity().clone(),
            source: plus,
            dest: minus,
            children,
        })
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn check_identity(kind: ModelKind, entity: &Entity) -> SyncResult<()> {
    let expected = kind.schema().identifiers.len();
    if entity.kind() != kind || entity.identity().len() != expected {
        return Err(CoreError::MalformedEntity {
            kind,
            reason: format!(
                "identity {} of a {} entity does not match the {expected} identifiers of {kind}",
                entity.identity(),
                entity.kind()
            ),
        }
        .into());
    }
    Ok(())
}

/// Returns the compared attributes that differ, as (source, destination) maps.
fn compare(source: &Entity, dest: &Entity) -> (Attributes, Attributes) {
    let theirs = dest.compared_attributes();
    let ours = source.compared_attributes();
    let mut plus = Attributes::new();
    let mut minus = Attributes::new();
    for name in ours.keys().chain(theirs.keys()) {
        if plus.contains_key(name) {
            continue;
        }
        let a = ours.get(name).cloned().unwrap_or(Value::Null);
        let b = theirs.get(name).cloned().unwrap_or(Value::Null);
        if a != b {
            plus.insert(name.clone(), a);
            minus.insert(name.clone(), b);
        }
    }
    (plus, minus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ordering::AttributeOrdering;
    use shopsync_core::{fields, AttributeAssignment, CategoryAssignment, Product, ProductPhoto, Record};

    fn product(store: &EntityStore, number: &str, price: f64) -> Entity {
        store
            .get_or_instantiate_record(&Product::new(number, "Jacket", "Doos").with_price(price))
            .unwrap()
            .0
    }

    fn child<R: Record>(store: &EntityStore, parent: &Entity, record: R) {
        let (entity, _) = store.get_or_instantiate_record(&record).unwrap();
        store.attach(parent, &entity).unwrap();
    }

    fn catalog(name: &str) -> EntityStore {
        let store = EntityStore::new(name);
        let p = product(&store, "P1", 49.95);
        child(&store, &p, CategoryAssignment::new("Jassen", "P1"));
        child(&store, &p, AttributeAssignment::new("P1", "Maat", "M", 0.0));
        child(&store, &p, AttributeAssignment::new("P1", "Maat", "XL", 2.5));
        store
    }

    #[test]
    fn identical_stores_have_no_changes() {
        let tree = DiffEngine::new().diff(&catalog("a"), &catalog("b")).unwrap();
        assert!(!tree.has_changes());
        assert!(!tree.is_empty());
        let summary = tree.summary();
        assert_eq!(summary.no_change, 4);
        assert_eq!(summary.create + summary.update + summary.delete, 0);
    }

    #[test]
    fn empty_stores_give_empty_tree() {
        let tree = DiffEngine::new()
            .diff(&EntityStore::new("a"), &EntityStore::new("b"))
            .unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.summary(), DiffSummary::default());
    }

    #[test]
    fn added_product_carries_all_attributes_and_children() {
        let source = catalog("source");
        let tree = DiffEngine::new().diff(&source, &EntityStore::new("dest")).unwrap();

        let p1 = tree.get(ModelKind::Product, "P1").unwrap();
        assert_eq!(p1.action(), DiffAction::Create);
        let plus = p1.source.as_ref().unwrap();
        assert_eq!(plus.get("name"), Some(&Value::from("Jacket")));
        assert_eq!(plus.get("price"), Some(&Value::Float(49.95)));
        assert_eq!(plus.get("brand"), Some(&Value::from("")));

        let options = p1.slot("attributes").unwrap();
        assert_eq!(options.elements(ModelKind::AttributeValueToProduct).len(), 2);
        assert!(options
            .elements(ModelKind::AttributeValueToProduct)
            .iter()
            .all(|e| e.action() == DiffAction::Create));
        assert_eq!(tree.summary().create, 4);
    }

    #[test]
    fn removed_product_cascades() {
        let dest = catalog("dest");
        let tree = DiffEngine::new().diff(&EntityStore::new("source"), &dest).unwrap();
        let p1 = tree.get(ModelKind::Product, "P1").unwrap();
        assert_eq!(p1.action(), DiffAction::Delete);
        assert_eq!(
            tree.find(ModelKind::CategoryToDevice, "Jassen__P1").unwrap().action(),
            DiffAction::Delete
        );
        assert_eq!(tree.summary().delete, 4);
    }

    #[test]
    fn changed_attributes_only() {
        let source = catalog("source");
        let dest = EntityStore::new("dest");
        let p = product(&dest, "P1", 39.95);
        child(&dest, &p, CategoryAssignment::new("Jassen", "P1"));
        child(&dest, &p, AttributeAssignment::new("P1", "Maat", "M", 0.0));
        child(&dest, &p, AttributeAssignment::new("P1", "Maat", "XL", 2.5));

        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        let p1 = tree.get(ModelKind::Product, "P1").unwrap();
        assert_eq!(p1.action(), DiffAction::Update);
        assert_eq!(p1.source.as_ref().unwrap().len(), 1);
        assert_eq!(p1.source.as_ref().unwrap()["price"], Value::Float(49.95));
        assert_eq!(p1.dest.as_ref().unwrap()["price"], Value::Float(39.95));
        assert_eq!(tree.summary().update, 1);
    }

    #[test]
    fn null_and_empty_text_differ() {
        let source = EntityStore::new("source");
        let dest = EntityStore::new("dest");
        let id = Identity::from("P9");
        source
            .get_or_instantiate(
                ModelKind::Product,
                id.clone(),
                fields! { "name" => "Cap", "package" => "Doos", "brand" => Value::Null },
            )
            .unwrap();
        dest.get_or_instantiate(
            ModelKind::Product,
            id,
            fields! { "name" => "Cap", "package" => "Doos", "brand" => "" },
        )
        .unwrap();

        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        let p9 = tree.get(ModelKind::Product, "P9").unwrap();
        assert_eq!(p9.action(), DiffAction::Update);
        assert_eq!(p9.source.as_ref().unwrap()["brand"], Value::Null);
    }

    #[test]
    fn unchanged_parent_with_changed_child() {
        let source = catalog("source");
        let dest = EntityStore::new("dest");
        let p = product(&dest, "P1", 49.95);
        child(&dest, &p, CategoryAssignment::new("Jassen", "P1"));
        child(&dest, &p, AttributeAssignment::new("P1", "Maat", "M", 0.0));
        child(&dest, &p, AttributeAssignment::new("P1", "Maat", "XXL", 2.5));

        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        let p1 = tree.get(ModelKind::Product, "P1").unwrap();
        assert_eq!(p1.action(), DiffAction::None);
        assert!(p1.has_changes());
        let options = p1.slot("attributes").unwrap();
        let keys: Vec<(String, DiffAction)> = options
            .elements(ModelKind::AttributeValueToProduct)
            .iter()
            .map(|e| (e.key(), e.action()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("P1__Maat__M".to_string(), DiffAction::None),
                ("P1__Maat__XL".to_string(), DiffAction::Create),
                ("P1__Maat__XXL".to_string(), DiffAction::Delete),
            ]
        );
    }

    #[test]
    fn write_only_attributes_are_not_compared() {
        let source = EntityStore::new("source");
        let dest = EntityStore::new("dest");
        let p = product(&source, "P1", 1.0);
        child(&source, &p, ProductPhoto::new("P1", "front", "jpg", "https://cdn/a.jpg"));
        let p = product(&dest, "P1", 1.0);
        child(&dest, &p, ProductPhoto::new("P1", "front", "jpg", ""));

        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        assert!(!tree.has_changes());
    }

    #[test]
    fn children_are_ordered_before_comparing() {
        let source = EntityStore::new("source");
        let p = product(&source, "P1", 1.0);
        for size in ["XL", "S", "36-38"] {
            child(&source, &p, AttributeAssignment::new("P1", "Maat", size, 0.0));
        }
        let engine = DiffEngine::new().with_ordering(AttributeOrdering::new().with_sizing("Maat"));
        let tree = engine.diff(&source, &EntityStore::new("dest")).unwrap();
        let keys: Vec<String> = tree
            .get(ModelKind::Product, "P1")
            .unwrap()
            .slot("attributes")
            .unwrap()
            .elements(ModelKind::AttributeValueToProduct)
            .iter()
            .map(DiffElement::key)
            .collect();
        assert_eq!(keys, vec!["P1__Maat__36-38", "P1__Maat__S", "P1__Maat__XL"]);
    }

    #[test]
    fn reference_kinds_are_ignored() {
        let source = catalog("source");
        source
            .get_or_instantiate_record(&shopsync_core::Brand::new("Acme"))
            .unwrap();
        let dest = catalog("dest");
        let tree = DiffEngine::new().diff(&source, &dest).unwrap();
        assert!(!tree.has_changes());
        assert!(tree.elements(ModelKind::Brand).is_empty());
    }
}
