//! Domain comparators for child slots.
//!
//! Option lists such as sizes and colours have a meaningful order on the
//! storefront but arrive in whatever order the upstream feed iterates. The
//! diff engine passes every child list through a [`ChildOrdering`] before
//! comparing, so output is stable regardless of load order.

use shopsync_core::{ChildSlot, Entity, ModelKind};
use std::collections::HashMap;
use tracing::warn;

/// Orders the children of one slot before they are diffed.
pub trait ChildOrdering: Send + Sync {
    /// Returns `children` in diff order. The default keeps load order.
    fn order(&self, parent: ModelKind, slot: &ChildSlot, children: Vec<Entity>) -> Vec<Entity> {
        let _ = (parent, slot);
        children
    }
}

/// Keeps children in load order.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOrder;

impl ChildOrdering for LoadOrder {}

/// Normalizes a value for comparisons: trimmed and lower-cased.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Sortable key for a size label.
///
/// Ordering is by bucket first: plain numbers and numeric ranges (0), waist
/// sizes `W<n>` (1), collar sizes `C<n>` (2), letter sizes from a fixed table
/// (3), length/circumference sizes `<len>C<circ>` (4), anything else (9,
/// sub-ordered by label).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SizeKey {
    bucket: u8,
    numbers: Vec<i64>,
    label: String,
}

const LETTER_SIZES: &[(&str, i64)] = &[
    ("2XS", 90),
    ("XS", 100),
    ("XS/S", 101),
    ("S", 102),
    ("S-M", 103),
    ("M", 104),
    ("M/L", 105),
    ("L", 106),
    ("L-XL", 107),
    ("XL", 108),
    ("XXL", 109),
    ("X/2XL", 110),
    ("2XL", 111),
    ("2XL-3XL", 112),
    ("3XL", 113),
    ("3/4XL", 114),
    ("3XL-4XL", 115),
    ("4XL", 116),
    ("4XL-5XL", 117),
    ("5XL", 118),
    ("6XL", 119),
    ("7XL", 120),
    ("8XL", 121),
    ("ONE", 200),
    ("ONESIZE", 200),
];

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

impl SizeKey {
    /// Parses a size label.
    pub fn parse(size: &str) -> Self {
        let size = size.trim().to_uppercase();
        let key = |bucket: u8, numbers: Vec<i64>| SizeKey {
            bucket,
            numbers,
            label: String::new(),
        };

        if is_digits(&size) {
            if let Ok(n) = size.parse() {
                return key(0, vec![n]);
            }
        }

        if size.contains('-') || size.contains('/') {
            let sep = if size.contains('-') { '-' } else { '/' };
            let parts: Result<Vec<i64>, _> = size.split(sep).map(str::parse).collect();
            if let Ok(nums) = parts {
                if let Some(first) = nums.first() {
                    return key(0, vec![*first, nums.get(1).copied().unwrap_or(0)]);
                }
            }
        }

        for (prefix, bucket) in [("W", 1), ("C", 2)] {
            if let Some(rest) = size.strip_prefix(prefix) {
                if is_digits(rest) {
                    if let Ok(n) = rest.parse() {
                        return key(bucket, vec![n]);
                    }
                }
            }
        }

        if let Some((length, circumference)) = size.split_once('C') {
            if let (Ok(l), Ok(c)) = (length.parse(), circumference.parse()) {
                return key(4, vec![l, c]);
            }
        }

        if let Some((_, rank)) = LETTER_SIZES.iter().find(|(code, _)| *code == size) {
            return key(3, vec![*rank]);
        }

        SizeKey {
            bucket: 9,
            numbers: vec![999],
            label: size,
        }
    }

    /// Returns true if the label matched one of the known forms.
    pub fn is_recognized(&self) -> bool {
        self.bucket != 9
    }
}

/// Sorts items by size label. Stable for equal keys.
pub fn order_by_size<T>(mut items: Vec<T>, value: impl Fn(&T) -> &str) -> Vec<T> {
    items.sort_by_cached_key(|item| SizeKey::parse(value(item)));
    items
}

/// Orders items by the position of their normalized value in `reference`.
///
/// `reference` is normalized too; duplicates keep their first position.
/// Items not in the reference are appended in their original order and a
/// warning is logged for each.
pub fn order_by_reference<T>(
    items: Vec<T>,
    value: impl Fn(&T) -> &str,
    reference: &[String],
) -> Vec<T> {
    let mut index_of: HashMap<String, usize> = HashMap::new();
    for (i, r) in reference.iter().enumerate() {
        index_of.entry(normalize(r)).or_insert(i);
    }
    let mut known: Vec<(usize, T)> = Vec::new();
    let mut unknown = Vec::new();
    for item in items {
        match index_of.get(&normalize(value(&item))) {
            Some(&pos) => known.push((pos, item)),
            None => {
                warn!(value = value(&item), "value not in reference order, appending");
                unknown.push(item);
            }
        }
    }
    known.sort_by_key(|(pos, _)| *pos);
    known.into_iter().map(|(_, item)| item).chain(unknown).collect()
}

/// Orders option assignments of a product.
///
/// Children of the `attribute_value_to_product` slot are grouped by their
/// `attribute` identifier, groups kept in order of first appearance. The
/// colour attribute's group follows the colour reference list; the sizing
/// attribute's group is sorted by [`SizeKey`]; other groups keep load order.
#[derive(Debug, Clone, Default)]
pub struct AttributeOrdering {
    color_attribute: Option<String>,
    sizing_attribute: Option<String>,
    color_reference: Vec<String>,
}

impl AttributeOrdering {
    /// Creates an ordering with no colour or sizing attribute configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the colour attribute and its reference order.
    pub fn with_colors(
        mut self,
        attribute: impl Into<String>,
        reference: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.color_attribute = Some(attribute.into());
        self.color_reference = reference.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the sizing attribute.
    pub fn with_sizing(mut self, attribute: impl Into<String>) -> Self {
        self.sizing_attribute = Some(attribute.into());
        self
    }
}

fn option_value(entity: &Entity) -> &str {
    entity.identifier("value").unwrap_or_default()
}

impl ChildOrdering for AttributeOrdering {
    fn order(&self, _parent: ModelKind, slot: &ChildSlot, children: Vec<Entity>) -> Vec<Entity> {
        if slot.kind != ModelKind::AttributeValueToProduct {
            return children;
        }

        let mut groups: Vec<(String, Vec<Entity>)> = Vec::new();
        for child in children {
            let attribute = child.identifier("attribute").unwrap_or_default().to_string();
            match groups.iter_mut().find(|(name, _)| *name == attribute) {
                Some((_, members)) => members.push(child),
                None => groups.push((attribute, vec![child])),
            }
        }

        groups
            .into_iter()
            .flat_map(|(name, members)| {
                if self.color_attribute.as_deref() == Some(name.as_str()) {
                    order_by_reference(members, option_value, &self.color_reference)
                } else if self.sizing_attribute.as_deref() == Some(name.as_str()) {
                    order_by_size(members, option_value)
                } else {
                    members
                }
            })
            .collect()
    }
}
