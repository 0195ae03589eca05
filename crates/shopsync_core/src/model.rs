//! Model kinds and their schemas.
//!
//! Every entity belongs to exactly one [`ModelKind`]. The kind's
//! [`ModelSchema`] fixes which fields form the identity tuple, which
//! attributes may be set (with their types and defaults), which child slots
//! exist and whether the kind takes part in diffing at all.

use crate::error::{CoreError, CoreResult};
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kinds of records that make up a catalog graph.
///
/// The declaration order is the dependency order used when applying a diff:
/// a kind never references a kind declared after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// A sellable product.
    Product,
    /// Membership of a product in a category.
    CategoryToDevice,
    /// An option value (size, colour, ...) offered on a product.
    AttributeValueToProduct,
    /// A product image.
    ProductPhoto,
    /// A category (reference data).
    Category,
    /// A package type (reference data).
    Package,
    /// A brand (reference data).
    Brand,
    /// A supplier (reference data).
    Supplier,
    /// An option attribute such as "Kleur" (reference data).
    Attribute,
    /// One value of an option attribute (reference data).
    AttributeValue,
}

impl ModelKind {
    /// All kinds in dependency order.
    pub const ALL: [ModelKind; 10] = [
        ModelKind::Product,
        ModelKind::CategoryToDevice,
        ModelKind::AttributeValueToProduct,
        ModelKind::ProductPhoto,
        ModelKind::Category,
        ModelKind::Package,
        ModelKind::Brand,
        ModelKind::Supplier,
        ModelKind::Attribute,
        ModelKind::AttributeValue,
    ];

    /// Returns the model name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Product => "product",
            ModelKind::CategoryToDevice => "category_to_device",
            ModelKind::AttributeValueToProduct => "attribute_value_to_product",
            ModelKind::ProductPhoto => "product_photo",
            ModelKind::Category => "category",
            ModelKind::Package => "package",
            ModelKind::Brand => "brand",
            ModelKind::Supplier => "supplier",
            ModelKind::Attribute => "attribute",
            ModelKind::AttributeValue => "attribute_value",
        }
    }

    /// Returns the schema of this kind.
    pub fn schema(&self) -> &'static ModelSchema {
        match self {
            ModelKind::Product => &PRODUCT,
            ModelKind::CategoryToDevice => &CATEGORY_TO_DEVICE,
            ModelKind::AttributeValueToProduct => &ATTRIBUTE_VALUE_TO_PRODUCT,
            ModelKind::ProductPhoto => &PRODUCT_PHOTO,
            ModelKind::Category => &CATEGORY,
            ModelKind::Package => &PACKAGE,
            ModelKind::Brand => &BRAND,
            ModelKind::Supplier => &SUPPLIER,
            ModelKind::Attribute => &ATTRIBUTE,
            ModelKind::AttributeValue => &ATTRIBUTE_VALUE,
        }
    }

    /// Returns true if entities of this kind are compared and synced.
    pub fn is_diffable(&self) -> bool {
        self.schema().diffable
    }

    /// Returns true if some other kind declares a child slot of this kind.
    pub fn is_child_kind(&self) -> bool {
        ModelKind::ALL
            .iter()
            .any(|parent| parent.schema().children.iter().any(|s| s.kind == *self))
    }

    /// Diffable kinds that are not children of another kind, in dependency order.
    pub fn top_level() -> impl Iterator<Item = ModelKind> {
        ModelKind::ALL
            .into_iter()
            .filter(|k| k.is_diffable() && !k.is_child_kind())
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        ModelKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| CoreError::UnknownModel(s.to_string()))
    }
}

/// Declared type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// Text; defaults to the empty string.
    Text,
    /// Floating point; defaults to `0.0`. Integers are widened.
    Float,
    /// Integer; defaults to `0`.
    Integer,
    /// Boolean; defaults to `false`.
    Bool,
}

impl ValueType {
    /// Default value used when an optional attribute is omitted.
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Text => Value::Text(String::new()),
            ValueType::Float => Value::Float(0.0),
            ValueType::Integer => Value::Integer(0),
            ValueType::Bool => Value::Bool(false),
        }
    }

    /// Checks `value` against this type, widening integers to floats.
    ///
    /// `Null` is accepted for every type.
    pub fn coerce(&self, value: Value) -> Option<Value> {
        match (self, value) {
            (_, Value::Null) => Some(Value::Null),
            (ValueType::Text, v @ Value::Text(_)) => Some(v),
            (ValueType::Float, v @ Value::Float(_)) => Some(v),
            (ValueType::Float, Value::Integer(i)) => Some(Value::Float(i as f64)),
            (ValueType::Integer, v @ Value::Integer(_)) => Some(v),
            (ValueType::Bool, v @ Value::Bool(_)) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Text => "text",
            ValueType::Float => "float",
            ValueType::Integer => "integer",
            ValueType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Declaration of one attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeSpec {
    /// Attribute name.
    pub name: &'static str,
    /// Declared type.
    pub value_type: ValueType,
    /// Whether construction fails when the attribute is omitted.
    pub required: bool,
    /// Whether the diff engine compares this attribute.
    ///
    /// Uncompared attributes are still reported on creation.
    pub compared: bool,
}

impl AttributeSpec {
    const fn optional(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            required: false,
            compared: true,
        }
    }

    const fn required(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            required: true,
            compared: true,
        }
    }

    const fn write_only(name: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            value_type,
            required: false,
            compared: false,
        }
    }
}

/// A named one-to-many composition slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSlot {
    /// Slot name.
    pub name: &'static str,
    /// Kind of the entities held in the slot.
    pub kind: ModelKind,
}

/// Static description of a model kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSchema {
    /// The kind described.
    pub kind: ModelKind,
    /// Identifier field names, in identity-tuple order.
    pub identifiers: &'static [&'static str],
    /// Attribute declarations.
    pub attributes: &'static [AttributeSpec],
    /// Child slots.
    pub children: &'static [ChildSlot],
    /// Whether the kind is compared and synced.
    pub diffable: bool,
}

impl ModelSchema {
    /// Looks up an attribute declaration.
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Looks up a child slot by name.
    pub fn child_slot(&self, name: &str) -> Option<&'static ChildSlot> {
        self.children.iter().find(|s| s.name == name)
    }

    /// Returns the slot holding children of `kind`, if any.
    pub fn slot_for(&self, kind: ModelKind) -> Option<&'static ChildSlot> {
        self.children.iter().find(|s| s.kind == kind)
    }

    /// Returns the position of an identifier field.
    pub fn identifier_index(&self, name: &str) -> Option<usize> {
        self.identifiers.iter().position(|i| *i == name)
    }
}

use ValueType::{Float, Text};

static PRODUCT: ModelSchema = ModelSchema {
    kind: ModelKind::Product,
    identifiers: &["productnumber"],
    attributes: &[
        AttributeSpec::required("name", Text),
        AttributeSpec::optional("short_description", Text),
        AttributeSpec::optional("description", Text),
        AttributeSpec::required("package", Text),
        AttributeSpec::optional("price", Float),
        AttributeSpec::optional("brand", Text),
        AttributeSpec::optional("page_title", Text),
        AttributeSpec::optional("meta_description", Text),
        AttributeSpec::optional("meta_keywords", Text),
    ],
    children: &[
        ChildSlot {
            name: "categories",
            kind: ModelKind::CategoryToDevice,
        },
        ChildSlot {
            name: "attributes",
            kind: ModelKind::AttributeValueToProduct,
        },
        ChildSlot {
            name: "photos",
            kind: ModelKind::ProductPhoto,
        },
    ],
    diffable: true,
};

static CATEGORY_TO_DEVICE: ModelSchema = ModelSchema {
    kind: ModelKind::CategoryToDevice,
    identifiers: &["category_name", "productnumber"],
    attributes: &[],
    children: &[],
    diffable: true,
};

static ATTRIBUTE_VALUE_TO_PRODUCT: ModelSchema = ModelSchema {
    kind: ModelKind::AttributeValueToProduct,
    identifiers: &["productnumber", "attribute", "value"],
    attributes: &[AttributeSpec::optional("price", Float)],
    children: &[],
    diffable: true,
};

static PRODUCT_PHOTO: ModelSchema = ModelSchema {
    kind: ModelKind::ProductPhoto,
    identifiers: &["productnumber", "alttext", "file_type"],
    attributes: &[AttributeSpec::write_only("source", Text)],
    children: &[],
    diffable: true,
};

static CATEGORY: ModelSchema = ModelSchema {
    kind: ModelKind::Category,
    identifiers: &["name"],
    attributes: &[],
    children: &[],
    diffable: false,
};

static PACKAGE: ModelSchema = ModelSchema {
    kind: ModelKind::Package,
    identifiers: &["name"],
    attributes: &[],
    children: &[],
    diffable: false,
};

static BRAND: ModelSchema = ModelSchema {
    kind: ModelKind::Brand,
    identifiers: &["name"],
    attributes: &[],
    children: &[],
    diffable: false,
};

static SUPPLIER: ModelSchema = ModelSchema {
    kind: ModelKind::Supplier,
    identifiers: &["name"],
    attributes: &[],
    children: &[],
    diffable: false,
};

static ATTRIBUTE: ModelSchema = ModelSchema {
    kind: ModelKind::Attribute,
    identifiers: &["name"],
    attributes: &[],
    children: &[ChildSlot {
        name: "attribute_values",
        kind: ModelKind::AttributeValue,
    }],
    diffable: false,
};

static ATTRIBUTE_VALUE: ModelSchema = ModelSchema {
    kind: ModelKind::AttributeValue,
    identifiers: &["attribute", "value"],
    attributes: &[],
    children: &[],
    diffable: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(kind.schema().kind, kind);
        }
        assert!("widget".parse::<ModelKind>().is_err());
    }

    #[test]
    fn serde_uses_model_names() {
        let json = serde_json::to_string(&ModelKind::AttributeValueToProduct).unwrap();
        assert_eq!(json, "\"attribute_value_to_product\"");
    }

    #[test]
    fn only_product_is_top_level() {
        let top: Vec<_> = ModelKind::top_level().collect();
        assert_eq!(top, vec![ModelKind::Product]);
        assert!(ModelKind::ProductPhoto.is_child_kind());
        assert!(!ModelKind::Category.is_diffable());
    }

    #[test]
    fn slot_lookup() {
        let schema = ModelKind::Product.schema();
        assert_eq!(
            schema.slot_for(ModelKind::ProductPhoto).map(|s| s.name),
            Some("photos")
        );
        assert_eq!(
            schema.child_slot("attributes").map(|s| s.kind),
            Some(ModelKind::AttributeValueToProduct)
        );
        assert!(schema.child_slot("variants").is_none());
        assert_eq!(
            ModelKind::AttributeValueToProduct
                .schema()
                .identifier_index("value"),
            Some(2)
        );
    }

    #[test]
    fn float_widens_integers() {
        assert_eq!(Float.coerce(Value::Integer(3)), Some(Value::Float(3.0)));
        assert_eq!(Text.coerce(Value::Integer(3)), None);
        assert_eq!(Text.coerce(Value::Null), Some(Value::Null));
        assert!(!PRODUCT_PHOTO.attributes[0].compared);
    }
}
