//! Validated entities.

use crate::error::{CoreError, CoreResult};
use crate::identity::Identity;
use crate::model::{ModelKind, ModelSchema};
use crate::value::{Attributes, Value};
use std::collections::BTreeMap;

/// A typed, identity-addressed record.
///
/// Construction validates the identity arity and every attribute against the
/// kind's schema, and fills defaults for omitted optional attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    kind: ModelKind,
    identity: Identity,
    attributes: Attributes,
    /// Destination-assigned fields (remote ids). Never diffed.
    extras: Attributes,
    children: BTreeMap<&'static str, Vec<Identity>>,
}

impl Entity {
    /// Builds an entity from an identity and attribute values.
    pub fn new(kind: ModelKind, identity: Identity, attributes: Attributes) -> CoreResult<Self> {
        let schema = kind.schema();
        if identity.len() != schema.identifiers.len() {
            return Err(CoreError::MalformedEntity {
                kind,
                reason: format!(
                    "expected {} identifiers ({}), got {}",
                    schema.identifiers.len(),
                    schema.identifiers.join(", "),
                    identity.len()
                ),
            });
        }
        let attributes = validate_attributes(schema, attributes, true)?;
        Ok(Self {
            kind,
            identity,
            attributes,
            extras: Attributes::new(),
            children: BTreeMap::new(),
        })
    }

    /// Builds an entity from a flat field map holding identifiers and attributes.
    ///
    /// Identifier values may be text or integers; anything else, or a missing
    /// identifier, is a [`CoreError::MalformedEntity`].
    pub fn from_fields(kind: ModelKind, mut fields: Attributes) -> CoreResult<Self> {
        let schema = kind.schema();
        let mut parts = Vec::with_capacity(schema.identifiers.len());
        for name in schema.identifiers {
            let part = match fields.remove(*name) {
                Some(Value::Text(s)) => s,
                Some(Value::Integer(i)) => i.to_string(),
                Some(other) => {
                    return Err(CoreError::MalformedEntity {
                        kind,
                        reason: format!("identifier {name:?} is {}", other.type_name()),
                    })
                }
                None => {
                    return Err(CoreError::MalformedEntity {
                        kind,
                        reason: format!("missing identifier {name:?}"),
                    })
                }
            };
            parts.push(part);
        }
        Self::new(kind, Identity::new(parts), fields)
    }

    /// Adds a destination-assigned field.
    #[must_use]
    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(name.into(), value.into());
        self
    }

    /// Returns the model kind.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Returns the identity tuple.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Returns the stringified identity.
    pub fn key(&self) -> String {
        self.identity.key()
    }

    /// Returns an identifier value by field name.
    pub fn identifier(&self, name: &str) -> Option<&str> {
        self.kind
            .schema()
            .identifier_index(name)
            .and_then(|i| self.identity.part(i))
    }

    /// Returns identifiers as a field map.
    pub fn identifiers(&self) -> Attributes {
        self.kind
            .schema()
            .identifiers
            .iter()
            .zip(self.identity.parts())
            .map(|(name, part)| (name.to_string(), Value::Text(part.clone())))
            .collect()
    }

    /// Returns all attributes.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Returns one attribute.
    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns a text attribute, or `None` if absent, null or not text.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.attribute(name).and_then(Value::as_text)
    }

    /// Returns the attributes the diff engine compares.
    pub fn compared_attributes(&self) -> Attributes {
        let schema = self.kind.schema();
        self.attributes
            .iter()
            .filter(|(name, _)| schema.attribute(name).is_some_and(|a| a.compared))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns destination-assigned fields.
    pub fn extras(&self) -> &Attributes {
        &self.extras
    }

    /// Returns one destination-assigned field.
    pub fn extra(&self, name: &str) -> Option<&Value> {
        self.extras.get(name)
    }

    /// Returns the children attached in `slot`.
    pub fn children(&self, slot: &str) -> &[Identity] {
        self.children.get(slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn apply_changes(&mut self, changes: Attributes) -> CoreResult<()> {
        let changes = validate_attributes(self.kind.schema(), changes, false)?;
        self.attributes.extend(changes);
        Ok(())
    }

    pub(crate) fn extras_mut(&mut self) -> &mut Attributes {
        &mut self.extras
    }

    pub(crate) fn push_child(&mut self, slot: &'static str, child: Identity) -> bool {
        let list = self.children.entry(slot).or_default();
        if list.contains(&child) {
            false
        } else {
            list.push(child);
            true
        }
    }

    pub(crate) fn drop_child(&mut self, slot: &str, child: &Identity) {
        if let Some(list) = self.children.get_mut(slot) {
            list.retain(|c| c != child);
        }
    }
}

fn validate_attributes(
    schema: &ModelSchema,
    attributes: Attributes,
    fill_defaults: bool,
) -> CoreResult<Attributes> {
    let mut out = Attributes::new();
    for (name, value) in attributes {
        let spec = schema
            .attribute(&name)
            .ok_or_else(|| CoreError::UnknownAttribute {
                kind: schema.kind,
                name: name.clone(),
            })?;
        let found = value.type_name().to_string();
        let value = spec
            .value_type
            .coerce(value)
            .ok_or(CoreError::InvalidValue {
                kind: schema.kind,
                field: name.clone(),
                expected: spec.value_type,
                found,
            })?;
        out.insert(name, value);
    }
    if fill_defaults {
        for spec in schema.attributes {
            if out.contains_key(spec.name) {
                continue;
            }
            if spec.required {
                return Err(CoreError::MissingAttribute {
                    kind: schema.kind,
                    name: spec.name.to_string(),
                });
            }
            out.insert(spec.name.to_string(), spec.value_type.default_value());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields;

    #[test]
    fn defaults_are_filled() {
        let e = Entity::new(
            ModelKind::Product,
            Identity::from("P1"),
            fields! { "name" => "Jacket", "package" => "Doos", "price" => 10 },
        )
        .unwrap();
        assert_eq!(e.attribute("price"), Some(&Value::Float(10.0)));
        assert_eq!(e.text("brand"), Some(""));
        assert_eq!(e.identifier("productnumber"), Some("P1"));
        assert_eq!(e.attributes().len(), 9);
    }

    #[test]
    fn missing_required_attribute() {
        let err = Entity::new(
            ModelKind::Product,
            Identity::from("P1"),
            fields! { "name" => "Jacket" },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MissingAttribute { ref name, .. } if name == "package"));
    }

    #[test]
    fn rejects_unknown_and_mistyped_attributes() {
        let err = Entity::new(
            ModelKind::CategoryToDevice,
            Identity::from(["Jassen", "P1"]),
            fields! { "colour" => "red" },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::UnknownAttribute { .. }));

        let err = Entity::new(
            ModelKind::AttributeValueToProduct,
            Identity::from(["P1", "Maat", "XL"]),
            fields! { "price" => "free" },
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidValue { .. }));
    }

    #[test]
    fn identity_arity_is_checked() {
        let err = Entity::new(
            ModelKind::AttributeValueToProduct,
            Identity::from(["P1", "Maat"]),
            Attributes::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MalformedEntity { .. }));
    }

    #[test]
    fn from_fields_splits_identifiers() {
        let e = Entity::from_fields(
            ModelKind::AttributeValueToProduct,
            fields! { "productnumber" => 1001_i64, "attribute" => "Maat", "value" => "XL", "price" => 2.5 },
        )
        .unwrap();
        assert_eq!(e.key(), "1001__Maat__XL");
        assert_eq!(e.attribute("price"), Some(&Value::Float(2.5)));

        let err = Entity::from_fields(ModelKind::Category, Attributes::new()).unwrap_err();
        assert!(err.to_string().contains("missing identifier"));
    }

    #[test]
    fn write_only_attributes_are_not_compared() {
        let e = Entity::new(
            ModelKind::ProductPhoto,
            Identity::from(["P1", "front", "jpg"]),
            fields! { "source" => "aGVsbG8=" },
        )
        .unwrap()
        .with_extra("id", 7_i64);
        assert!(e.compared_attributes().is_empty());
        assert_eq!(e.extra("id"), Some(&Value::Integer(7)));
    }
}
