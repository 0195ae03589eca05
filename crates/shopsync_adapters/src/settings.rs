//! Adapter settings.
//!
//! These are the sections of the settings file the adapters read. They
//! deserialize with serde, so the CLI can embed them in its own file layout.

use crate::error::{AdapterError, AdapterResult};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shopsync_engine::normalize;
use std::fmt;
use std::path::PathBuf;

/// Destination shop settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CcvSettings {
    /// Category every synced product lives under. Required.
    pub root_category: String,
    /// Option attribute holding colours.
    pub color_category: String,
    /// Option attribute holding sizes.
    pub sizing_category: String,
    /// Brand assigned to source products.
    pub brand: String,
    /// Categories every product is additionally assigned to.
    #[serde(alias = "aditional_categories")]
    pub additional_categories: Vec<String>,
    /// Shop base URL; the environment may override it.
    pub url: Option<String>,
}

impl CcvSettings {
    /// Checks the fields the adapters cannot work without.
    pub fn validate(&self) -> AdapterResult<()> {
        if self.root_category.trim().is_empty() {
            return Err(AdapterError::Settings(
                "ccv_shop.root_category is required".into(),
            ));
        }
        if let Some(url) = &self.url {
            if !url.starts_with("http") {
                return Err(AdapterError::Settings(format!(
                    "ccv_shop.url must start with http: {url}"
                )));
            }
        }
        Ok(())
    }
}

/// Value translations from source vocabulary to shop vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSettings {
    /// Source colour -> shop colour. The order of the shop colours is the
    /// display order of colour options.
    pub color: ValueMapping,
    /// Source size -> shop size.
    pub size: ValueMapping,
    /// Source category -> shop category.
    pub category: ValueMapping,
}

impl MappingSettings {
    /// Normalized shop colours in display order.
    pub fn color_reference(&self) -> Vec<String> {
        self.color.values().map(normalize).collect()
    }
}

/// Catalog file source settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Path of the JSON catalog file.
    pub path: PathBuf,
    /// Product types that are never synced. Compared case-insensitively.
    pub excluded_product_types: Vec<String>,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("catalog.json"),
            excluded_product_types: Vec::new(),
        }
    }
}

impl CatalogSettings {
    /// Returns true if rows of `product_type` are skipped.
    pub fn is_excluded(&self, product_type: &str) -> bool {
        let product_type = product_type.trim();
        self.excluded_product_types
            .iter()
            .any(|t| t.trim().eq_ignore_ascii_case(product_type))
    }
}

/// A string-to-string map that keeps the order of the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueMapping(Vec<(String, String)>);

impl ValueMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one translation.
    pub fn with(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.insert(from.into(), to.into());
        self
    }

    fn insert(&mut self, from: String, to: String) {
        match self.0.iter_mut().find(|(k, _)| *k == from) {
            Some(entry) => entry.1 = to,
            None => self.0.push((from, to)),
        }
    }

    /// Translates a source value.
    pub fn get(&self, from: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == from)
            .map(|(_, v)| v.as_str())
    }

    /// Translated values in file order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, v)| v.as_str())
    }

    /// Number of translations.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no translations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ValueMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (k, v) in iter {
            mapping.insert(k.into(), v.into());
        }
        mapping
    }
}

impl Serialize for ValueMapping {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ValueMapping {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MappingVisitor;

        impl<'de> Visitor<'de> for MappingVisitor {
            type Value = ValueMapping;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ValueMapping, A::Error> {
                let mut mapping = ValueMapping::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    mapping.insert(k, v);
                }
                Ok(mapping)
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<ValueMapping, E> {
                Ok(ValueMapping::new())
            }
        }

        deserializer.deserialize_map(MappingVisitor)
    }
}
