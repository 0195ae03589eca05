//! Typed per-kind records.
//!
//! Adapters build these plain structs and register them in an
//! [`EntityStore`](crate::EntityStore); the conversion into an [`Entity`]
//! runs the schema validation.

use crate::entity::Entity;
use crate::error::CoreResult;
use crate::fields;
use crate::identity::Identity;
use crate::model::ModelKind;
use crate::value::Attributes;

/// A typed record of one model kind.
pub trait Record {
    /// The model kind this record builds.
    const KIND: ModelKind;

    /// Returns the identity tuple.
    fn identity(&self) -> Identity;

    /// Returns the attribute values.
    fn attributes(&self) -> Attributes {
        Attributes::new()
    }

    /// Converts into a validated entity.
    fn to_entity(&self) -> CoreResult<Entity> {
        Entity::new(Self::KIND, self.identity(), self.attributes())
    }
}

/// A sellable product.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Product {
    /// Article number; the identity.
    pub productnumber: String,
    /// Display name.
    pub name: String,
    /// Short description.
    pub short_description: String,
    /// Long description (HTML allowed).
    pub description: String,
    /// Package type name.
    pub package: String,
    /// Base price.
    pub price: f64,
    /// Brand name.
    pub brand: String,
    /// SEO page title.
    pub page_title: String,
    /// SEO description.
    pub meta_description: String,
    /// SEO keywords.
    pub meta_keywords: String,
}

impl Product {
    /// Creates a product with the required fields set.
    pub fn new(
        productnumber: impl Into<String>,
        name: impl Into<String>,
        package: impl Into<String>,
    ) -> Self {
        Self {
            productnumber: productnumber.into(),
            name: name.into(),
            package: package.into(),
            ..Self::default()
        }
    }

    /// Sets the price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    /// Sets the brand.
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = brand.into();
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Record for Product {
    const KIND: ModelKind = ModelKind::Product;

    fn identity(&self) -> Identity {
        Identity::from(self.productnumber.as_str())
    }

    fn attributes(&self) -> Attributes {
        fields! {
            "name" => &self.name,
            "short_description" => &self.short_description,
            "description" => &self.description,
            "package" => &self.package,
            "price" => self.price,
            "brand" => &self.brand,
            "page_title" => &self.page_title,
            "meta_description" => &self.meta_description,
            "meta_keywords" => &self.meta_keywords,
        }
    }
}

/// Membership of a product in a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAssignment {
    /// Category name.
    pub category_name: String,
    /// Product number.
    pub productnumber: String,
}

impl CategoryAssignment {
    /// Creates an assignment.
    pub fn new(category_name: impl Into<String>, productnumber: impl Into<String>) -> Self {
        Self {
            category_name: category_name.into(),
            productnumber: productnumber.into(),
        }
    }
}

impl Record for CategoryAssignment {
    const KIND: ModelKind = ModelKind::CategoryToDevice;

    fn identity(&self) -> Identity {
        Identity::new([self.category_name.as_str(), self.productnumber.as_str()])
    }
}

/// An option value offered on a product, with its price differential.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeAssignment {
    /// Product number.
    pub productnumber: String,
    /// Attribute name, e.g. "Maat".
    pub attribute: String,
    /// Option value, e.g. "XL".
    pub value: String,
    /// Price added to the product price when this option is chosen.
    pub price: f64,
}

impl AttributeAssignment {
    /// Creates an assignment.
    pub fn new(
        productnumber: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            productnumber: productnumber.into(),
            attribute: attribute.into(),
            value: value.into(),
            price,
        }
    }
}

impl Record for AttributeAssignment {
    const KIND: ModelKind = ModelKind::AttributeValueToProduct;

    fn identity(&self) -> Identity {
        Identity::new([
            self.productnumber.as_str(),
            self.attribute.as_str(),
            self.value.as_str(),
        ])
    }

    fn attributes(&self) -> Attributes {
        fields! { "price" => self.price }
    }
}

/// A product image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPhoto {
    /// Product number.
    pub productnumber: String,
    /// Alternative text; unique per product.
    pub alttext: String,
    /// File extension, e.g. "jpg".
    pub file_type: String,
    /// Base64 image payload. Only sent on create.
    pub source: String,
}

impl ProductPhoto {
    /// Creates a photo record.
    pub fn new(
        productnumber: impl Into<String>,
        alttext: impl Into<String>,
        file_type: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            productnumber: productnumber.into(),
            alttext: alttext.into(),
            file_type: file_type.into(),
            source: source.into(),
        }
    }
}

impl Record for ProductPhoto {
    const KIND: ModelKind = ModelKind::ProductPhoto;

    fn identity(&self) -> Identity {
        Identity::new([
            self.productnumber.as_str(),
            self.alttext.as_str(),
            self.file_type.as_str(),
        ])
    }

    fn attributes(&self) -> Attributes {
        fields! { "source" => &self.source }
    }
}

macro_rules! named_record {
    ($(#[$doc:meta])* $name:ident => $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// Name; the identity.
            pub name: String,
        }

        impl $name {
            /// Creates a record.
            pub fn new(name: impl Into<String>) -> Self {
                Self { name: name.into() }
            }
        }

        impl Record for $name {
            const KIND: ModelKind = $kind;

            fn identity(&self) -> Identity {
                Identity::from(self.name.as_str())
            }
        }
    };
}

named_record!(
    /// A category.
    Category => ModelKind::Category
);
named_record!(
    /// A package type.
    Package => ModelKind::Package
);
named_record!(
    /// A brand.
    Brand => ModelKind::Brand
);
named_record!(
    /// A supplier.
    Supplier => ModelKind::Supplier
);
named_record!(
    /// An option attribute.
    Attribute => ModelKind::Attribute
);

/// One value of an option attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// Attribute name.
    pub attribute: String,
    /// Value.
    pub value: String,
}

impl AttributeValue {
    /// Creates a record.
    pub fn new(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

impl Record for AttributeValue {
    const KIND: ModelKind = ModelKind::AttributeValue;

    fn identity(&self) -> Identity {
        Identity::new([self.attribute.as_str(), self.value.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn product_entity() {
        let e = Product::new("P1", "Jacket", "Doos")
            .with_price(49.95)
            .with_brand("Acme")
            .to_entity()
            .unwrap();
        assert_eq!(e.kind(), ModelKind::Product);
        assert_eq!(e.attribute("price"), Some(&Value::Float(49.95)));
        assert_eq!(e.text("brand"), Some("Acme"));
    }

    #[test]
    fn identities_follow_schema_order() {
        let a = AttributeAssignment::new("P1", "Kleur", "Rood", 0.0);
        assert_eq!(a.identity().key(), "P1__Kleur__Rood");
        let c = CategoryAssignment::new("Jassen", "P1");
        assert_eq!(c.to_entity().unwrap().identifier("category_name"), Some("Jassen"));
        let v = AttributeValue::new("Maat", "XL");
        assert_eq!(v.to_entity().unwrap().identifier("value"), Some("XL"));
        assert_eq!(Brand::new("Acme").identity(), Identity::from("Acme"));
    }
}
