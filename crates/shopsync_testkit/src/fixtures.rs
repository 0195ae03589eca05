//! Catalog fixtures and client helpers.
//!
//! Provides builders for products with their child records, and a shop
//! client wired to a scripted transport.

use serde_json::{json, Value as Json};
use shopsync_client::{ClientConfig, MockTransport, ShopClient};
use shopsync_core::{
    Attribute, AttributeAssignment, AttributeValue, CategoryAssignment, CoreResult, Entity,
    EntityStore, Product, ProductPhoto,
};

/// Base URL used by [`scripted_client`].
pub const SHOP_URL: &str = "https://shop.example.com";

/// Default package of fixture products.
pub const FIXTURE_PACKAGE: &str = "Doos";

/// A product together with its category assignments, options and photos.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFixture {
    product: Product,
    categories: Vec<String>,
    options: Vec<(String, String, f64)>,
    photos: Vec<(String, String)>,
}

impl ProductFixture {
    /// Creates a product named "Jacket" in the fixture package.
    pub fn new(productnumber: impl Into<String>) -> Self {
        Self {
            product: Product::new(productnumber, "Jacket", FIXTURE_PACKAGE),
            categories: Vec::new(),
            options: Vec::new(),
            photos: Vec::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.product.name = name.into();
        self
    }

    /// Sets the price.
    pub fn with_price(mut self, price: f64) -> Self {
        self.product = self.product.with_price(price);
        self
    }

    /// Adds a category assignment.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.categories.push(category.into());
        self
    }

    /// Adds an option with its price differential.
    pub fn with_option(
        mut self,
        attribute: impl Into<String>,
        value: impl Into<String>,
        price: f64,
    ) -> Self {
        self.options.push((attribute.into(), value.into(), price));
        self
    }

    /// Adds a photo.
    pub fn with_photo(mut self, alttext: impl Into<String>, file_type: impl Into<String>) -> Self {
        self.photos.push((alttext.into(), file_type.into()));
        self
    }

    /// Returns the product number.
    pub fn productnumber(&self) -> &str {
        &self.product.productnumber
    }

    /// Returns the number of entities [`insert`](Self::insert) registers.
    pub fn entity_count(&self) -> usize {
        1 + self.categories.len() + self.options.len() + self.photos.len()
    }

    /// Registers the product and attaches its children.
    pub fn insert(&self, store: &EntityStore) -> CoreResult<Entity> {
        let number = self.productnumber();
        let (product, _) = store.get_or_instantiate_record(&self.product)?;
        for category in &self.categories {
            let (child, _) =
                store.get_or_instantiate_record(&CategoryAssignment::new(category, number))?;
            store.attach(&product, &child)?;
        }
        for (attribute, value, price) in &self.options {
            let (child, _) = store.get_or_instantiate_record(&AttributeAssignment::new(
                number, attribute, value, *price,
            ))?;
            store.attach(&product, &child)?;
        }
        for (alttext, file_type) in &self.photos {
            let (child, _) = store
                .get_or_instantiate_record(&ProductPhoto::new(number, alttext, file_type, ""))?;
            store.attach(&product, &child)?;
        }
        Ok(product)
    }
}

/// Builds a store holding `fixtures`.
pub fn store_with(name: &str, fixtures: &[ProductFixture]) -> CoreResult<EntityStore> {
    let store = EntityStore::new(name);
    for fixture in fixtures {
        fixture.insert(&store)?;
    }
    Ok(store)
}

/// Registers an attribute and its values, the references option
/// assignments resolve against.
pub fn insert_attribute_values(
    store: &EntityStore,
    attribute: &str,
    values: &[&str],
) -> CoreResult<()> {
    let (parent, _) = store.get_or_instantiate_record(&Attribute::new(attribute))?;
    for value in values {
        let (child, _) = store.get_or_instantiate_record(&AttributeValue::new(attribute, *value))?;
        store.attach(&parent, &child)?;
    }
    Ok(())
}

/// A client for [`SHOP_URL`] whose replies are scripted on its transport.
pub fn scripted_client() -> ShopClient<MockTransport> {
    ShopClient::with_transport(
        ClientConfig::new(SHOP_URL, "public-key", "secret-key"),
        MockTransport::new(),
    )
}

/// One page of a list endpoint.
pub fn page(items: Json, next: Option<&str>) -> Json {
    json!({ "items": items, "next": next })
}
