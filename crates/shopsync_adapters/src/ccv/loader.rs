//! Loading the destination shop into an entity store.
//!
//! Reference data is loaded first so that products can be resolved by the
//! remote ids they carry. Per-product children (option values and photos)
//! need one or more requests per product and are fetched by a bounded pool.

use crate::error::{AdapterError, AdapterResult};
use crate::file_type;
use serde_json::Value as Json;
use shopsync_client::{HttpTransport, PageLimit, ShopClient, MAX_PAGE_SIZE};
use shopsync_core::{
    fields, Attribute, AttributeAssignment, AttributeValue, Brand, Category, CategoryAssignment,
    EntityStore, Identity, ModelKind, Package, Product, ProductPhoto, Record, Value,
};
use shopsync_engine::{normalize, WorkerPool};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Photos are listed in smaller pages than other resources.
const PHOTO_PAGE_SIZE: u32 = 100;

/// Remote id -> entity key.
type IdMap = BTreeMap<i64, String>;

fn id_of(item: &Json, resource: &'static str) -> AdapterResult<i64> {
    item.get("id")
        .and_then(Json::as_i64)
        .ok_or_else(|| AdapterError::malformed(resource, format!("no numeric id in {item}")))
}

fn text_of<'a>(item: &'a Json, field: &str) -> &'a str {
    item.get(field).and_then(Json::as_str).unwrap_or("")
}

/// A text field that identifies the entity; absent or non-text is malformed.
fn required_text<'a>(
    item: &'a Json,
    field: &str,
    resource: &'static str,
) -> AdapterResult<&'a str> {
    item.get(field)
        .and_then(Json::as_str)
        .ok_or_else(|| AdapterError::malformed(resource, format!("no {field} in {item}")))
}

fn float_of(item: &Json, field: &str) -> f64 {
    match item.get(field) {
        Some(Json::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(v) => v.as_f64().unwrap_or(0.0),
        None => 0.0,
    }
}

/// Id of a nested reference such as `"brand": {"id": 4, ...}`.
fn ref_id(item: &Json, field: &str) -> Option<i64> {
    item.get(field)?.get("id")?.as_i64()
}

/// Registers named reference records and remembers their remote ids.
///
/// `build` returns `None` for items that should be ignored.
fn register_named<R: Record>(
    store: &EntityStore,
    resource: &'static str,
    items: Vec<Json>,
    build: impl Fn(&str) -> Option<R>,
) -> AdapterResult<IdMap> {
    let mut ids = IdMap::new();
    for item in items {
        let id = id_of(&item, resource)?;
        let Some(record) = build(text_of(&item, "name")) else {
            continue;
        };
        let (entity, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.set_extra(R::KIND, entity.identity(), "id", id)?;
        }
        ids.insert(id, entity.key());
    }
    debug!(resource, count = ids.len(), "reference data loaded");
    Ok(ids)
}

/// Loads everything below the root category into `store`.
pub(crate) async fn load<T: HttpTransport + 'static>(
    client: &Arc<ShopClient<T>>,
    store: &Arc<EntityStore>,
    root_category: &str,
    workers: usize,
) -> AdapterResult<()> {
    let packages = register_named(
        store,
        "packages",
        client.get_packages(MAX_PAGE_SIZE, PageLimit::All).await?.into_items(),
        |name| Some(Package::new(normalize(name))),
    )?;
    let brands = register_named(
        store,
        "brands",
        client.get_brands(MAX_PAGE_SIZE, PageLimit::All).await?.into_items(),
        |name| Some(Brand::new(normalize(name))),
    )?;
    let categories = register_named(
        store,
        "categories",
        client.get_categories(MAX_PAGE_SIZE, PageLimit::All).await?.into_items(),
        |name| (!name.is_empty()).then(|| Category::new(name)),
    )?;
    let root_id = store
        .find(ModelKind::Category, &Identity::from(root_category))
        .and_then(|root| root.extra("id").and_then(Value::as_integer))
        .ok_or_else(|| AdapterError::RootCategoryMissing(root_category.to_string()))?;

    load_attributes(client, store).await?;

    let products = load_products(client, store, root_id, &packages, &brands).await?;
    load_category_links(client, store, &categories, &products).await?;

    let total = products.len();
    let outcome = WorkerPool::new(workers)
        .run("ccv products", products, |(product_id, productnumber)| {
            let client = Arc::clone(client);
            let store = Arc::clone(store);
            async move { load_product_children(&client, &store, product_id, &productnumber).await }
        })
        .await;
    if !outcome.is_success() {
        warn!(
            failed = outcome.failures.len(),
            products = total,
            "some products loaded partially"
        );
    }
    info!(
        products = total,
        entities = store.total_count(),
        "destination loaded"
    );
    Ok(())
}

async fn load_attributes<T: HttpTransport>(
    client: &ShopClient<T>,
    store: &EntityStore,
) -> AdapterResult<()> {
    let items = client
        .get_attributes(MAX_PAGE_SIZE, PageLimit::All)
        .await?
        .into_items();
    for item in items {
        let id = id_of(&item, "attributes")?;
        let name = normalize(required_text(&item, "name", "attributes")?);
        let (attribute, created) = store.get_or_instantiate_record(&Attribute::new(&name))?;
        if created {
            store.set_extra(ModelKind::Attribute, attribute.identity(), "id", id)?;
        }
        let values = client
            .get_attribute_values(id, MAX_PAGE_SIZE, PageLimit::All)
            .await?
            .into_items();
        for value in values {
            let value_id = id_of(&value, "attribute values")?;
            let record = AttributeValue::new(
                &name,
                normalize(required_text(&value, "name", "attribute values")?),
            );
            let (entity, created) = store.get_or_instantiate_record(&record)?;
            if created {
                store.set_extra(ModelKind::AttributeValue, entity.identity(), "id", value_id)?;
                store.attach(&attribute, &entity)?;
            }
        }
    }
    Ok(())
}

/// Builds a product record from a listing item.
fn product_record(item: &Json, packages: &IdMap, brands: &IdMap) -> AdapterResult<Product> {
    let lookup = |field: &str, ids: &IdMap, kind: ModelKind| -> AdapterResult<String> {
        match ref_id(item, field) {
            Some(id) => ids
                .get(&id)
                .cloned()
                .ok_or(AdapterError::UnknownReference { kind, id }),
            None => Ok(String::new()),
        }
    };
    Ok(Product {
        productnumber: text_of(item, "productnumber").trim().to_string(),
        name: text_of(item, "name").to_string(),
        short_description: String::new(),
        description: text_of(item, "description").to_string(),
        package: lookup("package", packages, ModelKind::Package)?,
        price: float_of(item, "price"),
        brand: lookup("brand", brands, ModelKind::Brand)?,
        page_title: text_of(item, "page_title").to_string(),
        meta_description: text_of(item, "meta_description").to_string(),
        meta_keywords: text_of(item, "meta_keywords").to_string(),
    })
}

/// Loads the products of the root category; returns remote id -> productnumber.
async fn load_products<T: HttpTransport>(
    client: &ShopClient<T>,
    store: &EntityStore,
    root_id: i64,
    packages: &IdMap,
    brands: &IdMap,
) -> AdapterResult<IdMap> {
    let items = client
        .get_products_by_category(root_id, MAX_PAGE_SIZE, PageLimit::All)
        .await?
        .into_items();
    let mut products = IdMap::new();
    for item in items {
        let id = id_of(&item, "products")?;
        let product = product_record(&item, packages, brands)?;
        if product.productnumber.is_empty() {
            warn!(id, "product without productnumber ignored");
            continue;
        }
        let (entity, created) = store.get_or_instantiate_record(&product)?;
        if !created {
            warn!(id, productnumber = %product.productnumber, "duplicate productnumber ignored");
            continue;
        }
        store.set_extra(ModelKind::Product, entity.identity(), "id", id)?;
        products.insert(id, product.productnumber);
    }
    Ok(products)
}

async fn load_category_links<T: HttpTransport>(
    client: &ShopClient<T>,
    store: &EntityStore,
    categories: &IdMap,
    products: &IdMap,
) -> AdapterResult<()> {
    for (&category_id, category) in categories {
        let links = client
            .get_product_to_category(category_id, MAX_PAGE_SIZE, PageLimit::All)
            .await?
            .into_items();
        for link in links {
            let Some(product_id) = link.get("product_id").and_then(Json::as_i64) else {
                continue;
            };
            // Products outside the root category are not managed.
            let Some(productnumber) = products.get(&product_id) else {
                continue;
            };
            let link_id = id_of(&link, "product to category")?;
            let record = CategoryAssignment::new(category, productnumber);
            let (entity, created) = store.get_or_instantiate_record(&record)?;
            if !created {
                continue;
            }
            store.merge_extras(
                ModelKind::CategoryToDevice,
                entity.identity(),
                fields! {
                    "id" => link_id,
                    "category_id" => category_id,
                    "product_id" => product_id,
                },
            )?;
            store.attach_child(
                ModelKind::Product,
                &Identity::from(productnumber.as_str()),
                "categories",
                ModelKind::CategoryToDevice,
                entity.identity(),
            )?;
        }
    }
    Ok(())
}

/// Loads the option values and photos of one product.
async fn load_product_children<T: HttpTransport>(
    client: &ShopClient<T>,
    store: &EntityStore,
    product_id: i64,
    productnumber: &str,
) -> AdapterResult<()> {
    let product = Identity::from(productnumber);

    let options = client
        .get_product_attribute_values(product_id, MAX_PAGE_SIZE, PageLimit::All)
        .await?
        .into_items();
    for item in options {
        let resource = "product attribute values";
        let id = id_of(&item, resource)?;
        let record = AttributeAssignment::new(
            productnumber,
            normalize(required_text(&item, "optionname", resource)?),
            normalize(required_text(&item, "optionvalue_name", resource)?),
            float_of(&item, "price"),
        );
        let (entity, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.set_extra(ModelKind::AttributeValueToProduct, entity.identity(), "id", id)?;
            store.attach_child(
                ModelKind::Product,
                &product,
                "attributes",
                ModelKind::AttributeValueToProduct,
                entity.identity(),
            )?;
        }
    }

    let photos = client
        .get_photos(product_id, PHOTO_PAGE_SIZE, PageLimit::All)
        .await?
        .into_items();
    for item in photos {
        let id = id_of(&item, "product photos")?;
        let record = ProductPhoto::new(
            productnumber,
            required_text(&item, "alttext", "product photos")?,
            file_type(text_of(&item, "deeplink")),
            "",
        );
        let (entity, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.set_extra(ModelKind::ProductPhoto, entity.identity(), "id", id)?;
            store.attach_child(
                ModelKind::Product,
                &product,
                "photos",
                ModelKind::ProductPhoto,
                entity.identity(),
            )?;
        }
    }
    debug!(productnumber, "product children loaded");
    Ok(())
}
