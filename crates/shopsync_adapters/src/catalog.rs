//! Catalog file source.
//!
//! The catalog is a JSON array of variant rows: one row per article, colour
//! and size combination. Rows of one article number form one product.
//!
//! ## Pricing
//!
//! The file is read in two passes. The first pass finds the lowest variant
//! price of every article; that becomes the product price. The second pass
//! turns each size into an option whose price is what the variant costs on
//! top of the product price, never negative and rounded to cents. Colours
//! never change the price.

use crate::error::{AdapterError, AdapterResult};
use crate::file_type;
use crate::settings::{CatalogSettings, CcvSettings, MappingSettings, ValueMapping};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shopsync_core::{
    AttributeAssignment, CategoryAssignment, EntityStore, ModelKind, Product, ProductPhoto,
};
use shopsync_engine::{normalize, Adapter, SyncError, SyncResult, WorkerPool};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Package used when a row names none.
pub const DEFAULT_PACKAGE: &str = "kartonnen doos";

/// Longest meta description sent to the shop.
const META_DESCRIPTION_LIMIT: usize = 320;

/// One variant row of the catalog file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    /// Article number shared by all variants of a product.
    pub article_number: String,
    /// Product name.
    pub name: String,
    /// Product type, used for exclusion.
    #[serde(default)]
    pub product_type: String,
    /// Package type name.
    #[serde(default)]
    pub package: Option<String>,
    /// Product description.
    #[serde(default)]
    pub description: String,
    /// Variant price.
    pub price: f64,
    /// Variant colour in source vocabulary.
    #[serde(default)]
    pub color: Option<String>,
    /// Variant size in source vocabulary.
    #[serde(default)]
    pub size: Option<String>,
    /// Image URL of the variant.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Base64 image payload uploaded with new photos.
    #[serde(default)]
    pub image_data: Option<String>,
    /// Source categories.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Annotates every row with the lowest price of its article.
///
/// Row order is kept.
pub fn with_base_prices(rows: Vec<CatalogRow>) -> Vec<(CatalogRow, f64)> {
    let mut base: HashMap<String, f64> = HashMap::new();
    for row in &rows {
        base.entry(row.article_number.clone())
            .and_modify(|p| *p = p.min(row.price))
            .or_insert(row.price);
    }
    rows.into_iter()
        .map(|row| {
            let price = base.get(&row.article_number).copied().unwrap_or(row.price);
            (row, price)
        })
        .collect()
}

/// Price differential of a variant over its base price.
pub fn price_differential(variant: f64, base: f64) -> f64 {
    let diff = ((variant - base) * 100.0).round() / 100.0;
    diff.max(0.0)
}

fn meta_description(description: &str) -> String {
    if description.chars().count() <= META_DESCRIPTION_LIMIT {
        return description.to_string();
    }
    let mut cut: String = description.chars().take(META_DESCRIPTION_LIMIT - 3).collect();
    cut.push_str("...");
    cut
}

/// Everything one worker needs to register a product.
#[derive(Debug, Clone, Default)]
struct CatalogProduct {
    product: Product,
    categories: Vec<String>,
    sizes: Vec<(String, f64)>,
    colors: Vec<String>,
    images: Vec<Image>,
}

#[derive(Debug, Clone)]
struct Image {
    color: Option<String>,
    url: String,
    data: String,
}

/// Settings shared by all load jobs.
#[derive(Debug)]
struct Context {
    ccv: CcvSettings,
    mapping: MappingSettings,
}

fn push_unique(values: &mut Vec<String>, value: &str) {
    if !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}

/// Groups priced rows into products, in order of first appearance.
fn group(rows: Vec<(CatalogRow, f64)>, brand: &str) -> Vec<CatalogProduct> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut products: Vec<CatalogProduct> = Vec::new();
    for (row, base) in rows {
        let slot = *index.entry(row.article_number.clone()).or_insert_with(|| {
            let package = row.package.as_deref().unwrap_or(DEFAULT_PACKAGE);
            products.push(CatalogProduct {
                product: Product {
                    productnumber: row.article_number.clone(),
                    name: row.name.clone(),
                    description: row.description.clone(),
                    package: normalize(package),
                    price: base,
                    brand: normalize(brand),
                    page_title: row.name.clone(),
                    meta_description: meta_description(&row.description),
                    ..Product::default()
                },
                ..CatalogProduct::default()
            });
            products.len() - 1
        });
        let entry = &mut products[slot];
        for category in &row.categories {
            push_unique(&mut entry.categories, category);
        }
        if let Some(size) = row.size.as_deref().filter(|s| !s.trim().is_empty()) {
            if !entry.sizes.iter().any(|(s, _)| s == size) {
                entry
                    .sizes
                    .push((size.to_string(), price_differential(row.price, base)));
            }
        }
        if let Some(color) = row.color.as_deref().filter(|c| !c.trim().is_empty()) {
            push_unique(&mut entry.colors, color);
        }
        if let Some(url) = row.image_url.as_deref().filter(|u| !u.is_empty()) {
            if !entry.images.iter().any(|i| i.url == url) {
                entry.images.push(Image {
                    color: row.color.clone(),
                    url: url.to_string(),
                    data: row.image_data.clone().unwrap_or_default(),
                });
            }
        }
    }
    products
}

/// Translates through `mapping`, falling back to the value itself.
fn mapped(mapping: &ValueMapping, value: &str) -> String {
    match mapping.get(value) {
        Some(to) => normalize(to),
        None => {
            debug!(value, "no mapping, used as is");
            normalize(value)
        }
    }
}

/// Registers one product and its children.
fn register(store: &EntityStore, context: &Context, item: CatalogProduct) -> AdapterResult<()> {
    let number = item.product.productnumber.clone();
    let (product, created) = store.get_or_instantiate_record(&item.product)?;
    if !created {
        warn!(productnumber = %number, "product registered twice");
    }

    let mut categories = vec![context.ccv.root_category.clone()];
    for category in &item.categories {
        match context.mapping.category.get(category) {
            Some(to) => push_unique(&mut categories, to),
            None => warn!(productnumber = %number, category = %category, "no shop category mapped"),
        }
    }
    for category in &context.ccv.additional_categories {
        push_unique(&mut categories, category);
    }
    for category in categories {
        let (child, _) =
            store.get_or_instantiate_record(&CategoryAssignment::new(category, &number))?;
        store.attach(&product, &child)?;
    }

    let sizing = normalize(&context.ccv.sizing_category);
    for (size, price) in &item.sizes {
        let value = mapped(&context.mapping.size, size);
        let record = AttributeAssignment::new(&number, &sizing, value, *price);
        let (child, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.attach(&product, &child)?;
        }
    }
    let coloring = normalize(&context.ccv.color_category);
    for color in &item.colors {
        let value = mapped(&context.mapping.color, color);
        let record = AttributeAssignment::new(&number, &coloring, value, 0.0);
        let (child, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.attach(&product, &child)?;
        }
    }

    for image in &item.images {
        if let Some(color) = &image.color {
            if context.mapping.color.get(color).is_none() {
                warn!(productnumber = %number, color = %color, "image colour cannot be mapped");
            }
        }
        let record = ProductPhoto::new(&number, &image.url, file_type(&image.url), &image.data);
        let (child, created) = store.get_or_instantiate_record(&record)?;
        if created {
            store.attach(&product, &child)?;
        }
    }
    Ok(())
}

/// Source adapter reading a catalog file.
pub struct CatalogAdapter {
    settings: CatalogSettings,
    context: Arc<Context>,
    rows: Option<Vec<CatalogRow>>,
    store: Arc<EntityStore>,
    workers: usize,
}

impl CatalogAdapter {
    /// Name used for the store and in logs.
    pub const NAME: &'static str = "catalog";

    /// Creates an adapter reading `settings.path`.
    pub fn new(settings: CatalogSettings, ccv: CcvSettings, mapping: MappingSettings) -> Self {
        Self {
            settings,
            context: Arc::new(Context { ccv, mapping }),
            rows: None,
            store: Arc::new(EntityStore::new(Self::NAME)),
            workers: 10,
        }
    }

    /// Loads these rows instead of reading the file.
    pub fn with_rows(mut self, rows: Vec<CatalogRow>) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Sets the number of concurrent per-product jobs.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    async fn read_rows(&self) -> AdapterResult<Vec<CatalogRow>> {
        if let Some(rows) = &self.rows {
            return Ok(rows.clone());
        }
        let text = tokio::fs::read_to_string(&self.settings.path).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn load_catalog(&self) -> AdapterResult<()> {
        self.context.ccv.validate()?;
        let rows = self.read_rows().await?;
        let read = rows.len();
        let rows: Vec<CatalogRow> = rows
            .into_iter()
            .filter(|row| {
                let excluded = self.settings.is_excluded(&row.product_type);
                if excluded {
                    debug!(article = %row.article_number, product_type = %row.product_type, "excluded");
                }
                !excluded
            })
            .collect();
        if rows.iter().any(|row| row.article_number.trim().is_empty()) {
            return Err(AdapterError::Settings(
                "catalog rows need an article_number".into(),
            ));
        }

        let products = group(with_base_prices(rows), &self.context.ccv.brand);
        let total = products.len();
        info!(rows = read, products = total, "catalog read");

        let outcome = WorkerPool::new(self.workers)
            .run("catalog products", products, |item| {
                let store = Arc::clone(&self.store);
                let context = Arc::clone(&self.context);
                async move { register(&store, &context, item) }
            })
            .await;
        if !outcome.is_success() {
            warn!(
                failed = outcome.failures.len(),
                products = total,
                "some products loaded partially"
            );
        }
        debug!(
            products = self.store.count(ModelKind::Product),
            entities = self.store.total_count(),
            "catalog loaded"
        );
        Ok(())
    }
}

#[async_trait]
impl Adapter for CatalogAdapter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn store(&self) -> &EntityStore {
        &self.store
    }

    async fn load(&self) -> SyncResult<()> {
        self.load_catalog()
            .await
            .map_err(|e| SyncError::load(Self::NAME, e))
    }
}
