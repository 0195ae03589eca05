use shopsync_adapters::{CatalogAdapter, CatalogSettings, CcvSettings, MappingSettings, ValueMapping};
use shopsync_core::{Identity, ModelKind, Value};
use shopsync_engine::{Adapter, SyncError};
use std::io::Write;
use tempfile::NamedTempFile;

const CATALOG: &str = r#"[
  {"article_number": "J-100", "name": "Softshell", "product_type": "Jassen",
   "price": 59.95, "color": "nvy", "size": "M",
   "image_url": "https://img.example.com/j100-navy.png", "categories": ["Jackets"]},
  {"article_number": "J-100", "name": "Softshell", "product_type": "Jassen",
   "price": 65.0, "color": "nvy", "size": "XXL",
   "image_url": "https://img.example.com/j100-navy.png", "categories": ["Jackets"]},
  {"article_number": "J-100", "name": "Softshell", "product_type": "Jassen",
   "price": 59.95, "color": "blk", "size": "M",
   "image_url": "https://img.example.com/j100-black.png"},
  {"article_number": "S-1", "name": "Sok", "product_type": "SOKKEN", "price": 4.0}
]"#;

fn write_catalog(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn adapter(path: &std::path::Path) -> CatalogAdapter {
    let catalog = CatalogSettings {
        path: path.to_path_buf(),
        excluded_product_types: vec!["Sokken".into()],
    };
    let ccv = CcvSettings {
        root_category: "Werkkleding".into(),
        color_category: "Kleur".into(),
        sizing_category: "Maat".into(),
        brand: "Tricorp".into(),
        additional_categories: vec!["Nieuw binnen".into()],
        url: Some("https://shop.example.com".into()),
    };
    let mapping = MappingSettings {
        color: ValueMapping::new().with("nvy", "Navy").with("blk", "Zwart"),
        size: ValueMapping::new().with("XXL", "2XL"),
        category: ValueMapping::new().with("Jackets", "Jassen"),
    };
    CatalogAdapter::new(catalog, ccv, mapping)
}

#[tokio::test]
async fn reads_variant_rows_from_file() {
    let file = write_catalog(CATALOG);
    let adapter = adapter(file.path());
    adapter.load().await.unwrap();
    let store = adapter.store();

    assert_eq!(store.count(ModelKind::Product), 1);
    let product = store.get(ModelKind::Product, &Identity::from("J-100")).unwrap();
    assert_eq!(product.attribute("price"), Some(&Value::Float(59.95)));
    assert_eq!(product.text("brand"), Some("tricorp"));

    let option = |attribute: &str, value: &str| {
        store
            .get(
                ModelKind::AttributeValueToProduct,
                &Identity::from(["J-100", attribute, value]),
            )
            .unwrap()
            .attribute("price")
            .cloned()
    };
    assert_eq!(option("maat", "m"), Some(Value::Float(0.0)));
    assert_eq!(option("maat", "2xl"), Some(Value::Float(5.05)));
    assert_eq!(option("kleur", "navy"), Some(Value::Float(0.0)));
    assert_eq!(option("kleur", "zwart"), Some(Value::Float(0.0)));

    let categories = store
        .children(ModelKind::Product, &Identity::from("J-100"), "categories")
        .unwrap();
    assert_eq!(categories.len(), 3);
    assert_eq!(store.count(ModelKind::ProductPhoto), 2);
}

#[tokio::test]
async fn malformed_file_fails_the_load() {
    let file = write_catalog(r#"[{"article_number": "X"}]"#);
    let err = adapter(file.path()).load().await.unwrap_err();
    assert!(matches!(err, SyncError::Load { .. }));
    assert!(err.to_string().contains("invalid catalog"));
}

#[tokio::test]
async fn missing_file_fails_the_load() {
    let dir = tempfile::tempdir().unwrap();
    let err = adapter(&dir.path().join("absent.json"))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, SyncError::Load { .. }));
}
