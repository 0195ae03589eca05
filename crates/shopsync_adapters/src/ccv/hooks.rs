//! Create, update and delete hooks against the CCV Shop API.
//!
//! Hooks resolve the remote ids of their dependencies from the destination
//! store. A dependency that is missing, or that has no remote id yet, fails
//! the hook before any request is sent.

use async_trait::async_trait;
use serde_json::{json, Map, Value as Json};
use shopsync_client::{ApiResponse, ClientResult, HttpTransport, ShopClient};
use shopsync_core::{fields, Attributes, Entity, EntityStore, Identity, ModelKind, Value};
use shopsync_engine::{Creatable, Deletable, HookSet, SyncError, SyncResult, Updatable};
use std::sync::Arc;
use tracing::debug;

/// Builds the hook set of the CCV destination.
pub(crate) fn hook_set<T: HttpTransport + 'static>(client: &Arc<ShopClient<T>>) -> HookSet {
    HookSet::new()
        .with_hooks(ModelKind::Product, ProductHook::new(Arc::clone(client)))
        .with_create(
            ModelKind::CategoryToDevice,
            CategoryHook::new(Arc::clone(client)),
        )
        .with_delete(
            ModelKind::CategoryToDevice,
            CategoryHook::new(Arc::clone(client)),
        )
        .with_hooks(
            ModelKind::AttributeValueToProduct,
            OptionHook::new(Arc::clone(client)),
        )
        .with_create(ModelKind::ProductPhoto, PhotoHook::new(Arc::clone(client)))
        .with_delete(ModelKind::ProductPhoto, PhotoHook::new(Arc::clone(client)))
}

/// Returns the remote id recorded on an entity.
pub fn remote_id(entity: &Entity) -> Option<i64> {
    entity.extra("id").and_then(Value::as_integer)
}

/// Looks up the remote id of a stored entity.
fn resolve(store: &EntityStore, kind: ModelKind, identity: Identity) -> Result<i64, String> {
    let entity = store.get(kind, &identity).map_err(|e| e.to_string())?;
    remote_id(&entity).ok_or_else(|| format!("{kind} {identity:?} has no remote id"))
}

fn created_id(kind: ModelKind, key: &str, response: &ApiResponse) -> SyncResult<i64> {
    response
        .id()
        .ok_or_else(|| SyncError::not_created(kind, key, "response carries no id"))
}

/// Treats a 404 on delete as already deleted.
fn gone_ok(kind: ModelKind, key: &str, result: ClientResult<ApiResponse>) -> SyncResult<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            debug!(%kind, key, "already gone at destination");
            Ok(())
        }
        Err(e) => Err(SyncError::not_deleted(kind, key, e)),
    }
}

fn identifier<'a>(kind: ModelKind, identity: &'a Identity, index: usize) -> SyncResult<&'a str> {
    identity.part(index).ok_or_else(|| {
        SyncError::from(shopsync_core::CoreError::MalformedEntity {
            kind,
            reason: format!("identity {identity:?} lacks part {index}"),
        })
    })
}

fn text<'a>(attributes: &'a Attributes, name: &str) -> &'a str {
    attributes.get(name).and_then(Value::as_text).unwrap_or("")
}

/// Product fields as the shop API names them.
fn api_field(name: &str) -> &str {
    match name {
        "short_description" => "shortdescription",
        other => other,
    }
}

/// Products.
pub(crate) struct ProductHook<T> {
    client: Arc<ShopClient<T>>,
}

impl<T> ProductHook<T> {
    pub(crate) fn new(client: Arc<ShopClient<T>>) -> Self {
        Self { client }
    }
}

fn package_id(store: &EntityStore, name: &str) -> Result<i64, String> {
    resolve(store, ModelKind::Package, Identity::from(name))
}

fn brand_id(store: &EntityStore, name: &str) -> Result<Option<i64>, String> {
    if name.is_empty() {
        return Ok(None);
    }
    resolve(store, ModelKind::Brand, Identity::from(name)).map(Some)
}

#[async_trait]
impl<T: HttpTransport + 'static> Creatable for ProductHook<T> {
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        attributes: &Attributes,
    ) -> SyncResult<Attributes> {
        let kind = ModelKind::Product;
        let key = identity.key();
        let productnumber = identifier(kind, identity, 0)?;
        let package_id = package_id(store, text(attributes, "package"))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;
        let brand_id = brand_id(store, text(attributes, "brand"))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;

        let body = json!({
            "name": text(attributes, "name"),
            "productnumber": productnumber,
            "shortdescription": text(attributes, "short_description"),
            "description": text(attributes, "description"),
            "package_id": package_id,
            "brand_id": brand_id,
            "price": attributes.get("price").and_then(Value::as_float).unwrap_or(0.0),
            "page_title": text(attributes, "page_title"),
            "meta_description": text(attributes, "meta_description"),
            "meta_keywords": text(attributes, "meta_keywords"),
            "photo_size": "BIG",
            "active": false,
            "discount": 0,
            "taxtariff": "normal",
        });
        let response = self
            .client
            .create_product(&body)
            .await
            .map_err(|e| SyncError::not_created(kind, &key, e))?;
        let id = created_id(kind, &key, &response)?;
        Ok(fields! { "id" => id })
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Updatable for ProductHook<T> {
    async fn update(
        &self,
        store: &EntityStore,
        entity: &Entity,
        changes: &Attributes,
    ) -> SyncResult<()> {
        let kind = ModelKind::Product;
        let key = entity.key();
        let id = remote_id(entity)
            .ok_or_else(|| SyncError::not_updated(kind, &key, "product has no remote id"))?;

        let mut body = Map::new();
        for (name, value) in changes {
            match (name.as_str(), value) {
                (_, Value::Null) => {}
                (_, Value::Text(s)) if s.is_empty() => {}
                ("package", Value::Text(package)) => {
                    let id = package_id(store, package)
                        .map_err(|reason| SyncError::not_updated(kind, &key, reason))?;
                    body.insert("package_id".into(), json!(id));
                }
                ("brand", Value::Text(brand)) => {
                    let id = brand_id(store, brand)
                        .map_err(|reason| SyncError::not_updated(kind, &key, reason))?;
                    body.insert("brand_id".into(), json!(id));
                }
                (name, value) => {
                    body.insert(api_field(name).to_string(), value.to_json());
                }
            }
        }
        if body.is_empty() {
            debug!(%kind, key = %key, "nothing to send");
            return Ok(());
        }
        self.client
            .patch_product(id, &Json::Object(body))
            .await
            .map_err(|e| SyncError::not_updated(kind, &key, e))?;
        Ok(())
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Deletable for ProductHook<T> {
    async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
        let kind = ModelKind::Product;
        let key = entity.key();
        match remote_id(entity) {
            Some(id) => gone_ok(kind, &key, self.client.delete_product(id).await),
            None => Ok(()),
        }
    }
}

/// Category assignments.
pub(crate) struct CategoryHook<T> {
    client: Arc<ShopClient<T>>,
}

impl<T> CategoryHook<T> {
    pub(crate) fn new(client: Arc<ShopClient<T>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Creatable for CategoryHook<T> {
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        _attributes: &Attributes,
    ) -> SyncResult<Attributes> {
        let kind = ModelKind::CategoryToDevice;
        let key = identity.key();
        let category = identifier(kind, identity, 0)?;
        let productnumber = identifier(kind, identity, 1)?;
        let product_id = resolve(store, ModelKind::Product, Identity::from(productnumber))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;
        let category_id = resolve(store, ModelKind::Category, Identity::from(category))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;

        let body = json!({ "product_id": product_id, "category_id": category_id });
        let response = self
            .client
            .create_product_to_category(&body)
            .await
            .map_err(|e| SyncError::not_created(kind, &key, e))?;
        let id = created_id(kind, &key, &response)?;
        Ok(fields! {
            "id" => id,
            "category_id" => category_id,
            "product_id" => product_id,
        })
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Deletable for CategoryHook<T> {
    async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
        let kind = ModelKind::CategoryToDevice;
        let key = entity.key();
        match remote_id(entity) {
            Some(id) => gone_ok(kind, &key, self.client.delete_product_to_category(id).await),
            None => Ok(()),
        }
    }
}

/// Option values on products.
pub(crate) struct OptionHook<T> {
    client: Arc<ShopClient<T>>,
}

impl<T> OptionHook<T> {
    pub(crate) fn new(client: Arc<ShopClient<T>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Creatable for OptionHook<T> {
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        attributes: &Attributes,
    ) -> SyncResult<Attributes> {
        let kind = ModelKind::AttributeValueToProduct;
        let key = identity.key();
        let productnumber = identifier(kind, identity, 0)?;
        let attribute = identifier(kind, identity, 1)?;
        let value = identifier(kind, identity, 2)?;
        let product_id = resolve(store, ModelKind::Product, Identity::from(productnumber))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;
        let value_id = resolve(
            store,
            ModelKind::AttributeValue,
            Identity::from([attribute, value]),
        )
        .map_err(|reason| SyncError::not_created(kind, &key, reason))?;

        let body = json!({
            "optionvalue": value_id,
            "price": attributes.get("price").and_then(Value::as_float).unwrap_or(0.0),
        });
        let response = self
            .client
            .create_product_attribute_value(product_id, &body)
            .await
            .map_err(|e| SyncError::not_created(kind, &key, e))?;
        let id = created_id(kind, &key, &response)?;
        Ok(fields! { "id" => id })
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Updatable for OptionHook<T> {
    async fn update(
        &self,
        _store: &EntityStore,
        entity: &Entity,
        changes: &Attributes,
    ) -> SyncResult<()> {
        let kind = ModelKind::AttributeValueToProduct;
        let key = entity.key();
        let Some(price) = changes.get("price").and_then(Value::as_float) else {
            return Ok(());
        };
        let id = remote_id(entity)
            .ok_or_else(|| SyncError::not_updated(kind, &key, "option has no remote id"))?;
        self.client
            .patch_product_attribute_value(id, &json!({ "price": price }))
            .await
            .map_err(|e| SyncError::not_updated(kind, &key, e))?;
        Ok(())
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Deletable for OptionHook<T> {
    async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
        let kind = ModelKind::AttributeValueToProduct;
        let key = entity.key();
        match remote_id(entity) {
            Some(id) => gone_ok(
                kind,
                &key,
                self.client.delete_product_attribute_value(id).await,
            ),
            None => Ok(()),
        }
    }
}

/// Product photos.
pub(crate) struct PhotoHook<T> {
    client: Arc<ShopClient<T>>,
}

impl<T> PhotoHook<T> {
    pub(crate) fn new(client: Arc<ShopClient<T>>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Creatable for PhotoHook<T> {
    async fn create(
        &self,
        store: &EntityStore,
        identity: &Identity,
        attributes: &Attributes,
    ) -> SyncResult<Attributes> {
        let kind = ModelKind::ProductPhoto;
        let key = identity.key();
        let productnumber = identifier(kind, identity, 0)?;
        let alttext = identifier(kind, identity, 1)?;
        let file_type = identifier(kind, identity, 2)?;
        let product_id = resolve(store, ModelKind::Product, Identity::from(productnumber))
            .map_err(|reason| SyncError::not_created(kind, &key, reason))?;

        let body = json!({
            "file_type": file_type,
            "alttext": alttext,
            "source": text(attributes, "source"),
        });
        let response = self
            .client
            .create_photo(product_id, &body)
            .await
            .map_err(|e| SyncError::not_created(kind, &key, e))?;
        let id = created_id(kind, &key, &response)?;
        Ok(fields! { "id" => id })
    }
}

#[async_trait]
impl<T: HttpTransport + 'static> Deletable for PhotoHook<T> {
    async fn delete(&self, _store: &EntityStore, entity: &Entity) -> SyncResult<()> {
        let kind = ModelKind::ProductPhoto;
        let key = entity.key();
        match remote_id(entity) {
            Some(id) => gone_ok(kind, &key, self.client.delete_photo(id).await),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_client::{ClientConfig, HttpResponse, Method, MockTransport};
    use shopsync_core::{AttributeValue, Brand, Package, Product, Record};

    fn client() -> Arc<ShopClient<MockTransport>> {
        Arc::new(ShopClient::with_transport(
            ClientConfig::new("https://shop.example.com", "pub", "secret"),
            MockTransport::new(),
        ))
    }

    fn reference_store() -> EntityStore {
        let store = EntityStore::new("ccv_shop");
        for (kind, identity, id) in [
            (ModelKind::Package, Package::new("doos").identity(), 3),
            (ModelKind::Brand, Brand::new("acme").identity(), 4),
            (
                ModelKind::AttributeValue,
                AttributeValue::new("maat", "xl").identity(),
                40,
            ),
        ] {
            store
                .get_or_instantiate(kind, identity.clone(), Attributes::new())
                .unwrap();
            store.set_extra(kind, &identity, "id", id as i64).unwrap();
        }
        store
    }

    fn body(request: &shopsync_client::HttpRequest) -> Json {
        serde_json::from_str(request.body.as_deref().unwrap_or("null")).unwrap()
    }

    #[tokio::test]
    async fn product_create_resolves_package_and_brand() {
        let client = client();
        client.transport().push_json(json!({"id": 101}));
        let store = reference_store();
        let product = Product::new("P1", "Jacket", "doos")
            .with_brand("acme")
            .with_price(49.95);

        let extras = ProductHook::new(Arc::clone(&client))
            .create(&store, &product.identity(), &product.attributes())
            .await
            .unwrap();
        assert_eq!(extras["id"], Value::Integer(101));

        let sent = &client.transport().requests()[0];
        assert_eq!(sent.method, Method::Post);
        let sent = body(sent);
        assert_eq!(sent["package_id"], 3);
        assert_eq!(sent["brand_id"], 4);
        assert_eq!(sent["productnumber"], "P1");
        assert_eq!(sent["active"], false);
        assert_eq!(sent["taxtariff"], "normal");
    }

    #[tokio::test]
    async fn product_create_without_package_sends_nothing() {
        let client = client();
        let store = reference_store();
        let product = Product::new("P1", "Jacket", "krat");

        let err = ProductHook::new(Arc::clone(&client))
            .create(&store, &product.identity(), &product.attributes())
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ObjectNotCreated { .. }));
        assert!(client.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn product_update_sends_non_empty_changes() {
        let client = client();
        client.transport().push_json(json!({}));
        let store = reference_store();
        let entity = Product::new("P1", "Jacket", "doos")
            .to_entity()
            .unwrap()
            .with_extra("id", 101_i64);

        let changes = fields! { "price" => 59.95, "description" => "", "brand" => "acme" };
        ProductHook::new(Arc::clone(&client))
            .update(&store, &entity, &changes)
            .await
            .unwrap();

        let sent = &client.transport().requests()[0];
        assert_eq!(sent.method, Method::Patch);
        assert!(sent.url.ends_with("/products/101/"));
        assert_eq!(body(sent), json!({"price": 59.95, "brand_id": 4}));
    }

    #[tokio::test]
    async fn option_create_needs_the_attribute_value() {
        let client = client();
        let store = reference_store();
        store
            .get_or_instantiate_record(&Product::new("P1", "Jacket", "doos"))
            .unwrap();
        store
            .set_extra(ModelKind::Product, &Identity::from("P1"), "id", 101_i64)
            .unwrap();

        let hook = OptionHook::new(Arc::clone(&client));
        let missing = Identity::from(["P1", "maat", "3xl"]);
        let err = hook
            .create(&store, &missing, &fields! { "price" => 0.0 })
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::ObjectNotCreated { .. }));

        client.transport().push_json(json!({"id": 900}));
        let known = Identity::from(["P1", "maat", "xl"]);
        let extras = hook
            .create(&store, &known, &fields! { "price" => 2.5 })
            .await
            .unwrap();
        assert_eq!(extras["id"], Value::Integer(900));
        let sent = &client.transport().requests()[0];
        assert!(sent.url.ends_with("/products/101/productattributevalues/"));
        assert_eq!(body(sent), json!({"optionvalue": 40, "price": 2.5}));
    }

    #[tokio::test]
    async fn delete_tolerates_missing_remote_object() {
        let client = client();
        client
            .transport()
            .push_response(HttpResponse::new(404, "not found"))
            .push_response(HttpResponse::new(500, "boom"));
        let store = reference_store();
        let photo = shopsync_core::ProductPhoto::new("P1", "front", "jpg", "")
            .to_entity()
            .unwrap()
            .with_extra("id", 7_i64);

        let hook = PhotoHook::new(Arc::clone(&client));
        hook.delete(&store, &photo).await.unwrap();
        let err = hook.delete(&store, &photo).await.unwrap_err();
        assert!(matches!(err, SyncError::ObjectNotDeleted { .. }));
    }
}
