//! CCV Shop REST endpoints.

use crate::client::{ApiResponse, ShopClient};
use crate::error::ClientResult;
use crate::paging::{PageLimit, PagedResult};
use crate::transport::HttpTransport;
use serde_json::Value;

/// Prefix of every REST resource.
pub const API_PREFIX: &str = "/api/rest/v1";

fn path(resource: &str) -> String {
    format!("{API_PREFIX}/{resource}")
}

impl<T: HttpTransport> ShopClient<T> {
    // products

    /// Creates a product.
    pub async fn create_product(&self, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path("products"), body).await
    }

    /// Updates fields of a product.
    pub async fn patch_product(&self, id: i64, body: &Value) -> ClientResult<ApiResponse> {
        self.patch(&path(&format!("products/{id}")), body).await
    }

    /// Deletes a product.
    pub async fn delete_product(&self, id: i64) -> ClientResult<ApiResponse> {
        self.delete(&path(&format!("products/{id}"))).await
    }

    /// Fetches one product.
    pub async fn get_product(&self, id: i64) -> ClientResult<ApiResponse> {
        self.get(&path(&format!("products/{id}")), &[]).await
    }

    /// Lists products.
    pub async fn get_products(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("products"), per_page, limit, &[]).await
    }

    /// Lists the products of a category.
    pub async fn get_products_by_category(
        &self,
        category_id: i64,
        per_page: u32,
        limit: PageLimit,
    ) -> ClientResult<PagedResult> {
        self.get_paged(
            &path(&format!("categories/{category_id}/products")),
            per_page,
            limit,
            &[],
        )
        .await
    }

    // reference data

    /// Lists categories.
    pub async fn get_categories(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("categories"), per_page, limit, &[]).await
    }

    /// Creates a category.
    pub async fn create_category(&self, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path("categories"), body).await
    }

    /// Lists package types.
    pub async fn get_packages(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("packages"), per_page, limit, &[]).await
    }

    /// Creates a package type.
    pub async fn create_package(&self, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path("packages"), body).await
    }

    /// Lists brands.
    pub async fn get_brands(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("brands"), per_page, limit, &[]).await
    }

    /// Lists suppliers.
    pub async fn get_suppliers(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("suppliers"), per_page, limit, &[]).await
    }

    /// Creates a supplier.
    pub async fn create_supplier(&self, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path("suppliers"), body).await
    }

    /// Lists option attributes.
    pub async fn get_attributes(&self, per_page: u32, limit: PageLimit) -> ClientResult<PagedResult> {
        self.get_paged(&path("attributes"), per_page, limit, &[]).await
    }

    /// Lists the values of an option attribute.
    pub async fn get_attribute_values(
        &self,
        attribute_id: i64,
        per_page: u32,
        limit: PageLimit,
    ) -> ClientResult<PagedResult> {
        self.get_paged(
            &path(&format!("attributes/{attribute_id}/attributevalues")),
            per_page,
            limit,
            &[],
        )
        .await
    }

    // product to category

    /// Links a product to a category.
    pub async fn create_product_to_category(&self, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path("producttocategories"), body).await
    }

    /// Lists the product links of a category.
    pub async fn get_product_to_category(
        &self,
        category_id: i64,
        per_page: u32,
        limit: PageLimit,
    ) -> ClientResult<PagedResult> {
        self.get_paged(
            &path(&format!("categories/{category_id}/producttocategories")),
            per_page,
            limit,
            &[],
        )
        .await
    }

    /// Removes a product-category link.
    pub async fn delete_product_to_category(&self, id: i64) -> ClientResult<ApiResponse> {
        self.delete(&path(&format!("producttocategories/{id}"))).await
    }

    // product attribute values

    /// Lists the option values of a product.
    pub async fn get_product_attribute_values(
        &self,
        product_id: i64,
        per_page: u32,
        limit: PageLimit,
    ) -> ClientResult<PagedResult> {
        self.get_paged(
            &path(&format!("products/{product_id}/productattributevalues")),
            per_page,
            limit,
            &[],
        )
        .await
    }

    /// Adds an option value to a product.
    pub async fn create_product_attribute_value(
        &self,
        product_id: i64,
        body: &Value,
    ) -> ClientResult<ApiResponse> {
        self.post(
            &path(&format!("products/{product_id}/productattributevalues")),
            body,
        )
        .await
    }

    /// Changes the price differential of a product option value.
    pub async fn patch_product_attribute_value(
        &self,
        id: i64,
        body: &Value,
    ) -> ClientResult<ApiResponse> {
        self.patch(&path(&format!("productattributevalues/{id}")), body)
            .await
    }

    /// Removes an option value from a product.
    pub async fn delete_product_attribute_value(&self, id: i64) -> ClientResult<ApiResponse> {
        self.delete(&path(&format!("productattributevalues/{id}"))).await
    }

    // photos

    /// Lists the photos of a product.
    pub async fn get_photos(
        &self,
        product_id: i64,
        per_page: u32,
        limit: PageLimit,
    ) -> ClientResult<PagedResult> {
        self.get_paged(
            &path(&format!("products/{product_id}/productphotos")),
            per_page,
            limit,
            &[],
        )
        .await
    }

    /// Uploads a photo for a product.
    pub async fn create_photo(&self, product_id: i64, body: &Value) -> ClientResult<ApiResponse> {
        self.post(&path(&format!("products/{product_id}/productphotos")), body)
            .await
    }

    /// Deletes a photo.
    pub async fn delete_photo(&self, id: i64) -> ClientResult<ApiResponse> {
        self.delete(&path(&format!("productphotos/{id}"))).await
    }
}
