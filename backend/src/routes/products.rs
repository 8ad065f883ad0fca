use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};
use catalog_storage::{image::ImageStore, product::{ProductRecord, ProductStore}};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::{
    catalog::{self, Product, ValidationRules},
    types::{AppError, JsonPayload},
};

/// Response when listing products
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ProductListResponse {
    /// All products, in storage order
    pub items: Vec<ProductRecord>,
    /// Number of products in `items`
    pub count: usize,
}

/// Create a product
///
/// Stores the decoded image in the images bucket and then writes the product record.
///
/// # Returns
///
/// Returns `201 CREATED` with the stored product record
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - Invalid JSON, empty name, negative price or malformed image data
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Storage backend unavailable
#[instrument(skip_all)]
pub async fn create_product(
    Extension(product_store): Extension<Arc<dyn ProductStore>>,
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
    Extension(rules): Extension<ValidationRules>,
    JsonPayload(payload): JsonPayload<Product>,
) -> Result<(StatusCode, Json<ProductRecord>), AppError> {
    let record = catalog::create_product(
        product_store.as_ref(),
        image_store.as_ref(),
        &rules,
        payload,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(record)))
}

/// List all products
///
/// # Returns
///
/// Returns `200 OK` with every product and their count; an empty catalog is not an error
///
/// # Errors
///
/// Returns an error if:
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Storage backend unavailable
#[instrument(skip_all)]
pub async fn list_products(
    Extension(product_store): Extension<Arc<dyn ProductStore>>,
) -> Result<Json<ProductListResponse>, AppError> {
    let items = catalog::list_products(product_store.as_ref()).await?;

    Ok(Json(ProductListResponse {
        count: items.len(),
        items,
    }))
}

/// Delete a product
///
/// Removes the product image and record. Deleting an unknown product succeeds, so the
/// request can be retried safely.
///
/// # Returns
///
/// Returns `204 NO_CONTENT` on successful deletion
///
/// # Errors
///
/// Returns an error if:
/// - `400 BAD_REQUEST` - ID is not a UUID
/// - `500 INTERNAL_SERVER_ERROR` - Storage operation fails
/// - `503 SERVICE_UNAVAILABLE` - Storage backend unavailable
#[instrument(skip(product_store, image_store))]
pub async fn delete_product(
    Path(id): Path<String>,
    Extension(product_store): Extension<Arc<dyn ProductStore>>,
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
) -> Result<StatusCode, AppError> {
    catalog::delete_product(product_store.as_ref(), image_store.as_ref(), &id).await?;

    Ok(StatusCode::NO_CONTENT)
}
