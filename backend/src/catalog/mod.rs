//! Product catalog operations
//!
//! The three operations coordinate the record store and the image store:
//! - create writes the image first and the record second, so a record never points at a
//!   missing image (a failed record write leaves an orphaned image behind)
//! - list reads the whole record store
//! - delete removes the image and then the record, both idempotently, so it can be retried
//!   after a partial failure

mod error;
mod image_data;

use catalog_storage::{
    image::{image_key_for, ImageStore},
    product::{ProductRecord, ProductStore},
};
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub use error::{CatalogError, CatalogResult, StorageError, ValidationFailure};
pub use image_data::{decode_image_data, sniff_content_type, DecodedImage};

/// Default upper bound for decoded product images (5 MiB)
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Room for the data URL header and the other JSON fields of a create request
const REQUEST_OVERHEAD_BYTES: usize = 64 * 1024;

/// Product submitted for creation
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Product {
    /// Display name, must not be blank
    #[validate(length(min = 1))]
    pub name: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Price, must not be negative
    #[validate(range(min = 0.0))]
    pub price: f64,

    /// Base64 encoded image, optionally as a `data:<mime>;base64,` URL
    pub image_data: String,
}

/// Configurable checks applied to product images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationRules {
    /// Accept an `imageData` that decodes to zero bytes
    pub allow_empty_image: bool,
    /// Largest accepted decoded image
    pub max_image_bytes: usize,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            allow_empty_image: false,
            max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ValidationRules {
    /// Largest create request body that can carry an image of `max_image_bytes`
    ///
    /// Base64 grows the image by 4/3; the rest covers the other fields.
    #[must_use]
    pub const fn max_request_body_bytes(&self) -> usize {
        self.max_image_bytes
            .div_ceil(3)
            .saturating_mul(4)
            .saturating_add(REQUEST_OVERHEAD_BYTES)
    }

    /// Checks a decoded image size against the rules
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailure::EmptyImage` or `ValidationFailure::ImageTooLarge`
    pub const fn check_image_size(&self, size: usize) -> Result<(), ValidationFailure> {
        if size == 0 && !self.allow_empty_image {
            return Err(ValidationFailure::EmptyImage);
        }
        if size > self.max_image_bytes {
            return Err(ValidationFailure::ImageTooLarge {
                size,
                limit: self.max_image_bytes,
            });
        }
        Ok(())
    }
}

fn validate_product(product: &Product) -> Result<(), ValidationFailure> {
    if let Err(errors) = product.validate() {
        return Err(if errors.field_errors().contains_key("name") {
            ValidationFailure::EmptyName
        } else {
            ValidationFailure::InvalidPrice
        });
    }

    if product.name.trim().is_empty() {
        return Err(ValidationFailure::EmptyName);
    }

    // NaN slips through range checks
    if !product.price.is_finite() {
        return Err(ValidationFailure::InvalidPrice);
    }

    Ok(())
}

/// Creates a product: stores its image, then writes its record.
///
/// # Errors
///
/// - `CatalogError::Validation` if the name is empty, the price is negative or the image
///   breaks `rules`; nothing is written
/// - `CatalogError::Decoding` if `image_data` is not valid base64; nothing is written
/// - `CatalogError::Storage` if either write fails. When the record write fails the image
///   stays in the object store as an orphan.
pub async fn create_product(
    products: &dyn ProductStore,
    images: &dyn ImageStore,
    rules: &ValidationRules,
    product: Product,
) -> CatalogResult<ProductRecord> {
    validate_product(&product)?;

    let id = Uuid::new_v4().to_string();
    let image_key = image_key_for(&id);

    let image = decode_image_data(&product.image_data)?;
    rules.check_image_size(image.bytes.len())?;

    images
        .put_image(&image_key, image.bytes, &image.content_type)
        .await?;

    let now = Utc::now();
    let record = ProductRecord {
        image_url: images.object_url(&image_key),
        id,
        name: product.name,
        description: product.description,
        price: product.price,
        created_at: now,
        updated_at: now,
    };

    if let Err(err) = products.put(&record).await {
        warn!(
            product_id = %record.id,
            image_key = %image_key,
            "Product record write failed, image left orphaned"
        );
        return Err(err.into());
    }

    info!(product_id = %record.id, "Created product");

    Ok(record)
}

/// Lists every product in the record store, in the store's scan order.
///
/// # Errors
///
/// Returns `CatalogError::Storage` if the record store cannot be read completely
pub async fn list_products(products: &dyn ProductStore) -> CatalogResult<Vec<ProductRecord>> {
    Ok(products.list_all().await?)
}

/// Deletes a product's image and record.
///
/// The image key is derived from the ID, so the record is never read first. Missing
/// objects and records count as deleted.
///
/// # Errors
///
/// - `CatalogError::Validation` if `id` is not a UUID
/// - `CatalogError::Storage` if either delete fails
pub async fn delete_product(
    products: &dyn ProductStore,
    images: &dyn ImageStore,
    id: &str,
) -> CatalogResult<()> {
    let id = Uuid::parse_str(id.trim())
        .map_err(|_| ValidationFailure::InvalidProductId)?
        .to_string();
    let image_key = image_key_for(&id);

    images.delete_image(&image_key).await?;
    products.delete(&id).await?;

    info!(product_id = %id, "Deleted product");

    Ok(())
}
