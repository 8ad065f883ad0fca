use std::sync::Arc;

use aide::axum::IntoApiResponse;
use axum::{Extension, Json};
use catalog_storage::image::ImageStore;
use schemars::JsonSchema;
use serde::Serialize;

use crate::catalog::ValidationRules;

#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    status: String,
    /// Current version of the application
    semver: String,
    /// Commit hash of the current build (if available)
    rev: Option<String>,
    /// Prefix of every product `imageUrl`
    images_base_url: String,
    /// Largest accepted decoded image, in bytes
    max_image_bytes: usize,
    /// Whether products may be created with an empty image
    allow_empty_image: bool,
}

/// Health check endpoint
///
/// Returns the service version and the image settings new products are checked against.
/// Storage backends are not contacted.
pub async fn handler(
    Extension(image_store): Extension<Arc<dyn ImageStore>>,
    Extension(rules): Extension<ValidationRules>,
) -> impl IntoApiResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        semver: env!("CARGO_PKG_VERSION").to_string(),
        rev: option_env!("GIT_REV").map(ToString::to_string),
        images_base_url: image_store.base_url().to_string(),
        max_image_bytes: rules.max_image_bytes,
        allow_empty_image: rules.allow_empty_image,
    })
}
