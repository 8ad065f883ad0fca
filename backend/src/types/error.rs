//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::catalog::{CatalogError, ValidationFailure};

/// API error response envelope
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Whether the client should retry the request
    pub allow_retry: bool,
    /// Error details
    error: ErrorBody,
}

/// Error body containing code and message
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    /// Machine-readable error code
    pub code: &'static str,
    /// Human-readable error message
    pub message: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(
        status: StatusCode,
        code: &'static str,
        msg: &'static str,
        retry: bool,
    ) -> Self {
        Self {
            status,
            inner: ApiErrorResponse {
                allow_retry: retry,
                error: ErrorBody { code, message: msg },
            },
        }
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.inner.error.code
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!(
                "Client error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            500..=599 => tracing::error!(
                "Server error: {} - {}",
                self.inner.error.code,
                self.inner.error.message
            ),
            _ => {}
        }

        (self.status, Json(self.inner)).into_response()
    }
}

impl From<ValidationFailure> for AppError {
    fn from(failure: ValidationFailure) -> Self {
        let message = match failure {
            ValidationFailure::EmptyName => "Product name must not be empty",
            ValidationFailure::InvalidPrice => "Product price must be a non-negative number",
            ValidationFailure::EmptyImage => "Image data must not be empty",
            ValidationFailure::ImageTooLarge { .. } => "Image exceeds the maximum allowed size",
            ValidationFailure::InvalidProductId => "Product ID must be a UUID",
        };

        Self::new(StatusCode::BAD_REQUEST, "validation_error", message, false)
    }
}

/// Convert catalog errors to application errors
impl From<CatalogError> for AppError {
    #[allow(clippy::cognitive_complexity)]
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(failure) => {
                tracing::debug!("Validation failed: {failure}");
                failure.into()
            }
            CatalogError::Decoding(msg) => {
                tracing::debug!("Image decoding failed: {msg}");
                Self::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_image_data",
                    "Image data is not valid base64",
                    false,
                )
            }
            CatalogError::Storage(storage_err) if storage_err.is_upstream() => {
                tracing::error!("Storage upstream error: {storage_err}");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "upstream_error",
                    "Storage service temporarily unavailable",
                    true,
                )
            }
            CatalogError::Storage(storage_err) => {
                tracing::error!("Storage error: {storage_err}");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                    true,
                )
            }
        }
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}
