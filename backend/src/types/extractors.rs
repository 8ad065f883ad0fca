//! Custom extractors for request parsing

use aide::operation::OperationInput;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use schemars::JsonSchema;

use crate::types::error::AppError;

/// JSON extractor that rejects with the API error envelope
///
/// Field validation is left to the catalog so direct callers get the same checks.
pub struct JsonPayload<T>(pub T);

impl<T, S> FromRequest<S> for JsonPayload<T>
where
    T: serde::de::DeserializeOwned + JsonSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| match err {
                JsonRejection::MissingJsonContentType(_) => AppError::new(
                    StatusCode::BAD_REQUEST,
                    "invalid_content_type",
                    "Missing Content-Type: application/json header",
                    false,
                ),
                rejection if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                    AppError::new(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        "payload_too_large",
                        "Request body exceeds the maximum allowed size",
                        false,
                    )
                }
                other => {
                    tracing::debug!("Rejected JSON payload: {other}");
                    AppError::new(
                        StatusCode::BAD_REQUEST,
                        "invalid_json",
                        "Invalid JSON payload",
                        false,
                    )
                }
            })?;

        Ok(Self(payload))
    }
}

impl<T> OperationInput for JsonPayload<T>
where
    T: JsonSchema,
{
    fn operation_input(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) {
        // Same request body as Json<T>
        Json::<T>::operation_input(ctx, operation);
    }
}
