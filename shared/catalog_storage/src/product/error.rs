//! Error types for product storage operations

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::{
    delete_item::DeleteItemError, put_item::PutItemError, scan::ScanError,
};
use thiserror::Error;

use crate::is_upstream_failure;

/// Result type alias for product storage operations
pub type ProductStorageResult<T> = Result<T, ProductStorageError>;

/// Storage error types for product operations
#[derive(Debug, Error)]
pub enum ProductStorageError {
    /// Failed to insert product into `DynamoDB`
    #[error("Failed to insert product into DynamoDB: {0:?}")]
    DynamoDbPutError(#[from] SdkError<PutItemError>),

    /// Failed to scan products from `DynamoDB`
    #[error("Failed to scan products from DynamoDB: {0:?}")]
    DynamoDbScanError(#[from] SdkError<ScanError>),

    /// Failed to delete product from `DynamoDB`
    #[error("Failed to delete product from DynamoDB: {0:?}")]
    DynamoDbDeleteError(#[from] SdkError<DeleteItemError>),

    /// A product with the same ID already exists
    #[error("Product already exists: {0}")]
    ProductExists(String),

    /// Failed to convert a product to or from a `DynamoDB` item
    #[error("Failed to parse product: {0}")]
    SerializationError(String),
}

impl ProductStorageError {
    /// Whether the failure came from `DynamoDB` itself (5xx, timeout, network)
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::DynamoDbPutError(err) => is_upstream_failure(err),
            Self::DynamoDbScanError(err) => is_upstream_failure(err),
            Self::DynamoDbDeleteError(err) => is_upstream_failure(err),
            Self::ProductExists(_) | Self::SerializationError(_) => false,
        }
    }
}

impl From<serde_dynamo::Error> for ProductStorageError {
    fn from(err: serde_dynamo::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}
