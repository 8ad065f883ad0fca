//! Error types for catalog operations

use catalog_storage::{image::ImageStorageError, product::ProductStorageError};
use thiserror::Error;

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors returned by the catalog operations
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Input is missing or out of range; nothing was written
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationFailure),

    /// Image payload could not be decoded; nothing was written
    #[error("Invalid image data: {0}")]
    Decoding(String),

    /// A storage backend failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// The rule a rejected input broke
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Product name is empty
    #[error("name must not be empty")]
    EmptyName,

    /// Price is negative or not a number
    #[error("price must be a non-negative number")]
    InvalidPrice,

    /// Image payload decoded to zero bytes
    #[error("imageData must not be empty")]
    EmptyImage,

    /// Image payload exceeds the configured limit
    #[error("image is {size} bytes, the limit is {limit} bytes")]
    ImageTooLarge {
        /// Decoded size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Product ID path parameter is not a UUID
    #[error("product id must be a UUID")]
    InvalidProductId,
}

/// Failure of either storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Record store failure
    #[error(transparent)]
    Products(#[from] ProductStorageError),

    /// Object store failure
    #[error(transparent)]
    Images(#[from] ImageStorageError),
}

impl StorageError {
    /// Whether the backend itself was unavailable (5xx, timeout, network)
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::Products(err) => err.is_upstream(),
            Self::Images(err) => err.is_upstream(),
        }
    }
}

impl From<ProductStorageError> for CatalogError {
    fn from(err: ProductStorageError) -> Self {
        Self::Storage(err.into())
    }
}

impl From<ImageStorageError> for CatalogError {
    fn from(err: ImageStorageError) -> Self {
        Self::Storage(err.into())
    }
}
