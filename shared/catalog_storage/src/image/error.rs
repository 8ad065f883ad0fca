//! Error types for image storage operations

use aws_sdk_s3::{
    error::SdkError,
    operation::{delete_object::DeleteObjectError, put_object::PutObjectError},
};
use thiserror::Error;

use crate::is_upstream_failure;

/// Result type for image storage operations
pub type ImageStorageResult<T> = Result<T, ImageStorageError>;

/// Errors that can occur during image storage operations
#[derive(Error, Debug)]
pub enum ImageStorageError {
    /// Failed to upload image to S3
    #[error("Failed to upload image to S3: {0:?}")]
    S3PutError(#[from] SdkError<PutObjectError>),

    /// Failed to delete image from S3
    #[error("Failed to delete image from S3: {0:?}")]
    S3DeleteError(#[from] SdkError<DeleteObjectError>),
}

impl ImageStorageError {
    /// Whether the failure came from S3 itself (5xx, timeout, network)
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        match self {
            Self::S3PutError(err) => is_upstream_failure(err),
            Self::S3DeleteError(err) => is_upstream_failure(err),
        }
    }
}
