//! Storage clients for the product catalog
//!
//! Product records live in a `DynamoDB` table and product images in an S3 bucket.
//! Both backends sit behind traits so the catalog handlers can run against the
//! in-memory implementations in tests (enable the `test-utils` feature).

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod image;
pub mod product;

use aws_sdk_dynamodb::error::SdkError;

/// Whether an SDK error was caused by the service or the network rather than the request.
///
/// Timeouts, dispatch failures, unparseable responses and 5xx responses count as upstream.
pub(crate) fn is_upstream_failure<E>(err: &SdkError<E>) -> bool {
    match err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            true
        }
        SdkError::ServiceError(service_err) => service_err.raw().status().as_u16() >= 500,
        _ => false,
    }
}
