//! S3-based product image storage

mod error;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_s3::{error::SdkError, primitives::ByteStream, Client as S3Client};
use tracing::debug;

pub use error::{ImageStorageError, ImageStorageResult};

/// Prefix under which all product images are stored
pub const IMAGE_KEY_PREFIX: &str = "products/";

/// Maps a product ID to the object key of its image.
///
/// The mapping is pure so an image can be found (and deleted) from the product ID alone.
#[must_use]
pub fn image_key_for(product_id: &str) -> String {
    format!("{IMAGE_KEY_PREFIX}{product_id}")
}

/// Object store for product images, addressed by key
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Uploads an image, replacing any object stored under the same key.
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError::S3PutError` if the upload fails
    async fn put_image(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ImageStorageResult<()>;

    /// Deletes an image. Deleting a missing object succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ImageStorageError::S3DeleteError` if the delete fails
    async fn delete_image(&self, key: &str) -> ImageStorageResult<()>;

    /// Base URL that object keys are appended to
    fn base_url(&self) -> &str;

    /// Public URL of the object stored under `key`
    fn object_url(&self, key: &str) -> String {
        format!("{}/{key}", self.base_url().trim_end_matches('/'))
    }

    /// Recovers the object key from a URL produced by [`ImageStore::object_url`]
    fn key_from_url(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.base_url().trim_end_matches('/'))?
            .strip_prefix('/')
            .filter(|key| !key.is_empty())
            .map(ToString::to_string)
    }
}

/// Image storage client for S3 operations
pub struct ImageStorage {
    s3_client: Arc<S3Client>,
    bucket_name: String,
    base_url: String,
}

impl ImageStorage {
    /// Creates a new image storage client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket_name` - S3 bucket name for product images
    /// * `base_url` - Public URL prefix of the bucket, used to build image URLs
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String, base_url: String) -> Self {
        Self {
            s3_client,
            bucket_name,
            base_url,
        }
    }
}

#[async_trait]
impl ImageStore for ImageStorage {
    async fn put_image(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> ImageStorageResult<()> {
        let content_length = bytes.len();

        self.s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;

        debug!("Stored image {key} ({content_length} bytes, {content_type})");

        Ok(())
    }

    async fn delete_image(&self, key: &str) -> ImageStorageResult<()> {
        let result = self
            .s3_client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            // S3 answers 204 for missing keys, some compatible stores answer 404
            Err(SdkError::ServiceError(service_err))
                if service_err.raw().status().as_u16() == 404 =>
            {
                debug!("Image already absent: {key}");
                Ok(())
            }
            Err(e) => Err(ImageStorageError::from(e)),
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory image store with switchable failures

    use std::collections::HashMap;

    use async_trait::async_trait;
    use aws_sdk_s3::error::SdkError;
    use tokio::sync::RwLock;

    use super::{ImageStorageError, ImageStorageResult, ImageStore};

    /// Base URL used by [`InMemoryImageStore::new`]
    pub const MOCK_BASE_URL: &str = "https://product-images.s3.us-east-1.amazonaws.com";

    /// An image held by the in-memory store
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct StoredImage {
        /// Raw image bytes
        pub bytes: Vec<u8>,
        /// Content type the image was uploaded with
        pub content_type: String,
    }

    /// Image store backed by a map
    pub struct InMemoryImageStore {
        objects: RwLock<HashMap<String, StoredImage>>,
        base_url: String,
        fail_puts: bool,
        fail_deletes: bool,
    }

    impl Default for InMemoryImageStore {
        fn default() -> Self {
            Self::with_base_url(MOCK_BASE_URL)
        }
    }

    impl InMemoryImageStore {
        /// Creates an empty store using [`MOCK_BASE_URL`]
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates an empty store with a custom base URL
        #[must_use]
        pub fn with_base_url(base_url: impl Into<String>) -> Self {
            Self {
                objects: RwLock::new(HashMap::new()),
                base_url: base_url.into(),
                fail_puts: false,
                fail_deletes: false,
            }
        }

        /// Makes every `put_image` fail with a simulated timeout
        #[must_use]
        pub fn failing_puts(mut self) -> Self {
            self.fail_puts = true;
            self
        }

        /// Makes every `delete_image` fail with a simulated timeout
        #[must_use]
        pub fn failing_deletes(mut self) -> Self {
            self.fail_deletes = true;
            self
        }

        /// Stores an object directly, bypassing failure switches
        pub async fn insert(&self, key: &str, image: StoredImage) {
            self.objects.write().await.insert(key.to_string(), image);
        }

        /// Returns the object stored under `key`, if any
        pub async fn get(&self, key: &str) -> Option<StoredImage> {
            self.objects.read().await.get(key).cloned()
        }

        /// Number of stored objects
        pub async fn count(&self) -> usize {
            self.objects.read().await.len()
        }
    }

    #[async_trait]
    impl ImageStore for InMemoryImageStore {
        async fn put_image(
            &self,
            key: &str,
            bytes: Vec<u8>,
            content_type: &str,
        ) -> ImageStorageResult<()> {
            if self.fail_puts {
                return Err(ImageStorageError::S3PutError(SdkError::timeout_error(
                    "simulated S3 outage",
                )));
            }

            self.objects.write().await.insert(
                key.to_string(),
                StoredImage {
                    bytes,
                    content_type: content_type.to_string(),
                },
            );

            Ok(())
        }

        async fn delete_image(&self, key: &str) -> ImageStorageResult<()> {
            if self.fail_deletes {
                return Err(ImageStorageError::S3DeleteError(SdkError::timeout_error(
                    "simulated S3 outage",
                )));
            }

            self.objects.write().await.remove(key);

            Ok(())
        }

        fn base_url(&self) -> &str {
            &self.base_url
        }
    }
}
