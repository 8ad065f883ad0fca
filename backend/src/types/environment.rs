//! Environment configuration for different deployment stages

use std::env;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use tracing::Level;

use crate::catalog::ValidationRules;

/// `LocalStack` endpoint used in development
const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";

/// Upper bound on one AWS SDK operation, retries included
pub const AWS_OPERATION_TIMEOUT: Duration = Duration::from_secs(9);

/// Upper bound on a single AWS SDK attempt
const AWS_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(3);

/// Upper bound on handling one HTTP request
///
/// Creating a product runs two SDK operations back to back, so this must exceed twice
/// [`AWS_OPERATION_TIMEOUT`].
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Application environment configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment (uses `LocalStack`)
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Returns the `DynamoDB` table name holding product records
    ///
    /// # Panics
    ///
    /// Panics if the `PRODUCTS_TABLE_NAME` environment variable is not set outside development
    #[must_use]
    pub fn products_table_name(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("PRODUCTS_TABLE_NAME")
                .expect("PRODUCTS_TABLE_NAME environment variable is not set"),
            Self::Development => {
                env::var("PRODUCTS_TABLE_NAME").unwrap_or_else(|_| "products".to_string())
            }
        }
    }

    /// Returns the S3 bucket name holding product images
    ///
    /// # Panics
    ///
    /// Panics if `PRODUCT_IMAGES_BUCKET_NAME` is not set outside development
    #[must_use]
    pub fn product_images_bucket(&self) -> String {
        match self {
            Self::Production | Self::Staging => env::var("PRODUCT_IMAGES_BUCKET_NAME")
                .expect("PRODUCT_IMAGES_BUCKET_NAME environment variable is not set"),
            Self::Development => env::var("PRODUCT_IMAGES_BUCKET_NAME")
                .unwrap_or_else(|_| "product-images".to_string()),
        }
    }

    /// AWS region, used to build public image URLs
    #[must_use]
    pub fn aws_region(&self) -> String {
        env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string())
    }

    /// Public URL prefix of the images bucket
    ///
    /// `IMAGE_BASE_URL` overrides the default, e.g. to serve images through a CDN.
    #[must_use]
    pub fn image_base_url(&self) -> String {
        if let Ok(base_url) = env::var("IMAGE_BASE_URL") {
            return base_url.trim_end_matches('/').to_string();
        }

        let bucket = self.product_images_bucket();
        match self {
            Self::Production | Self::Staging => {
                format!("https://{bucket}.s3.{}.amazonaws.com", self.aws_region())
            }
            Self::Development => format!("{LOCALSTACK_ENDPOINT}/{bucket}"),
        }
    }

    /// Validation rules applied to new products
    ///
    /// `ALLOW_EMPTY_IMAGE_DATA` (`true`/`false`) and `MAX_IMAGE_BYTES` override the defaults.
    /// Unparseable values fall back to the defaults.
    #[must_use]
    pub fn validation_rules(&self) -> ValidationRules {
        let defaults = ValidationRules::default();

        let allow_empty_image = env::var("ALLOW_EMPTY_IMAGE_DATA")
            .ok()
            .and_then(|val| val.trim().parse::<bool>().ok())
            .unwrap_or(defaults.allow_empty_image);

        let max_image_bytes = env::var("MAX_IMAGE_BYTES")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .unwrap_or(defaults.max_image_bytes);

        ValidationRules {
            allow_empty_image,
            max_image_bytes,
        }
    }

    /// Whether to show API docs
    #[must_use]
    pub const fn show_api_docs(&self) -> bool {
        matches!(self, Self::Development | Self::Staging)
    }

    /// Returns the endpoint URL to use for AWS services
    #[must_use]
    pub const fn override_aws_endpoint_url(&self) -> Option<&str> {
        match self {
            // Regular AWS endpoints for production and staging
            Self::Production | Self::Staging => None,
            Self::Development => Some(LOCALSTACK_ENDPOINT),
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(AWS_OPERATION_TIMEOUT)
            .operation_attempt_timeout(AWS_ATTEMPT_TIMEOUT)
            .build();

        let mut config_builder = aws_config::load_defaults(BehaviorVersion::latest())
            .await
            .to_builder()
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let Some(endpoint_url) = self.override_aws_endpoint_url() {
            config_builder = config_builder.endpoint_url(endpoint_url);
        }

        config_builder.build()
    }

    /// AWS S3 service configuration
    pub async fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let aws_config = self.aws_config().await;
        let s3_config: aws_sdk_s3::Config = (&aws_config).into();
        let mut builder = s3_config.to_builder();

        // Override "force path style" to true for compatibility with LocalStack
        // https://github.com/awslabs/aws-sdk-rust/discussions/874
        if matches!(self, Self::Development) {
            builder.set_force_path_style(Some(true));
        }

        builder.build()
    }

    /// Tracing level, overridable with `TRACING_LEVEL`
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }
}
