use std::sync::Arc;

use aws_sdk_dynamodb::Client as DynamoDbClient;
use aws_sdk_s3::Client as S3Client;
use catalog_backend::{server, types::Environment};
use catalog_storage::{image::ImageStorage, product::ProductStorage};
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let environment = Environment::from_env();

    // Use JSON format for staging/production, regular format for development
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(environment.tracing_level()).into())
        .from_env_lossy();
    match environment {
        Environment::Production | Environment::Staging => {
            fmt().json().with_env_filter(env_filter).init();
        }
        Environment::Development => {
            fmt().with_env_filter(env_filter).init();
        }
    }

    let dynamodb_client = Arc::new(DynamoDbClient::new(&environment.aws_config().await));
    let product_store = Arc::new(ProductStorage::new(
        dynamodb_client,
        environment.products_table_name(),
    ));

    let s3_client = Arc::new(S3Client::from_conf(environment.s3_client_config().await));
    let image_store = Arc::new(ImageStorage::new(
        s3_client,
        environment.product_images_bucket(),
        environment.image_base_url(),
    ));

    tracing::info!(
        products_table = %environment.products_table_name(),
        images_bucket = %environment.product_images_bucket(),
        "Storage configured"
    );

    server::start(environment, product_store, image_store).await
}
