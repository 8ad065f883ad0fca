//! Integration tests for the `DynamoDB` product store.
//!
//! These need LocalStack on `localhost:4566`; run with `cargo test -- --ignored`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use catalog_storage::product::{
    ProductAttribute, ProductRecord, ProductStorage, ProductStorageError, ProductStore,
};
use chrono::Utc;
use tokio::time::sleep;
use uuid::Uuid;

/// Test context that automatically cleans up the table on drop
struct TestContext {
    storage: ProductStorage,
    table_name: String,
    dynamodb_client: Arc<DynamoDbClient>,
}

impl Drop for TestContext {
    fn drop(&mut self) {
        let client = self.dynamodb_client.clone();
        let table = self.table_name.clone();

        let handle = tokio::runtime::Handle::try_current();
        if let Ok(handle) = handle {
            handle.spawn(async move {
                let _ = client.delete_table().table_name(&table).send().await;
            });
        }
    }
}

/// Creates a test setup with a unique table
async fn setup_test() -> TestContext {
    let table_name = format!("test-products-{}", Uuid::new_v4());
    let config = common::localstack_config().await;
    let dynamodb_client = Arc::new(DynamoDbClient::new(&config));

    dynamodb_client
        .create_table()
        .table_name(&table_name)
        .billing_mode(BillingMode::PayPerRequest)
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(ProductAttribute::Id.to_string())
                .key_type(KeyType::Hash)
                .build()
                .expect("Failed to build key schema"),
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(ProductAttribute::Id.to_string())
                .attribute_type(ScalarAttributeType::S)
                .build()
                .expect("Failed to build attribute definition"),
        )
        .send()
        .await
        .expect("Failed to create test table");

    // Wait for table to be ready
    sleep(Duration::from_millis(100)).await;

    let storage = ProductStorage::new(dynamodb_client.clone(), table_name.clone());

    TestContext {
        storage,
        table_name,
        dynamodb_client,
    }
}

fn create_test_record(name: &str) -> ProductRecord {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    ProductRecord {
        image_url: format!("http://localhost:4566/product-images/products/{id}"),
        id,
        name: name.to_string(),
        description: format!("Description of {name}"),
        price: 19.99,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_put_and_list_product() {
    let context = setup_test().await;
    let record = create_test_record("Desk lamp");

    context.storage.put(&record).await.expect("Failed to put product");

    let products = context.storage.list_all().await.expect("Failed to list");
    pretty_assertions::assert_eq!(products, vec![record]);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_list_empty_table() {
    let context = setup_test().await;

    let products = context.storage.list_all().await.expect("Failed to list");

    assert!(products.is_empty());
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_put_duplicate_id_is_rejected() {
    let context = setup_test().await;
    let record = create_test_record("Desk lamp");
    context.storage.put(&record).await.expect("Failed to put product");

    let mut duplicate = create_test_record("Other lamp");
    duplicate.id.clone_from(&record.id);
    let result = context.storage.put(&duplicate).await;

    assert!(matches!(result, Err(ProductStorageError::ProductExists(_))));
    let products = context.storage.list_all().await.expect("Failed to list");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Desk lamp");
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_list_follows_pagination() {
    let context = setup_test().await;

    // Large descriptions push the table over the 1 MB scan page limit
    let padding = "x".repeat(300 * 1024);
    let mut ids = Vec::new();
    for i in 0..5 {
        let mut record = create_test_record(&format!("Product {i}"));
        record.description.clone_from(&padding);
        ids.push(record.id.clone());
        context.storage.put(&record).await.expect("Failed to put product");
    }

    let products = context.storage.list_all().await.expect("Failed to list");

    let mut listed: Vec<String> = products.into_iter().map(|p| p.id).collect();
    listed.sort();
    ids.sort();
    assert_eq!(listed, ids);
}

#[tokio::test]
#[ignore = "requires LocalStack"]
async fn test_delete_is_idempotent() {
    let context = setup_test().await;
    let record = create_test_record("Desk lamp");
    context.storage.put(&record).await.expect("Failed to put product");

    context.storage.delete(&record.id).await.expect("First delete failed");
    context.storage.delete(&record.id).await.expect("Second delete failed");
    context
        .storage
        .delete(&Uuid::new_v4().to_string())
        .await
        .expect("Delete of unknown id failed");

    let products = context.storage.list_all().await.expect("Failed to list");
    assert!(products.is_empty());
}
