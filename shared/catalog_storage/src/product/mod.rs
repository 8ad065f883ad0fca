//! Product record storage module for `DynamoDB` operations

mod error;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;
use chrono::{DateTime, Utc};
pub use error::{ProductStorageError, ProductStorageResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_dynamo::{from_items, to_item};
use strum::Display;
use tracing::debug;

/// Product record as stored in the products table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    /// Primary key - unique product ID (UUID v4)
    pub id: String,
    /// Display name, never blank
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Non-negative price
    pub price: f64,
    /// Public URL of the product image in the images bucket
    pub image_url: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

/// `DynamoDB` attribute names for the products table
#[derive(Debug, Display)]
#[strum(serialize_all = "camelCase")]
pub enum ProductAttribute {
    /// Primary key - unique product ID
    Id,
    /// Product name
    Name,
    /// Product description
    Description,
    /// Product price
    Price,
    /// Image URL
    ImageUrl,
    /// Creation timestamp
    CreatedAt,
    /// Last modification timestamp
    UpdatedAt,
}

/// `DynamoDB` item as returned by a scan
pub type Item = HashMap<String, AttributeValue>;

/// One page of a table scan
pub struct ScanPage {
    /// Items on this page
    pub items: Vec<Item>,
    /// Key to resume from, `None` (or empty) on the last page
    pub last_evaluated_key: Option<Item>,
}

/// Collects every page produced by `fetch_page` into one list.
///
/// `fetch_page` receives the key to resume from, `None` for the first page. The first
/// failing page fails the whole scan and records gathered so far are dropped.
///
/// # Errors
///
/// Returns the first `ProductStorageError` raised by `fetch_page` or by item decoding
pub async fn scan_pages<F, Fut>(mut fetch_page: F) -> ProductStorageResult<Vec<ProductRecord>>
where
    F: FnMut(Option<Item>) -> Fut,
    Fut: Future<Output = ProductStorageResult<ScanPage>>,
{
    let mut records = Vec::new();
    let mut exclusive_start_key = None;
    let mut pages = 0_u32;

    loop {
        let page = fetch_page(exclusive_start_key.take()).await?;
        pages += 1;

        records.extend(from_items::<_, ProductRecord>(page.items)?);

        match page.last_evaluated_key {
            Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
            _ => break,
        }
    }

    debug!("Scanned {} products in {} page(s)", records.len(), pages);

    Ok(records)
}

/// Record store for products, keyed by product ID
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Writes a new product record.
    ///
    /// # Errors
    ///
    /// Returns `ProductStorageError::ProductExists` if a record with the same ID exists,
    /// or another `ProductStorageError` if the write fails
    async fn put(&self, record: &ProductRecord) -> ProductStorageResult<()>;

    /// Reads every product record, following pagination until the table is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ProductStorageError` if any page fails; no partial result is returned
    async fn list_all(&self) -> ProductStorageResult<Vec<ProductRecord>>;

    /// Deletes a product record. Deleting a missing record succeeds.
    ///
    /// # Errors
    ///
    /// Returns `ProductStorageError` if the delete fails
    async fn delete(&self, id: &str) -> ProductStorageResult<()>;
}

/// `DynamoDB` backed product store
pub struct ProductStorage {
    dynamodb_client: Arc<DynamoDbClient>,
    table_name: String,
}

impl ProductStorage {
    /// Creates a new storage instance
    ///
    /// # Arguments
    ///
    /// * `dynamodb_client` - Pre-configured `DynamoDB` client
    /// * `table_name` - `DynamoDB` table name for products
    #[must_use]
    pub const fn new(dynamodb_client: Arc<DynamoDbClient>, table_name: String) -> Self {
        Self {
            dynamodb_client,
            table_name,
        }
    }
}

#[async_trait]
impl ProductStore for ProductStorage {
    async fn put(&self, record: &ProductRecord) -> ProductStorageResult<()> {
        let item = to_item(record)?;

        self.dynamodb_client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .condition_expression("attribute_not_exists(#pk)")
            .expression_attribute_names("#pk", ProductAttribute::Id.to_string())
            .send()
            .await
            .map_err(|err| match err {
                SdkError::ServiceError(ref svc)
                    if svc.err().is_conditional_check_failed_exception() =>
                {
                    ProductStorageError::ProductExists(record.id.clone())
                }
                err => ProductStorageError::from(err),
            })?;

        Ok(())
    }

    async fn list_all(&self) -> ProductStorageResult<Vec<ProductRecord>> {
        scan_pages(move |exclusive_start_key| async move {
            let output = self
                .dynamodb_client
                .scan()
                .table_name(&self.table_name)
                .set_exclusive_start_key(exclusive_start_key)
                .send()
                .await?;

            Ok(ScanPage {
                items: output.items.unwrap_or_default(),
                last_evaluated_key: output.last_evaluated_key,
            })
        })
        .await
    }

    async fn delete(&self, id: &str) -> ProductStorageResult<()> {
        self.dynamodb_client
            .delete_item()
            .table_name(&self.table_name)
            .key(
                ProductAttribute::Id.to_string(),
                AttributeValue::S(id.to_string()),
            )
            .send()
            .await?;

        Ok(())
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! In-memory product store with switchable failures

    use std::collections::BTreeMap;
    use std::ops::Bound;

    use async_trait::async_trait;
    use aws_sdk_dynamodb::error::SdkError;
    use aws_sdk_dynamodb::types::AttributeValue;
    use serde_dynamo::to_item;
    use tokio::sync::RwLock;

    use super::{
        scan_pages, Item, ProductAttribute, ProductRecord, ProductStorageError,
        ProductStorageResult, ProductStore, ScanPage,
    };

    /// Product store backed by a map, scanned in ID order
    #[derive(Default)]
    pub struct InMemoryProductStore {
        records: RwLock<BTreeMap<String, ProductRecord>>,
        page_size: Option<usize>,
        fail_scan_at_page: Option<usize>,
        fail_puts: bool,
        fail_deletes: bool,
    }

    impl InMemoryProductStore {
        /// Creates an empty store where every operation succeeds
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every `put` fail with a simulated timeout
        #[must_use]
        pub fn failing_puts(mut self) -> Self {
            self.fail_puts = true;
            self
        }

        /// Makes every `list_all` fail with a simulated timeout
        #[must_use]
        pub fn failing_scans(self) -> Self {
            self.failing_scan_at_page(1)
        }

        /// Makes the scan fail with a simulated timeout when it requests page `page`
        /// (1-based), after the earlier pages succeeded
        #[must_use]
        pub fn failing_scan_at_page(mut self, page: usize) -> Self {
            self.fail_scan_at_page = Some(page);
            self
        }

        /// Splits scans into pages of at most `page_size` records
        #[must_use]
        pub fn with_page_size(mut self, page_size: usize) -> Self {
            self.page_size = Some(page_size.max(1));
            self
        }

        /// Makes every `delete` fail with a simulated timeout
        #[must_use]
        pub fn failing_deletes(mut self) -> Self {
            self.fail_deletes = true;
            self
        }

        /// Inserts a record directly, bypassing failure switches
        pub async fn insert(&self, record: ProductRecord) {
            self.records.write().await.insert(record.id.clone(), record);
        }

        /// Returns the record with the given ID, if any
        pub async fn get(&self, id: &str) -> Option<ProductRecord> {
            self.records.read().await.get(id).cloned()
        }

        /// Number of stored records
        pub async fn count(&self) -> usize {
            self.records.read().await.len()
        }
    }

    /// Builds the page that follows `start_key`, in ID order
    fn page_after(
        records: &BTreeMap<String, ProductRecord>,
        start_key: Option<&Item>,
        page_size: usize,
    ) -> ProductStorageResult<ScanPage> {
        let lower = start_key
            .and_then(|key| key.get(&ProductAttribute::Id.to_string()))
            .and_then(|id| id.as_s().ok())
            .map_or(Bound::Unbounded, |id| Bound::Excluded(id.clone()));

        let mut remaining = records.range((lower, Bound::Unbounded)).map(|(_, r)| r);
        let page = remaining.by_ref().take(page_size).collect::<Vec<_>>();

        let last_evaluated_key = match (page.last(), remaining.next()) {
            (Some(last), Some(_)) => Some(Item::from([(
                ProductAttribute::Id.to_string(),
                AttributeValue::S(last.id.clone()),
            )])),
            _ => None,
        };

        let items = page
            .into_iter()
            .map(to_item)
            .collect::<Result<Vec<Item>, _>>()?;

        Ok(ScanPage {
            items,
            last_evaluated_key,
        })
    }

    #[async_trait]
    impl ProductStore for InMemoryProductStore {
        async fn put(&self, record: &ProductRecord) -> ProductStorageResult<()> {
            if self.fail_puts {
                return Err(ProductStorageError::DynamoDbPutError(
                    SdkError::timeout_error("simulated DynamoDB outage"),
                ));
            }

            let mut records = self.records.write().await;
            if records.contains_key(&record.id) {
                return Err(ProductStorageError::ProductExists(record.id.clone()));
            }
            records.insert(record.id.clone(), record.clone());

            Ok(())
        }

        async fn list_all(&self) -> ProductStorageResult<Vec<ProductRecord>> {
            let records = self.records.read().await;
            let page_size = self.page_size.unwrap_or(usize::MAX);
            let mut requested = 0;

            scan_pages(|start_key| {
                requested += 1;
                let page = if self.fail_scan_at_page == Some(requested) {
                    Err(ProductStorageError::DynamoDbScanError(
                        SdkError::timeout_error("simulated DynamoDB outage"),
                    ))
                } else {
                    page_after(&records, start_key.as_ref(), page_size)
                };
                std::future::ready(page)
            })
            .await
        }

        async fn delete(&self, id: &str) -> ProductStorageResult<()> {
            if self.fail_deletes {
                return Err(ProductStorageError::DynamoDbDeleteError(
                    SdkError::timeout_error("simulated DynamoDB outage"),
                ));
            }

            self.records.write().await.remove(id);

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::InMemoryProductStore;
    use super::*;

    fn sample_record(id: &str) -> ProductRecord {
        let now = Utc::now();
        ProductRecord {
            id: id.to_string(),
            name: "Espresso cup".to_string(),
            description: "Porcelain, 90ml".to_string(),
            price: 12.5,
            image_url: format!("https://bucket.s3.us-east-1.amazonaws.com/products/{id}"),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_product_record_uses_camel_case_fields() {
        let record = sample_record("test-id");

        let json = serde_json::to_value(&record).unwrap();

        assert!(json.get("imageUrl").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("image_url").is_none());
    }

    #[test]
    fn test_product_record_dynamo_item_round_trip() {
        let record = sample_record("test-id");

        let item: std::collections::HashMap<String, AttributeValue> = to_item(&record).unwrap();
        assert_eq!(
            item.get(&ProductAttribute::Id.to_string()),
            Some(&AttributeValue::S("test-id".to_string()))
        );
        assert!(item.contains_key(&ProductAttribute::ImageUrl.to_string()));

        let parsed: ProductRecord = serde_dynamo::from_item(item).unwrap();
        pretty_assertions::assert_eq!(parsed, record);
    }

    #[tokio::test]
    async fn test_in_memory_store_rejects_duplicate_ids() {
        let store = InMemoryProductStore::new();
        let record = sample_record("dup");

        store.put(&record).await.unwrap();
        let err = store.put(&record).await.unwrap_err();

        assert!(matches!(err, ProductStorageError::ProductExists(id) if id == "dup"));
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_in_memory_delete_is_idempotent() {
        let store = InMemoryProductStore::new();
        store.insert(sample_record("a")).await;

        store.delete("a").await.unwrap();
        store.delete("a").await.unwrap();
        store.delete("never-existed").await.unwrap();

        assert_eq!(store.count().await, 0);
    }

    #[tokio::test]
    async fn test_simulated_failures_are_upstream() {
        let store = InMemoryProductStore::new().failing_scans();

        let err = store.list_all().await.unwrap_err();

        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_paged_scan_collects_every_page() {
        let store = InMemoryProductStore::new().with_page_size(2);
        for id in ["a", "b", "c", "d", "e"] {
            store.insert(sample_record(id)).await;
        }

        let records = store.list_all().await.unwrap();

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        pretty_assertions::assert_eq!(ids, ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_failure_on_later_page_fails_whole_scan() {
        let store = InMemoryProductStore::new()
            .with_page_size(2)
            .failing_scan_at_page(2);
        for id in ["a", "b", "c", "d", "e"] {
            store.insert(sample_record(id)).await;
        }

        let err = store.list_all().await.unwrap_err();

        assert!(matches!(err, ProductStorageError::DynamoDbScanError(_)));
        assert!(err.is_upstream());
    }

    #[tokio::test]
    async fn test_scan_pages_stops_on_empty_last_key() {
        let mut calls = 0;

        let records = scan_pages(|start_key| {
            calls += 1;
            assert!(start_key.is_none());
            std::future::ready(Ok(ScanPage {
                items: vec![to_item(sample_record("only")).unwrap()],
                last_evaluated_key: Some(Item::new()),
            }))
        })
        .await
        .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn test_scan_pages_drops_partial_results_on_error() {
        let mut calls = 0;

        let result = scan_pages(|_| {
            calls += 1;
            let page = if calls == 1 {
                Ok(ScanPage {
                    items: vec![to_item(sample_record("first")).unwrap()],
                    last_evaluated_key: Some(Item::from([(
                        ProductAttribute::Id.to_string(),
                        AttributeValue::S("first".to_string()),
                    )])),
                })
            } else {
                Err(ProductStorageError::SerializationError("bad page".to_string()))
            };
            std::future::ready(page)
        })
        .await;

        assert_eq!(calls, 2);
        assert!(matches!(
            result,
            Err(ProductStorageError::SerializationError(msg)) if msg == "bad page"
        ));
    }
}
