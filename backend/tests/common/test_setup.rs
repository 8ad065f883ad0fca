use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use catalog_backend::{catalog::ValidationRules, server, types::Environment};
use catalog_storage::{
    image::{mock::InMemoryImageStore, ImageStore},
    product::{mock::InMemoryProductStore, ProductStore},
};
use tower::ServiceExt;

/// Setup test environment variables with all the required configuration
pub fn setup_test_env() {
    // Load test environment variables
    dotenvy::from_path(".env.example").ok();

    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Router wired to in-memory stores
pub struct TestContext {
    pub router: Router,
    pub product_store: Arc<InMemoryProductStore>,
    pub image_store: Arc<InMemoryImageStore>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_stores(InMemoryProductStore::new(), InMemoryImageStore::new())
    }

    pub fn with_stores(
        product_store: InMemoryProductStore,
        image_store: InMemoryImageStore,
    ) -> Self {
        Self::with_rules(product_store, image_store, ValidationRules::default())
    }

    pub fn with_rules(
        product_store: InMemoryProductStore,
        image_store: InMemoryImageStore,
        rules: ValidationRules,
    ) -> Self {
        setup_test_env();

        let product_store = Arc::new(product_store);
        let image_store = Arc::new(image_store);

        let router = server::app(
            Environment::Development,
            product_store.clone() as Arc<dyn ProductStore>,
            image_store.clone() as Arc<dyn ImageStore>,
            rules,
        );

        Self {
            router,
            product_store,
            image_store,
        }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json")
            .body(Body::from(payload.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method("POST");
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let request = builder.body(Body::from(body.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_request(
        &self,
        request: Request<Body>,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_get_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("GET")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_delete_request(
        &self,
        route: &str,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let request = Request::builder()
            .uri(route)
            .method("DELETE")
            .body(Body::empty())?;
        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}
