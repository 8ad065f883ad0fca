mod docs;
mod health;
pub mod products;

use aide::axum::{
    routing::{delete, get, post},
    ApiRouter,
};

pub use docs::openapi;

/// Creates the router with all handler routes
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route(
            "/products",
            post(products::create_product).get(products::list_products),
        )
        .api_route("/products/{id}", delete(products::delete_product))
}
