use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, Extension, Router};
use catalog_storage::{image::ImageStore, product::ProductStore};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::catalog::ValidationRules;
use crate::routes;
use crate::types::{Environment, REQUEST_TIMEOUT};

/// Builds the application router with its storage backends and middleware
///
/// The request body limit follows `validation_rules`, so the largest accepted image
/// always fits in a create request.
pub fn app(
    environment: Environment,
    product_store: Arc<dyn ProductStore>,
    image_store: Arc<dyn ImageStore>,
    validation_rules: ValidationRules,
) -> Router {
    let mut openapi = routes::openapi();

    routes::handler()
        .finish_api(&mut openapi)
        .layer(Extension(openapi))
        .layer(Extension(environment))
        .layer(Extension(product_store))
        .layer(Extension(image_store))
        .layer(Extension(validation_rules))
        .layer(DefaultBodyLimit::max(
            validation_rules.max_request_body_bytes(),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CorsLayer::permissive())
}

/// Starts the server with the given environment and storage backends
///
/// # Errors
///
/// Returns an error if the server fails to start or bind to the port
pub async fn start(
    environment: Environment,
    product_store: Arc<dyn ProductStore>,
    image_store: Arc<dyn ImageStore>,
) -> anyhow::Result<()> {
    let validation_rules = environment.validation_rules();
    let router = app(environment, product_store, image_store, validation_rules);

    let addr = std::net::SocketAddr::from((
        [0, 0, 0, 0],
        std::env::var("PORT").map_or(Ok(8001), |p| p.parse())?,
    ));

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🔄 Product Catalog started on http://{addr}");

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(anyhow::Error::from)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
