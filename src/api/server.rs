//! HTTP server wiring for the Arbor API.

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use crate::service::SharedService;

/// Creates the application router with all routes and middleware.
pub fn create_app(service: SharedService) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        // Tenant routes
        .route("/api/v1/tenants", post(handlers::create_tenant))
        .route("/api/v1/tenants", get(handlers::list_tenants))
        .route("/api/v1/tenants/:tenant_id", get(handlers::get_tenant))
        // User routes
        .route(
            "/api/v1/tenants/:tenant_id/users",
            post(handlers::create_user),
        )
        .route(
            "/api/v1/tenants/:tenant_id/users",
            get(handlers::list_users),
        )
        .route("/api/v1/users/:user_id", get(handlers::get_user))
        // Node routes
        .route(
            "/api/v1/tenants/:tenant_id/nodes",
            post(handlers::create_node),
        )
        .route(
            "/api/v1/tenants/:tenant_id/nodes",
            get(handlers::get_nodes),
        )
        .route(
            "/api/v1/tenants/:tenant_id/nodes/:node_id",
            get(handlers::get_node),
        )
        // System routes
        .route("/api/v1/health", get(handlers::health_check))
        .route("/api/v1/info", get(handlers::system_info))
        // Apply middleware
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        // Add the request service as shared state
        .with_state(service)
}

/// Start the HTTP server and serve until `shutdown` resolves, then drain
/// in-flight connections before returning.
pub async fn start_server(
    addr: SocketAddr,
    service: SharedService,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::core::Result<()> {
    tracing::info!("Starting Arbor API server on {}", addr);

    let app = create_app(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Health check available at http://{}/api/v1/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| crate::core::Error::internal(format!("HTTP server failed: {}", e)))?;

    Ok(())
}
