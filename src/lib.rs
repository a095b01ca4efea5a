//! Arbor - a multi-tenant hierarchical node-tree service.
//!
//! Arbor maintains a namespace of folder/item nodes organized per isolated
//! tenant, behind a typed request/response façade with explicit error codes.
//! Tenants own their users and node trees; nothing crosses the tenant
//! boundary.
#![warn(missing_docs)]

// Core foundational modules
pub mod core;

// Main functional modules
pub mod api;
pub mod service;
pub mod storage;

// Re-export commonly used items for convenience
pub use crate::core::{Config, Error, Result};
pub use service::NodeTreeService;
pub use storage::Store;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize tracing according to the logging configuration.
pub fn init_logging(config: &core::config::LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.level.clone()));

    if config.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!("Initializing {} v{}", NAME, VERSION);
}
