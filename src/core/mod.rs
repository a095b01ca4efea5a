//! Core foundational modules: configuration, errors, identifiers and the
//! shared domain model.

/// Configuration loading and validation
pub mod config;
/// System-wide error types
pub mod error;
/// Identifier newtypes for tenants, users and nodes
pub mod ids;
/// Shared domain entities
pub mod model;

pub use config::Config;
pub use error::{Error, Result};
pub use ids::{NodeId, TenantId, UserId};
pub use model::{Node, NodeKind, Tenant, TenantKind, User, UserKind};
