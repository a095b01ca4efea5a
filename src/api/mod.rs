//! HTTP delivery surface for the request/response contract.
//!
//! The service logic never depends on this module; it only builds typed
//! requests from HTTP input and serializes the typed responses.

/// Request handlers
pub mod handlers;
/// Router construction and server startup
pub mod server;

pub use server::{create_app, start_server};
