//! HTTP request handlers for the Arbor API.
//!
//! Handlers are thin: parse the path/query/body into a typed request, call
//! the service, serialize the typed [`Status`] envelope back. All outcome
//! mapping lives in the service; here only the HTTP status code is derived
//! from the envelope's error code.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::core::ids::{NodeId, TenantId, UserId};
use crate::core::model::NodeKind;
use crate::service::wire::{
    CreateNodeReq, CreateTenantReq, CreateUserReq, ErrorCode, GetNodesReq, NodeFilterSpec,
    NodeTemplate, Status, UserTemplate,
};
use crate::service::SharedService;

/// Map an envelope error code onto the HTTP status for a read.
fn http_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Ok => StatusCode::OK,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Map an envelope error code onto the HTTP status for a create.
fn http_status_created(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Ok => StatusCode::CREATED,
        other => http_status(other),
    }
}

/// Envelope for an identifier that failed to parse.
fn bad_id<T>(kind: &str, raw: &str) -> (StatusCode, Json<Status<T>>) {
    (
        StatusCode::BAD_REQUEST,
        Json(Status {
            error: ErrorCode::Validation,
            message: Some(format!("invalid {} identifier: {:?}", kind, raw)),
            payload: None,
        }),
    )
}

// Tenant handlers

/// `POST /api/v1/tenants`
pub async fn create_tenant(
    State(service): State<SharedService>,
    Json(req): Json<CreateTenantReq>,
) -> (StatusCode, Json<Status<crate::service::wire::TenantCreated>>) {
    let status = service.create_tenant(&req);
    (http_status_created(status.error), Json(status))
}

/// `GET /api/v1/tenants`
pub async fn list_tenants(
    State(service): State<SharedService>,
) -> (StatusCode, Json<Status<Vec<crate::core::model::Tenant>>>) {
    let status = service.list_tenants();
    (http_status(status.error), Json(status))
}

/// `GET /api/v1/tenants/:tenant_id`
pub async fn get_tenant(
    State(service): State<SharedService>,
    Path(tenant_id): Path<String>,
) -> (StatusCode, Json<Status<crate::core::model::Tenant>>) {
    let Ok(id) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };
    let status = service.get_tenant(&id);
    (http_status(status.error), Json(status))
}

// User handlers

/// `POST /api/v1/tenants/:tenant_id/users`
pub async fn create_user(
    State(service): State<SharedService>,
    Path(tenant_id): Path<String>,
    Json(user): Json<UserTemplate>,
) -> (StatusCode, Json<Status<crate::core::model::User>>) {
    let Ok(tenant) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };
    let status = service.create_user(&CreateUserReq { tenant, user });
    (http_status_created(status.error), Json(status))
}

/// `GET /api/v1/tenants/:tenant_id/users`
pub async fn list_users(
    State(service): State<SharedService>,
    Path(tenant_id): Path<String>,
) -> (StatusCode, Json<Status<Vec<crate::core::model::User>>>) {
    let Ok(tenant) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };
    let status = service.list_users(&tenant);
    (http_status(status.error), Json(status))
}

/// `GET /api/v1/users/:user_id`
pub async fn get_user(
    State(service): State<SharedService>,
    Path(user_id): Path<String>,
) -> (StatusCode, Json<Status<crate::core::model::User>>) {
    let Ok(id) = user_id.parse::<UserId>() else {
        return bad_id("user", &user_id);
    };
    let status = service.get_user(&id);
    (http_status(status.error), Json(status))
}

// Node handlers

/// `POST /api/v1/tenants/:tenant_id/nodes`
pub async fn create_node(
    State(service): State<SharedService>,
    Path(tenant_id): Path<String>,
    Json(node): Json<NodeTemplate>,
) -> (StatusCode, Json<Status<crate::core::model::Node>>) {
    let Ok(tenant) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };
    let status = service.create_node(&CreateNodeReq { tenant, node });
    (http_status_created(status.error), Json(status))
}

/// Query parameters accepted by the node listing endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct NodesQuery {
    /// Only direct children of this node
    pub parent: Option<String>,
    /// Only nodes without a parent
    #[serde(default)]
    pub roots_only: bool,
    /// Only nodes of this kind (`folder` or `item`)
    pub kind: Option<NodeKind>,
}

/// `GET /api/v1/tenants/:tenant_id/nodes`
pub async fn get_nodes(
    State(service): State<SharedService>,
    Path(tenant_id): Path<String>,
    Query(query): Query<NodesQuery>,
) -> (StatusCode, Json<Status<Vec<crate::core::model::Node>>>) {
    let Ok(tenant) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };

    let parent = match &query.parent {
        Some(raw) => match raw.parse::<NodeId>() {
            Ok(id) => Some(id),
            Err(_) => return bad_id("node", raw),
        },
        None => None,
    };

    let status = service.get_nodes(&GetNodesReq {
        tenant,
        filter: Some(NodeFilterSpec {
            parent,
            roots_only: query.roots_only,
            kind: query.kind,
        }),
    });
    (http_status(status.error), Json(status))
}

/// `GET /api/v1/tenants/:tenant_id/nodes/:node_id`
pub async fn get_node(
    State(service): State<SharedService>,
    Path((tenant_id, node_id)): Path<(String, String)>,
) -> (StatusCode, Json<Status<crate::core::model::Node>>) {
    let Ok(tenant) = tenant_id.parse::<TenantId>() else {
        return bad_id("tenant", &tenant_id);
    };
    let Ok(id) = node_id.parse::<NodeId>() else {
        return bad_id("node", &node_id);
    };
    let status = service.get_node(&tenant, &id);
    (http_status(status.error), Json(status))
}

// System handlers

/// Health check payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status string
    pub status: String,
    /// Crate version
    pub version: String,
    /// Number of tenants
    pub tenants: usize,
    /// Total nodes across tenants
    pub nodes: usize,
}

/// `GET /api/v1/health`
pub async fn health_check(State(service): State<SharedService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        tenants: service.store().tenant_count(),
        nodes: service.store().total_node_count(),
    })
}

/// Service description payload.
#[derive(Debug, Serialize)]
pub struct InfoResponse {
    /// Service name
    pub name: String,
    /// Crate version
    pub version: String,
    /// Supported operations
    pub operations: Vec<String>,
}

/// `GET /api/v1/info`
pub async fn system_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Arbor".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        operations: vec![
            "create_tenant".to_string(),
            "create_user".to_string(),
            "create_node".to_string(),
            "get_nodes".to_string(),
        ],
    })
}
