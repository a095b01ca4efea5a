//! Wire-level request and response shapes.
//!
//! These are the schema-described contract of the service: explicit tagged
//! structs, no dynamic field injection. Every response is a [`Status`]
//! envelope carrying exactly one [`ErrorCode`] and a payload that is present
//! iff the code is [`ErrorCode::Ok`].

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::ids::{NodeId, TenantId};
use crate::core::model::{Node, NodeKind, Tenant, TenantKind, User, UserKind};
use crate::storage::NodeFilter;

/// Closed error enumeration of the external interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request succeeded
    Ok,
    /// A referenced entity does not exist
    NotFound,
    /// Malformed or missing required field
    Validation,
    /// Uniqueness violation
    Conflict,
    /// Storage or service failure after bounded internal retry
    Internal,
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::NotFound(_) => ErrorCode::NotFound,
            Error::Validation(_) => ErrorCode::Validation,
            Error::Conflict(_) => ErrorCode::Conflict,
            // Everything else is an internal fault; details never cross the
            // interface unmapped.
            Error::Config(_) | Error::Storage(_) | Error::Internal(_) | Error::Io(_) => {
                ErrorCode::Internal
            }
        }
    }
}

/// Response envelope: one error code, an optional human-readable message and
/// the payload when the request succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status<T> {
    /// Outcome of the request
    pub error: ErrorCode,
    /// Human-readable detail for non-`Ok` outcomes
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub message: Option<String>,
    /// Result payload, present iff `error` is `Ok`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub payload: Option<T>,
}

impl<T> Status<T> {
    /// Successful response with a payload.
    pub fn ok(payload: T) -> Self {
        Self {
            error: ErrorCode::Ok,
            message: None,
            payload: Some(payload),
        }
    }

    /// Failed response mapped from an internal error.
    pub fn from_err(err: &Error) -> Self {
        Self {
            error: ErrorCode::from(err),
            message: Some(err.to_string()),
            payload: None,
        }
    }
}

impl<T> From<crate::core::error::Result<T>> for Status<T> {
    fn from(result: crate::core::error::Result<T>) -> Self {
        match result {
            Ok(payload) => Status::ok(payload),
            Err(err) => Status::from_err(&err),
        }
    }
}

/// Template for a tenant to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantTemplate {
    /// Tenant classification
    #[serde(default)]
    pub kind: TenantKind,
    /// Tenant name, unique system-wide
    pub name: String,
}

/// Template for a user to be created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTemplate {
    /// User classification
    #[serde(default)]
    pub kind: UserKind,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

/// Template for a node to be created. The id is assigned by the service and
/// echoed back in the response; `parent` is echoed when accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplate {
    /// Node classification
    #[serde(default)]
    pub kind: NodeKind,
    /// Display name
    pub name: String,
    /// Optional parent node in the same tenant
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<NodeId>,
}

/// Request: create a tenant, optionally with an initial user batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenantReq {
    /// The tenant to create
    pub tenant: TenantTemplate,
    /// Users persisted atomically together with the tenant
    #[serde(default)]
    pub users: Vec<UserTemplate>,
}

/// Request: create a user under an existing tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserReq {
    /// Owning tenant
    pub tenant: TenantId,
    /// The user to create
    pub user: UserTemplate,
}

/// Request: create a node in a tenant's tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNodeReq {
    /// Owning tenant
    pub tenant: TenantId,
    /// The node to create
    pub node: NodeTemplate,
}

/// Listing filter as it appears on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeFilterSpec {
    /// Only direct children of this node
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent: Option<NodeId>,
    /// Only nodes without a parent
    #[serde(default)]
    pub roots_only: bool,
    /// Only nodes of this kind
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<NodeKind>,
}

impl From<&NodeFilterSpec> for NodeFilter {
    fn from(spec: &NodeFilterSpec) -> Self {
        NodeFilter {
            parent: spec.parent,
            roots_only: spec.roots_only,
            kind: spec.kind,
        }
    }
}

/// Request: list nodes of a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetNodesReq {
    /// Tenant whose nodes to list
    pub tenant: TenantId,
    /// Optional narrowing filter; absent means the full tenant set
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub filter: Option<NodeFilterSpec>,
}

/// Mutation notification published to subscribers. Every successful
/// mutation emits one update per created entity, after the entity is
/// visible to reads; failed requests emit nothing.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum Update {
    /// A tenant was created
    TenantAdded {
        /// The created tenant
        tenant: Tenant,
    },
    /// A user was created
    UserAdded {
        /// The created user
        user: User,
    },
    /// A node was created
    NodeAdded {
        /// The created node
        node: Node,
    },
}

/// Payload of a successful tenant creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantCreated {
    /// The created tenant
    pub tenant: Tenant,
    /// The bundled users, in request order
    #[serde(default)]
    pub users: Vec<User>,
}

/// Response to `CreateTenantReq`.
pub type TenantCreatedStatus = Status<TenantCreated>;
/// Response to tenant lookups.
pub type TenantStatus = Status<Tenant>;
/// Response to user creation and lookups.
pub type UserStatus = Status<User>;
/// Response to node creation and lookups.
pub type NodeStatus = Status<Node>;
/// Response to node listings.
pub type NodeListStatus = Status<Vec<Node>>;
/// Response to a `UserId`-less user listing.
pub type UserListStatus = Status<Vec<User>>;
/// Response to tenant listings.
pub type TenantListStatus = Status<Vec<Tenant>>;
