//! Request service - the stateless façade between the wire contract and the
//! stores.
//!
//! Each method validates the request shape, delegates to the store and maps
//! the outcome onto the closed [`ErrorCode`](wire::ErrorCode) enumeration.
//! Deterministic failures (validation, not-found, conflict) surface
//! immediately; transient storage failures are retried a bounded number of
//! times before the request reports `Internal`. No session state is kept
//! between calls. Successful mutations additionally publish a typed
//! [`Update`](wire::Update) on a broadcast channel for live subscribers.

/// Wire-level request/response shapes
pub mod wire;

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::core::ids::{NodeId, TenantId, UserId};
use crate::storage::{NewUser, NodeFilter, SharedStore};
use wire::{
    CreateNodeReq, CreateTenantReq, CreateUserReq, GetNodesReq, NodeListStatus, NodeStatus,
    Status, TenantCreated, TenantCreatedStatus, TenantListStatus, TenantStatus, Update,
    UserListStatus, UserStatus,
};

/// Shared handle to the request service.
pub type SharedService = Arc<NodeTreeService>;

/// Capacity of the update broadcast channel; slow subscribers lag and skip
/// rather than backpressure mutations.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// The request service façade.
pub struct NodeTreeService {
    store: SharedStore,
    max_write_retries: u32,
    update_tx: broadcast::Sender<Update>,
}

impl NodeTreeService {
    /// Create a service over a store.
    pub fn new(store: SharedStore, config: &Config) -> Self {
        let (update_tx, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            store,
            max_write_retries: config.storage.max_write_retries,
            update_tx,
        }
    }

    /// Create a shared service over a store.
    pub fn new_shared(store: SharedStore, config: &Config) -> SharedService {
        Arc::new(Self::new(store, config))
    }

    /// Access the underlying store (used by the health endpoint and tests).
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Subscribe to mutation updates. Each successful mutation is delivered
    /// to every receiver that was subscribed before the mutation committed.
    pub fn subscribe(&self) -> broadcast::Receiver<Update> {
        self.update_tx.subscribe()
    }

    fn publish(&self, update: Update) {
        // A send with no subscribers is not an error
        let _ = self.update_tx.send(update);
    }

    // -- tenants --------------------------------------------------------

    /// Handle `CreateTenantReq`.
    pub fn create_tenant(&self, req: &CreateTenantReq) -> TenantCreatedStatus {
        let users: Vec<NewUser> = req
            .users
            .iter()
            .map(|template| NewUser {
                name: template.name.clone(),
                email: template.email.clone(),
                kind: template.kind,
            })
            .collect();

        let result = self.with_retries(|| {
            self.store
                .create_tenant(&req.tenant.name, req.tenant.kind, &users)
        });
        let status = into_status(result.map(|(tenant, users)| TenantCreated { tenant, users }));
        if let Some(created) = &status.payload {
            self.publish(Update::TenantAdded {
                tenant: created.tenant.clone(),
            });
            for user in &created.users {
                self.publish(Update::UserAdded { user: user.clone() });
            }
        }
        status
    }

    /// Handle a tenant lookup.
    pub fn get_tenant(&self, id: &TenantId) -> TenantStatus {
        into_status(self.store.get_tenant(id))
    }

    /// Handle a tenant listing.
    pub fn list_tenants(&self) -> TenantListStatus {
        Status::ok(self.store.list_tenants())
    }

    // -- users ----------------------------------------------------------

    /// Handle `CreateUserReq`.
    pub fn create_user(&self, req: &CreateUserReq) -> UserStatus {
        let result = self.with_retries(|| {
            self.store
                .create_user(&req.tenant, &req.user.name, &req.user.email, req.user.kind)
        });
        let status = into_status(result);
        if let Some(user) = &status.payload {
            self.publish(Update::UserAdded { user: user.clone() });
        }
        status
    }

    /// Handle a user lookup.
    pub fn get_user(&self, id: &UserId) -> UserStatus {
        into_status(self.store.get_user(id))
    }

    /// Handle a user listing for one tenant.
    pub fn list_users(&self, tenant: &TenantId) -> UserListStatus {
        into_status(self.store.list_users(tenant))
    }

    // -- nodes ----------------------------------------------------------

    /// Handle `CreateNodeReq`.
    pub fn create_node(&self, req: &CreateNodeReq) -> NodeStatus {
        let result = self.with_retries(|| {
            self.store.create_node(
                &req.tenant,
                req.node.kind,
                &req.node.name,
                req.node.parent,
            )
        });
        let status = into_status(result);
        if let Some(node) = &status.payload {
            self.publish(Update::NodeAdded { node: node.clone() });
        }
        status
    }

    /// Handle a node lookup within a tenant.
    pub fn get_node(&self, tenant: &TenantId, id: &NodeId) -> NodeStatus {
        into_status(self.store.get_node(tenant, id))
    }

    /// Handle `GetNodesReq`.
    pub fn get_nodes(&self, req: &GetNodesReq) -> NodeListStatus {
        let filter = req
            .filter
            .as_ref()
            .map(NodeFilter::from)
            .unwrap_or_default();
        into_status(self.store.get_nodes(&req.tenant, &filter))
    }

    /// Run a store operation, retrying transient failures a bounded number
    /// of times. Deterministic outcomes are never retried.
    fn with_retries<T>(&self, op: impl Fn() -> Result<T>) -> Result<T> {
        let mut attempt = 0u32;
        loop {
            match op() {
                Err(err) if err.is_retryable() && attempt < self.max_write_retries => {
                    attempt += 1;
                    tracing::warn!(%err, attempt, "transient storage failure, retrying");
                }
                other => return other,
            }
        }
    }
}

fn into_status<T>(result: Result<T>) -> Status<T> {
    if let Err(err) = &result {
        if err.is_client_error() {
            tracing::debug!(%err, "request rejected");
        } else {
            tracing::error!(%err, "request failed");
        }
    }
    Status::from(result)
}
