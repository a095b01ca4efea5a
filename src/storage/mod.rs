//! Storage layer: tenant/user records and per-tenant node trees.
//!
//! All persistent state lives behind [`Store`]; no other component touches
//! the maps directly. Mutating operations validate fully before the first
//! insertion, which is what makes a cancelled or failed call leave no
//! partial state behind.

/// Node tree store and listing filter
pub mod nodes;
/// Per-tenant isolated node space
pub mod space;
/// Tenant and user store
pub mod tenants;

use std::sync::Arc;

pub use nodes::{NodeFilter, NodeStore};
pub use space::TenantNodeSpace;
pub use tenants::{NewUser, TenantStore};

use crate::core::config::StorageConfig;
use crate::core::error::{Error, Result};
use crate::core::ids::{NodeId, TenantId, UserId};
use crate::core::model::{Node, NodeKind, Tenant, TenantKind, User, UserKind};

/// Shared handle to the store, cloneable across request tasks.
pub type SharedStore = Arc<Store>;

/// The single shared mutable resource of the service: tenants, users and
/// node trees. Node operations go through the tenant-existence check here
/// so the node store can assume a valid tenant.
#[derive(Debug)]
pub struct Store {
    tenants: TenantStore,
    nodes: NodeStore,
}

impl Store {
    /// Create an empty store from configuration.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            tenants: TenantStore::new(),
            nodes: NodeStore::new(config.max_nodes_per_tenant),
        }
    }

    /// Create a shared store from configuration.
    pub fn new_shared(config: &StorageConfig) -> SharedStore {
        Arc::new(Self::new(config))
    }

    // -- tenants and users ----------------------------------------------

    /// Create a tenant, optionally with an initial user batch (atomic).
    pub fn create_tenant(
        &self,
        name: &str,
        kind: TenantKind,
        initial_users: &[NewUser],
    ) -> Result<(Tenant, Vec<User>)> {
        self.tenants.create_tenant(name, kind, initial_users)
    }

    /// Look up a tenant by id.
    pub fn get_tenant(&self, id: &TenantId) -> Result<Tenant> {
        self.tenants.get_tenant(id)
    }

    /// Snapshot of all tenants.
    pub fn list_tenants(&self) -> Vec<Tenant> {
        self.tenants.list_tenants()
    }

    /// Create a user under an existing tenant.
    pub fn create_user(
        &self,
        tenant: &TenantId,
        name: &str,
        email: &str,
        kind: UserKind,
    ) -> Result<User> {
        self.tenants.create_user(tenant, name, email, kind)
    }

    /// Look up a user by id.
    pub fn get_user(&self, id: &UserId) -> Result<User> {
        self.tenants.get_user(id)
    }

    /// Snapshot of a tenant's users.
    pub fn list_users(&self, tenant: &TenantId) -> Result<Vec<User>> {
        self.tenants.list_users(tenant)
    }

    // -- nodes ----------------------------------------------------------

    /// Create a node for an existing tenant.
    pub fn create_node(
        &self,
        tenant: &TenantId,
        kind: NodeKind,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<Node> {
        self.require_tenant(tenant)?;
        self.nodes.create_node(*tenant, kind, name, parent)
    }

    /// Look up a node within a tenant.
    pub fn get_node(&self, tenant: &TenantId, id: &NodeId) -> Result<Node> {
        self.require_tenant(tenant)?;
        self.nodes.get_node(tenant, id)
    }

    /// List a tenant's nodes, narrowed by the filter.
    pub fn get_nodes(&self, tenant: &TenantId, filter: &NodeFilter) -> Result<Vec<Node>> {
        self.require_tenant(tenant)?;
        self.nodes.get_nodes(tenant, filter)
    }

    /// Count of nodes reachable from a node, itself included.
    pub fn subtree_size(&self, tenant: &TenantId, root: &NodeId) -> Result<usize> {
        self.require_tenant(tenant)?;
        self.nodes.subtree_size(tenant, root)
    }

    // -- counters -------------------------------------------------------

    /// Number of tenants.
    pub fn tenant_count(&self) -> usize {
        self.tenants.tenant_count()
    }

    /// Number of users across all tenants.
    pub fn user_count(&self) -> usize {
        self.tenants.user_count()
    }

    /// Number of nodes for one tenant.
    pub fn node_count(&self, tenant: &TenantId) -> usize {
        self.nodes.node_count(tenant)
    }

    /// Total node count across all tenants.
    pub fn total_node_count(&self) -> usize {
        self.nodes.total_node_count()
    }

    fn require_tenant(&self, tenant: &TenantId) -> Result<()> {
        if self.tenants.tenant_exists(tenant) {
            Ok(())
        } else {
            Err(Error::not_found(format!("tenant {}", tenant)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::StorageConfig;

    fn store() -> Store {
        Store::new(&StorageConfig::default())
    }

    #[test]
    fn test_node_ops_require_tenant() {
        let store = store();
        let ghost = TenantId::generate();
        assert!(matches!(
            store.create_node(&ghost, NodeKind::Folder, "x", None),
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            store.get_nodes(&ghost, &NodeFilter::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_listing_empty_tenant_is_empty_not_an_error() {
        let store = store();
        let (tenant, _) = store.create_tenant("t", TenantKind::Regular, &[]).unwrap();
        assert!(store.get_nodes(&tenant.id, &NodeFilter::default()).unwrap().is_empty());
    }

    #[test]
    fn test_counters() {
        let store = store();
        let (tenant, _) = store.create_tenant("t", TenantKind::Regular, &[]).unwrap();
        store
            .create_node(&tenant.id, NodeKind::Folder, "a", None)
            .unwrap();
        store
            .create_node(&tenant.id, NodeKind::Item, "b", None)
            .unwrap();
        assert_eq!(store.tenant_count(), 1);
        assert_eq!(store.node_count(&tenant.id), 2);
        assert_eq!(store.total_node_count(), 2);
    }
}
