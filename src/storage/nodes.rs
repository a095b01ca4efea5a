//! Node tree store - the structural core of the service.
//!
//! Maps each tenant to its isolated [`TenantNodeSpace`] and implements the
//! node operations on top of it: creation with parent linkage, lookup and
//! filtered listing. Tenant existence itself is the tenant store's concern;
//! the umbrella [`Store`](crate::storage::Store) checks it before calls
//! reach this type.

use std::sync::Arc;

use dashmap::DashMap;

use crate::core::error::{Error, Result};
use crate::core::ids::{NodeId, TenantId};
use crate::core::model::{Node, NodeKind};
use crate::storage::space::TenantNodeSpace;

/// Filter for node listing. An empty filter selects the whole tenant set.
/// `parent` and `roots_only` are mutually exclusive (a child of `parent`
/// cannot be a root); combining them is a `Validation` error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeFilter {
    /// Only direct children of this node
    pub parent: Option<NodeId>,
    /// Only nodes without a parent
    pub roots_only: bool,
    /// Only nodes of this kind
    pub kind: Option<NodeKind>,
}

/// Concurrent store of per-tenant node spaces.
#[derive(Debug)]
pub struct NodeStore {
    /// Lock-free map of tenant id to that tenant's isolated space
    spaces: DashMap<TenantId, Arc<TenantNodeSpace>>,
    /// Soft cap on nodes per tenant (0 = unlimited)
    max_nodes_per_tenant: usize,
}

impl NodeStore {
    /// Create an empty store.
    pub fn new(max_nodes_per_tenant: usize) -> Self {
        Self {
            spaces: DashMap::new(),
            max_nodes_per_tenant,
        }
    }

    /// Get or create the isolated space for a tenant.
    fn get_or_create_space(&self, tenant: TenantId) -> Arc<TenantNodeSpace> {
        self.spaces
            .entry(tenant)
            .or_insert_with(|| Arc::new(TenantNodeSpace::new(tenant)))
            .clone()
    }

    /// Number of tenants with a node space.
    pub fn space_count(&self) -> usize {
        self.spaces.len()
    }

    /// Number of nodes for one tenant.
    pub fn node_count(&self, tenant: &TenantId) -> usize {
        self.spaces
            .get(tenant)
            .map(|entry| entry.value().node_count())
            .unwrap_or(0)
    }

    /// Total node count across all tenants.
    pub fn total_node_count(&self) -> usize {
        self.spaces
            .iter()
            .map(|entry| entry.value().node_count())
            .sum()
    }

    /// Create a node for a tenant, optionally under a parent in the same
    /// tenant. The parent lookup happens inside the tenant's own space, so a
    /// parent id from another tenant is indistinguishable from an unknown id.
    pub fn create_node(
        &self,
        tenant: TenantId,
        kind: NodeKind,
        name: &str,
        parent: Option<NodeId>,
    ) -> Result<Node> {
        if name.trim().is_empty() {
            return Err(Error::validation("node name must not be empty"));
        }

        let space = self.get_or_create_space(tenant);

        if let Some(parent) = parent {
            if !space.contains(&parent) {
                return Err(Error::not_found(format!("parent node {}", parent)));
            }
        }

        if self.max_nodes_per_tenant != 0 && space.node_count() >= self.max_nodes_per_tenant {
            return Err(Error::validation(format!(
                "tenant node limit reached ({})",
                self.max_nodes_per_tenant
            )));
        }

        let node = Node {
            id: NodeId::generate(),
            tenant,
            kind,
            name: name.to_string(),
            parent,
        };
        space.insert(node.clone())?;
        Ok(node)
    }

    /// Look up a node within a tenant.
    pub fn get_node(&self, tenant: &TenantId, id: &NodeId) -> Result<Node> {
        self.spaces
            .get(tenant)
            .and_then(|entry| entry.value().get(id))
            .ok_or_else(|| Error::not_found(format!("node {}", id)))
    }

    /// List nodes of a tenant, narrowed by the filter. Only ever reads the
    /// tenant's own space, so no filter shape can leak foreign nodes. A
    /// `parent` filter naming an unknown node is `NotFound` whether or not
    /// the tenant has created anything yet.
    pub fn get_nodes(&self, tenant: &TenantId, filter: &NodeFilter) -> Result<Vec<Node>> {
        if filter.parent.is_some() && filter.roots_only {
            return Err(Error::validation(
                "parent and roots_only cannot be combined",
            ));
        }

        let space = match self.spaces.get(tenant) {
            Some(entry) => entry.value().clone(),
            // Tenant exists but has created nothing yet; a parent filter
            // still names a node that cannot exist here.
            None => {
                return match filter.parent {
                    Some(parent) => Err(Error::not_found(format!("parent node {}", parent))),
                    None => Ok(Vec::new()),
                }
            }
        };

        let mut nodes = if let Some(parent) = filter.parent {
            if !space.contains(&parent) {
                return Err(Error::not_found(format!("parent node {}", parent)));
            }
            space
                .children_of(&parent)
                .iter()
                .filter_map(|id| space.get(id))
                .collect()
        } else if filter.roots_only {
            space
                .root_ids()
                .iter()
                .filter_map(|id| space.get(id))
                .collect()
        } else {
            space.all_nodes()
        };

        if let Some(kind) = filter.kind {
            nodes.retain(|node| node.kind == kind);
        }
        Ok(nodes)
    }

    /// Count of nodes reachable from `root` within a tenant, root included.
    pub fn subtree_size(&self, tenant: &TenantId, root: &NodeId) -> Result<usize> {
        let space = self
            .spaces
            .get(tenant)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::not_found(format!("node {}", root)))?;
        if !space.contains(root) {
            return Err(Error::not_found(format!("node {}", root)));
        }
        Ok(space.subtree_size(root))
    }
}
