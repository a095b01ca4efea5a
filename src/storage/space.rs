//! Per-tenant node space - a single tenant's isolated tree storage.
//!
//! Each tenant gets its own `TenantNodeSpace` so lookups and insertions for
//! one tenant never contend with another tenant's traffic, and nothing can
//! leak across the isolation boundary: every query starts from a space that
//! only ever contained one tenant's nodes.

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::core::error::{Error, Result};
use crate::core::ids::{NodeId, TenantId};
use crate::core::model::Node;

/// A single tenant's isolated node tree.
///
/// Nodes are stored in a sharded concurrent map keyed by id, with a derived
/// children index per parent. A node is inserted into the id map first and
/// linked into the indexes afterwards, so readers either see a fully
/// committed node or none of it; the children index is only ever a subset of
/// the id map.
#[derive(Debug)]
pub struct TenantNodeSpace {
    /// The tenant this space belongs to
    tenant: TenantId,
    /// All nodes of the tenant, keyed by id
    nodes: DashMap<NodeId, Node>,
    /// Direct children per parent node
    children: DashMap<NodeId, Vec<NodeId>>,
    /// Nodes without a parent
    roots: RwLock<Vec<NodeId>>,
}

impl TenantNodeSpace {
    /// Create an empty space for a tenant.
    pub fn new(tenant: TenantId) -> Self {
        Self {
            tenant,
            nodes: DashMap::new(),
            children: DashMap::new(),
            roots: RwLock::new(Vec::new()),
        }
    }

    /// The tenant this space belongs to.
    pub fn tenant(&self) -> TenantId {
        self.tenant
    }

    /// Number of nodes in this space.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether a node exists in this space.
    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Insert a fully validated node and link it to its parent.
    ///
    /// The caller must have verified that the parent (if any) exists in this
    /// space; this method still refuses links that would close a cycle so
    /// the guard survives any future re-parenting extension.
    pub fn insert(&self, node: Node) -> Result<()> {
        debug_assert_eq!(node.tenant, self.tenant);

        if let Some(parent) = node.parent {
            if self.link_would_cycle(&node.id, &parent) {
                return Err(Error::validation(format!(
                    "linking node {} under {} would create a cycle",
                    node.id, parent
                )));
            }
        }

        let id = node.id;
        let parent = node.parent;

        // Commit the record before linking: the children index must never
        // reference a node that readers cannot resolve.
        self.nodes.insert(id, node);

        match parent {
            Some(parent) => {
                // The entry guard serializes concurrent inserts under the
                // same parent; distinct parents proceed independently.
                self.children.entry(parent).or_default().push(id);
            }
            None => {
                self.roots.write().push(id);
            }
        }

        tracing::debug!(tenant = %self.tenant, node = %id, "node inserted");
        Ok(())
    }

    /// Look up a node by id.
    pub fn get(&self, id: &NodeId) -> Option<Node> {
        self.nodes.get(id).map(|entry| entry.value().clone())
    }

    /// Ids of the direct children of a node.
    pub fn children_of(&self, parent: &NodeId) -> Vec<NodeId> {
        self.children
            .get(parent)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Ids of the root nodes of this space.
    pub fn root_ids(&self) -> Vec<NodeId> {
        self.roots.read().clone()
    }

    /// Snapshot of every node in the space.
    pub fn all_nodes(&self) -> Vec<Node> {
        self.nodes
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Number of nodes reachable from `root`, including `root` itself.
    pub fn subtree_size(&self, root: &NodeId) -> usize {
        if !self.contains(root) {
            return 0;
        }

        let mut count = 0usize;
        let mut stack = vec![*root];
        while let Some(id) = stack.pop() {
            count += 1;
            stack.extend(self.children_of(&id));
        }
        count
    }

    /// Whether attaching `node` under `parent` would make `node` its own
    /// ancestor. Walks the parent chain upwards from `parent`; the chain is
    /// finite because every committed link passed this same check.
    pub fn link_would_cycle(&self, node: &NodeId, parent: &NodeId) -> bool {
        if node == parent {
            return true;
        }
        let mut current = *parent;
        while let Some(entry) = self.nodes.get(&current) {
            match entry.value().parent {
                Some(ancestor) if ancestor == *node => return true,
                Some(ancestor) => current = ancestor,
                None => break,
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::NodeKind;

    fn node(tenant: TenantId, name: &str, parent: Option<NodeId>) -> Node {
        Node {
            id: NodeId::generate(),
            tenant,
            kind: NodeKind::Folder,
            name: name.to_string(),
            parent,
        }
    }

    #[test]
    fn test_insert_root_and_child() {
        let tenant = TenantId::generate();
        let space = TenantNodeSpace::new(tenant);

        let root = node(tenant, "first", None);
        let root_id = root.id;
        space.insert(root).unwrap();

        let child = node(tenant, "child", Some(root_id));
        let child_id = child.id;
        space.insert(child).unwrap();

        assert_eq!(space.node_count(), 2);
        assert_eq!(space.root_ids(), vec![root_id]);
        assert_eq!(space.children_of(&root_id), vec![child_id]);
        assert_eq!(space.get(&child_id).unwrap().parent, Some(root_id));
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let tenant = TenantId::generate();
        let space = TenantNodeSpace::new(tenant);

        let mut n = node(tenant, "loop", None);
        n.parent = Some(n.id);
        assert!(space.insert(n).is_err());
        assert_eq!(space.node_count(), 0);
    }

    #[test]
    fn test_subtree_size_counts_descendants() {
        let tenant = TenantId::generate();
        let space = TenantNodeSpace::new(tenant);

        let root = node(tenant, "root", None);
        let root_id = root.id;
        space.insert(root).unwrap();

        let mut leaf_parents = Vec::new();
        for i in 0..3 {
            let mid = node(tenant, &format!("mid-{}", i), Some(root_id));
            leaf_parents.push(mid.id);
            space.insert(mid).unwrap();
        }
        for parent in &leaf_parents {
            for i in 0..2 {
                space
                    .insert(node(tenant, &format!("leaf-{}", i), Some(*parent)))
                    .unwrap();
            }
        }

        assert_eq!(space.subtree_size(&root_id), 1 + 3 + 6);
        assert_eq!(space.subtree_size(&leaf_parents[0]), 3);
        assert_eq!(space.subtree_size(&NodeId::generate()), 0);
    }

    #[test]
    fn test_concurrent_inserts_under_same_parent() {
        use std::sync::Arc;

        let tenant = TenantId::generate();
        let space = Arc::new(TenantNodeSpace::new(tenant));

        let root = node(tenant, "root", None);
        let root_id = root.id;
        space.insert(root).unwrap();

        let mut handles = Vec::new();
        for t in 0..8 {
            let space = space.clone();
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let n = node(tenant, &format!("child-{}-{}", t, i), Some(root_id));
                    space.insert(n).unwrap();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // No lost inserts under the contended parent
        assert_eq!(space.children_of(&root_id).len(), 8 * 50);
        assert_eq!(space.node_count(), 1 + 8 * 50);
    }
}
