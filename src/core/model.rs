//! Domain entities shared by the stores and the request service.
//!
//! Every entity carries the id of the tenant that owns it; no cross-tenant
//! reference exists anywhere in the model.

use serde::{Deserialize, Serialize};

use crate::core::ids::{NodeId, TenantId, UserId};

/// Tenant classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantKind {
    /// Ordinary paying/self-hosted tenant
    #[default]
    Regular,
    /// Evaluation tenant with reduced quotas
    Guest,
    /// Operator tenant used for administration
    Super,
}

/// User classification within a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserKind {
    /// Ordinary member of the tenant
    #[default]
    Regular,
    /// Tenant administrator
    Admin,
}

/// Node classification in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Container node that may have children
    #[default]
    Folder,
    /// Leaf payload node
    Item,
}

/// An isolated namespace owning its own users and node tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Unique tenant identifier, immutable once assigned
    pub id: TenantId,
    /// Human-readable name, unique system-wide
    pub name: String,
    /// Tenant classification
    pub kind: TenantKind,
}

/// A user belonging to exactly one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: UserId,
    /// Owning tenant
    pub tenant: TenantId,
    /// Display name
    pub name: String,
    /// Email address, unique within the tenant (case-insensitive)
    pub email: String,
    /// User classification
    pub kind: UserKind,
}

/// A tree element belonging to a tenant, optionally parented by another
/// node in the same tenant. A node without a parent is a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier, immutable once assigned
    pub id: NodeId,
    /// Owning tenant
    pub tenant: TenantId,
    /// Node classification
    pub kind: NodeKind,
    /// Display name
    pub name: String,
    /// Structural (non-owning) reference to the parent node, if any
    pub parent: Option<NodeId>,
}

impl Node {
    /// Whether this node is a root of its tenant's forest.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_detection() {
        let tenant = TenantId::generate();
        let root = Node {
            id: NodeId::generate(),
            tenant,
            kind: NodeKind::Folder,
            name: "first".into(),
            parent: None,
        };
        assert!(root.is_root());

        let child = Node {
            id: NodeId::generate(),
            tenant,
            kind: NodeKind::Item,
            name: "child".into(),
            parent: Some(root.id),
        };
        assert!(!child.is_root());
    }

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&NodeKind::Folder).unwrap(),
            "\"folder\""
        );
        assert_eq!(
            serde_json::to_string(&TenantKind::Regular).unwrap(),
            "\"regular\""
        );
    }
}
