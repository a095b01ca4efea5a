//! End-to-end scenarios against the request service façade.

use std::collections::HashSet;
use std::sync::Arc;

use arbor::core::config::Config;
use arbor::core::ids::{NodeId, TenantId};
use arbor::core::model::{NodeKind, TenantKind, UserKind};
use arbor::service::wire::{
    CreateNodeReq, CreateTenantReq, ErrorCode, GetNodesReq, NodeFilterSpec, NodeTemplate,
    TenantTemplate, UserTemplate,
};
use arbor::service::NodeTreeService;
use arbor::Store;

fn service() -> Arc<NodeTreeService> {
    let config = Config::default();
    NodeTreeService::new_shared(Store::new_shared(&config.storage), &config)
}

fn create_tenant(service: &NodeTreeService, name: &str) -> TenantId {
    let status = service.create_tenant(&CreateTenantReq {
        tenant: TenantTemplate {
            kind: TenantKind::Regular,
            name: name.to_string(),
        },
        users: Vec::new(),
    });
    assert_eq!(status.error, ErrorCode::Ok);
    status.payload.unwrap().tenant.id
}

fn create_node(
    service: &NodeTreeService,
    tenant: TenantId,
    name: &str,
    parent: Option<NodeId>,
) -> arbor::core::model::Node {
    let status = service.create_node(&CreateNodeReq {
        tenant,
        node: NodeTemplate {
            kind: NodeKind::Folder,
            name: name.to_string(),
            parent,
        },
    });
    assert_eq!(status.error, ErrorCode::Ok, "{:?}", status.message);
    status.payload.unwrap()
}

#[test]
fn add_root_node() {
    let service = service();
    let tenant = create_tenant(&service, "first-tenant");

    let node = create_node(&service, tenant, "first", None);
    assert_eq!(node.name, "first");
    assert!(node.parent.is_none());
    assert!(!node.id.to_string().is_empty());
}

#[test]
fn add_child_node() {
    let service = service();
    let tenant = create_tenant(&service, "second-tenant");

    let parent = create_node(&service, tenant, "second", None);
    let child = create_node(&service, tenant, "child-of-second", Some(parent.id));
    assert_eq!(child.name, "child-of-second");
    assert_eq!(child.parent, Some(parent.id));

    // The child is a member of the tenant-scoped listing
    let listing = service
        .get_nodes(&GetNodesReq {
            tenant,
            filter: None,
        })
        .payload
        .unwrap();
    assert!(listing.iter().any(|n| n.id == child.id));
}

#[test]
fn add_child_tree_fan_out() {
    // 1 root + 20 children + 20x8 grandchildren = 189 reachable nodes
    let service = service();
    let tenant = create_tenant(&service, "third-tenant");

    let root = create_node(&service, tenant, "third", None);
    for i in 0..20 {
        let child = create_node(&service, tenant, &format!("third-{}", i), Some(root.id));
        assert_eq!(child.parent, Some(root.id));
        for ii in 0..8 {
            let grandchild = create_node(
                &service,
                tenant,
                &format!("third-{}-{}", i, ii),
                Some(child.id),
            );
            assert_eq!(grandchild.parent, Some(child.id));
        }
    }

    assert_eq!(
        service.store().subtree_size(&tenant, &root.id).unwrap(),
        189
    );

    // Every listed node's parent resolves within the tenant
    let nodes = service
        .get_nodes(&GetNodesReq {
            tenant,
            filter: None,
        })
        .payload
        .unwrap();
    assert_eq!(nodes.len(), 189);
    for node in &nodes {
        if let Some(parent) = node.parent {
            assert_eq!(service.get_node(&tenant, &parent).error, ErrorCode::Ok);
        }
    }
}

#[test]
fn node_ids_are_unique_across_the_system() {
    let service = service();
    let tenant_a = create_tenant(&service, "unique-a");
    let tenant_b = create_tenant(&service, "unique-b");

    let mut ids = HashSet::new();
    for i in 0..100 {
        let a = create_node(&service, tenant_a, &format!("a-{}", i), None);
        let b = create_node(&service, tenant_b, &format!("b-{}", i), None);
        assert!(ids.insert(a.id));
        assert!(ids.insert(b.id));
    }
}

#[test]
fn parent_from_another_tenant_is_not_found() {
    let service = service();
    let tenant_a = create_tenant(&service, "cross-a");
    let tenant_b = create_tenant(&service, "cross-b");

    let root_a = create_node(&service, tenant_a, "root", None);
    let status = service.create_node(&CreateNodeReq {
        tenant: tenant_b,
        node: NodeTemplate {
            kind: NodeKind::Folder,
            name: "stray".to_string(),
            parent: Some(root_a.id),
        },
    });
    assert_eq!(status.error, ErrorCode::NotFound);
    assert!(status.payload.is_none());
}

#[test]
fn listing_is_isolated_per_tenant() {
    let service = service();
    let tenant_a = create_tenant(&service, "iso-a");
    let tenant_b = create_tenant(&service, "iso-b");

    for i in 0..10 {
        create_node(&service, tenant_a, &format!("a-{}", i), None);
    }
    create_node(&service, tenant_b, "b-only", None);

    for filter in [
        None,
        Some(NodeFilterSpec {
            roots_only: true,
            ..Default::default()
        }),
        Some(NodeFilterSpec {
            kind: Some(NodeKind::Folder),
            ..Default::default()
        }),
    ] {
        let nodes = service
            .get_nodes(&GetNodesReq {
                tenant: tenant_b,
                filter,
            })
            .payload
            .unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes.iter().all(|n| n.tenant == tenant_b));
    }
}

#[test]
fn unknown_parent_listing_is_not_found_regardless_of_tenant_activity() {
    let service = service();
    let active = create_tenant(&service, "active-tenant");
    let fresh = create_tenant(&service, "fresh-tenant");
    create_node(&service, active, "root", None);

    // The same ghost parent must read as unknown whether the tenant has
    // created nodes before or not
    let ghost = NodeId::generate();
    for tenant in [active, fresh] {
        let status = service.get_nodes(&GetNodesReq {
            tenant,
            filter: Some(NodeFilterSpec {
                parent: Some(ghost),
                ..Default::default()
            }),
        });
        assert_eq!(status.error, ErrorCode::NotFound);
        assert!(status.payload.is_none());
    }
}

#[test]
fn tenant_with_users_is_atomic() {
    let service = service();

    // A malformed bundled user fails the whole request
    let status = service.create_tenant(&CreateTenantReq {
        tenant: TenantTemplate {
            kind: TenantKind::Regular,
            name: "atomic".to_string(),
        },
        users: vec![
            UserTemplate {
                kind: UserKind::Regular,
                name: "ok".to_string(),
                email: "ok@example.com".to_string(),
            },
            UserTemplate {
                kind: UserKind::Regular,
                name: "bad".to_string(),
                email: "not-an-email".to_string(),
            },
        ],
    });
    assert_eq!(status.error, ErrorCode::Validation);
    assert_eq!(service.store().tenant_count(), 0);
    assert_eq!(service.store().user_count(), 0);

    // The same name is still free, so nothing was left behind
    let retry = service.create_tenant(&CreateTenantReq {
        tenant: TenantTemplate {
            kind: TenantKind::Regular,
            name: "atomic".to_string(),
        },
        users: vec![UserTemplate {
            kind: UserKind::Regular,
            name: "kitty".to_string(),
            email: "kitty@example.com".to_string(),
        }],
    });
    assert_eq!(retry.error, ErrorCode::Ok);
    let created = retry.payload.unwrap();
    assert_eq!(created.users.len(), 1);
    assert_eq!(created.users[0].tenant, created.tenant.id);
}

#[test]
fn concurrent_creations_under_distinct_parents() {
    const PARENTS: usize = 16;
    const PER_PARENT: usize = 25;

    let service = service();
    let tenant = create_tenant(&service, "concurrent");

    let parents: Vec<NodeId> = (0..PARENTS)
        .map(|i| create_node(&service, tenant, &format!("parent-{}", i), None).id)
        .collect();

    let mut handles = Vec::new();
    for (i, parent) in parents.iter().copied().enumerate() {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            let mut ids = Vec::new();
            for n in 0..PER_PARENT {
                let node = create_node(&service, tenant, &format!("c-{}-{}", i, n), Some(parent));
                ids.push(node.id);
            }
            ids
        }));
    }

    let mut all_ids = HashSet::new();
    for handle in handles {
        for id in handle.join().unwrap() {
            assert!(all_ids.insert(id), "duplicate node id");
        }
    }
    assert_eq!(all_ids.len(), PARENTS * PER_PARENT);

    // No lost writes: every parent lists exactly its own children
    for parent in &parents {
        let children = service
            .get_nodes(&GetNodesReq {
                tenant,
                filter: Some(NodeFilterSpec {
                    parent: Some(*parent),
                    ..Default::default()
                }),
            })
            .payload
            .unwrap();
        assert_eq!(children.len(), PER_PARENT);
    }
}

#[test]
fn concurrent_creations_under_the_same_parent() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 40;

    let service = service();
    let tenant = create_tenant(&service, "contended");
    let parent = create_node(&service, tenant, "hot", None).id;

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let service = Arc::clone(&service);
        handles.push(std::thread::spawn(move || {
            for n in 0..PER_THREAD {
                create_node(&service, tenant, &format!("c-{}-{}", t, n), Some(parent));
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let children = service
        .get_nodes(&GetNodesReq {
            tenant,
            filter: Some(NodeFilterSpec {
                parent: Some(parent),
                ..Default::default()
            }),
        })
        .payload
        .unwrap();
    assert_eq!(children.len(), THREADS * PER_THREAD);
}
