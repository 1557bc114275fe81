//! Role composite: CRUD over roles and their ordered children.
//!
//! # Purpose
//! Roles group capabilities and other roles. Children are `AccessRef` ids
//! persisted as Role→Capability and Role→Role relation rows.
//!
//! # Key invariants
//! - Adding a role child runs the cycle guard and the insert under the write
//!   gate, as one unit.
//! - Deleting a role detaches it from parents, drops its own child rows and
//!   revokes it from principals; child entities are never deleted.
use super::AccessContext;
use super::guard::ensure_acyclic;
use crate::error::{AccessError, AccessResult};
use crate::store::StoreError;
use estate_authz::{AccessRef, Relation, Role};
use estate_common::ids::{CapabilityId, RoleId};
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

/// Full containment tree of a role, for administrative display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTree {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub children: Vec<RoleTreeNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoleTreeNode {
    Capability { id: CapabilityId, name: String },
    Role(RoleTree),
    /// A stored back-edge to a role already on the current path.
    Cycle { id: RoleId },
    /// A child row whose target no longer exists.
    Dangling { reference: AccessRef },
}

impl RoleTree {
    /// Capability names anywhere in the tree, depth first, with repeats.
    pub fn capability_names(&self) -> Vec<&str> {
        fn collect<'a>(tree: &'a RoleTree, names: &mut Vec<&'a str>) {
            for child in &tree.children {
                match child {
                    RoleTreeNode::Capability { name, .. } => names.push(name),
                    RoleTreeNode::Role(nested) => collect(nested, names),
                    RoleTreeNode::Cycle { .. } | RoleTreeNode::Dangling { .. } => {}
                }
            }
        }
        let mut names = Vec::new();
        collect(self, &mut names);
        names
    }
}

type TreeFuture<'a> = Pin<Box<dyn Future<Output = AccessResult<RoleTree>> + Send + 'a>>;

#[derive(Clone)]
pub struct RoleComposite {
    ctx: AccessContext,
}

impl RoleComposite {
    pub fn new(ctx: AccessContext) -> Self {
        Self { ctx }
    }

    pub async fn create(&self, name: &str, description: &str) -> AccessResult<Role> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AccessError::InvalidName(name.to_string()));
        }
        let _gate = self.ctx.lock_writes().await;
        let role = self
            .ctx
            .store()
            .create_role(Role::new(name, description))
            .await?;
        self.ctx.mark_mutated();
        tracing::info!(role = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    /// Update name and description; children are managed with
    /// [`add_child`](Self::add_child) and [`remove_child`](Self::remove_child).
    pub async fn update(&self, mut role: Role) -> AccessResult<Role> {
        role.name = role.name.trim().to_string();
        if role.name.is_empty() {
            return Err(AccessError::InvalidName(role.name));
        }
        let _gate = self.ctx.lock_writes().await;
        let updated = self.ctx.store().update_role(role).await?;
        self.ctx.mark_mutated();
        tracing::info!(role = %updated.id, name = %updated.name, "role updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: RoleId) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx.store().delete_role(id).await?;
        self.ctx.mark_mutated();
        tracing::info!(role = %id, "role deleted");
        Ok(())
    }

    /// Append `child` to the role's children.
    ///
    /// # Errors
    /// - [`AccessError::NotFound`] if the role or the child does not exist.
    /// - [`AccessError::CompositeCycle`] if `child` is a role that already
    ///   contains `role`, directly or transitively, or is `role` itself.
    pub async fn add_child(&self, role: RoleId, child: AccessRef) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        let store = self.ctx.store();
        // Resolve the parent first so an unknown parent reports as such.
        store.get_role(role).await?;
        if let AccessRef::Composite(child_role) = child {
            if let Err(err) = ensure_acyclic(store, role, child_role).await {
                if let AccessError::CompositeCycle { .. } = err {
                    tracing::warn!(%role, child = %child_role, "rejected cyclic role edge");
                }
                return Err(err);
            }
        }
        store.add_relation(Relation::child(role, child)).await?;
        self.ctx.mark_mutated();
        tracing::info!(%role, %child, "role child added");
        Ok(())
    }

    pub async fn remove_child(&self, role: RoleId, child: AccessRef) -> AccessResult<()> {
        let _gate = self.ctx.lock_writes().await;
        self.ctx
            .store()
            .remove_relation(Relation::child(role, child))
            .await?;
        self.ctx.mark_mutated();
        tracing::info!(%role, %child, "role child removed");
        Ok(())
    }

    /// The role with its direct children (one level).
    pub async fn get(&self, id: RoleId) -> AccessResult<Role> {
        Ok(self.ctx.store().get_role(id).await?)
    }

    pub async fn find_by_name(&self, name: &str) -> AccessResult<Option<Role>> {
        let name = name.trim();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|role| role.name == name))
    }

    /// All roles ordered by name, each with its direct children.
    pub async fn list(&self) -> AccessResult<Vec<Role>> {
        let mut roles = self.ctx.store().list_roles().await?;
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    /// Full containment tree rooted at `id`.
    ///
    /// Shared sub-roles are expanded under every parent that contains them,
    /// so the output grows with the number of paths, not the number of roles:
    /// a chain of `d` diamonds yields `2^d` copies of the bottom role. Fine for
    /// admin-sized hierarchies; use [`PermissionResolver`](super::PermissionResolver)
    /// when only the flattened set is needed.
    ///
    /// A stored back-edge to a role on the current path is shown as
    /// [`RoleTreeNode::Cycle`] instead of being followed.
    pub async fn tree(&self, id: RoleId) -> AccessResult<RoleTree> {
        let mut path = Vec::new();
        self.build_tree(id, &mut path).await
    }

    fn build_tree<'a>(&'a self, id: RoleId, path: &'a mut Vec<RoleId>) -> TreeFuture<'a> {
        Box::pin(async move {
            let store = self.ctx.store();
            let role = store.get_role(id).await?;
            path.push(id);
            let mut children = Vec::with_capacity(role.children.len());
            for child in &role.children {
                let node = match *child {
                    AccessRef::Leaf(cap_id) => match store.get_capability(cap_id).await {
                        Ok(cap) => RoleTreeNode::Capability {
                            id: cap.id,
                            name: cap.name,
                        },
                        Err(StoreError::NotFound(_)) => RoleTreeNode::Dangling { reference: *child },
                        Err(err) => return Err(AccessError::Store(err)),
                    },
                    AccessRef::Composite(role_id) if path.contains(&role_id) => {
                        RoleTreeNode::Cycle { id: role_id }
                    }
                    AccessRef::Composite(role_id) => match self.build_tree(role_id, path).await {
                        Ok(tree) => RoleTreeNode::Role(tree),
                        Err(AccessError::NotFound(_)) => RoleTreeNode::Dangling { reference: *child },
                        Err(err) => return Err(err),
                    },
                };
                children.push(node);
            }
            path.pop();
            Ok(RoleTree {
                id: role.id,
                name: role.name,
                description: role.description,
                children,
            })
        })
    }
}
