//! Cycle guard for Role→Role containment edges.
//!
//! # Purpose
//! Validates a proposed `parent → child` edge against the graph as it would
//! look after the insert. The edge closes a cycle exactly when `parent` is
//! already reachable from `child` (or the two are the same role).
//!
//! # Key invariants
//! - Must run under the write gate together with the insert it validates.
//! - Traversal visits each role at most once, so a corrupted stored graph that
//!   already contains a cycle cannot make the guard loop.
use crate::error::{AccessError, AccessResult};
use crate::store::{AccessStore, StoreError};
use estate_authz::AccessRef;
use estate_common::ids::RoleId;
use std::collections::{HashSet, VecDeque};

/// Reject the edge `parent → child` if it would create a cycle.
///
/// # Errors
/// - [`AccessError::CompositeCycle`] when `parent` is reachable from `child`.
/// - [`AccessError::NotFound`] when `child` itself does not exist.
/// - Store failures are propagated unchanged.
pub async fn ensure_acyclic(
    store: &dyn AccessStore,
    parent: RoleId,
    child: RoleId,
) -> AccessResult<()> {
    if parent == child {
        return Err(AccessError::CompositeCycle { parent, child });
    }

    let mut visited: HashSet<RoleId> = HashSet::from([child]);
    let mut queue: VecDeque<RoleId> = VecDeque::from([child]);
    while let Some(current) = queue.pop_front() {
        let children = match store.role_children(current).await {
            Ok(children) => children,
            Err(StoreError::NotFound(what)) if current == child => {
                return Err(AccessError::NotFound(what));
            }
            Err(StoreError::NotFound(_)) => {
                // A dangling Role→Role row cannot lead back to `parent`.
                tracing::warn!(role = %current, "cycle guard skipped missing role");
                continue;
            }
            Err(err) => return Err(AccessError::Store(err)),
        };
        for next in children.iter().filter_map(AccessRef::as_role) {
            if next == parent {
                tracing::debug!(%parent, %child, via = %current, "role edge would close a cycle");
                return Err(AccessError::CompositeCycle { parent, child });
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    Ok(())
}
