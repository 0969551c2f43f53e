//! Deterministic ancestor-respecting order of a resource's versions
//!
//! Depth-first expansion: roots and each node's children are visited in
//! `(created_at, case-insensitive id)` order, and a whole subtree is emitted
//! before its next sibling. Ancestors always precede descendants and the
//! result depends only on the graph. The last entry is the leaf reached by
//! following the newest child from the newest root, which is what the
//! floating default tracks.
//!
//! Nodes on a cycle are never reachable from a root. If fewer nodes are
//! emitted than the graph holds, the graph is invalid.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use xreg_core::{EntityPath, RegistryError, Result, Timestamp, VersionId};

use super::graph::{AncestryGraph, AncestryNode};

/// Where a version sits in its forest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Its own ancestor; takes precedence over `Leaf`
    Root,
    /// Has an ancestor and at least one child
    Middle,
    /// Has an ancestor and no children
    Leaf,
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Position::Root => f.write_str("root"),
            Position::Middle => f.write_str("middle"),
            Position::Leaf => f.write_str("leaf"),
        }
    }
}

/// One entry of the ordered version list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionAncestor {
    /// Version ID
    pub id: VersionId,
    /// Ancestor ID
    pub ancestor: VersionId,
    /// Classification
    pub position: Position,
}

/// Compare two versions by `(created_at, case-insensitive id, id)`
///
/// This is the sibling order and the age order used by pruning.
pub fn compare_age(
    a_created: Timestamp,
    a_id: &VersionId,
    b_created: Timestamp,
    b_id: &VersionId,
) -> Ordering {
    a_created
        .cmp(&b_created)
        .then_with(|| a_id.cmp_case_insensitive(b_id))
}

/// Compare two nodes by age
pub fn compare_nodes(a: &AncestryNode, b: &AncestryNode) -> Ordering {
    compare_age(a.created_at, &a.id, b.created_at, &b.id)
}

/// Order every version of `graph`
///
/// Fails with `GraphInvalid` if some version is not reachable from a root,
/// which only happens when a cycle slipped past validation.
pub fn ordered_versions(graph: &AncestryGraph) -> Result<Vec<VersionAncestor>> {
    let children = graph.children_index();
    let mut roots: Vec<&AncestryNode> = graph.nodes().filter(|n| n.is_root()).collect();
    roots.sort_by(|a, b| compare_nodes(a, b));

    // Pushed newest first so the oldest pops first.
    let mut stack: Vec<&AncestryNode> = roots.into_iter().rev().collect();
    let mut out = Vec::with_capacity(graph.len());
    while let Some(node) = stack.pop() {
        let mut kids: Vec<&AncestryNode> = children
            .get(&node.id)
            .map(|k| k.iter().filter_map(|kid| graph.get(kid)).collect())
            .unwrap_or_default();
        let position = if node.is_root() {
            Position::Root
        } else if kids.is_empty() {
            Position::Leaf
        } else {
            Position::Middle
        };
        out.push(VersionAncestor {
            id: node.id.clone(),
            ancestor: node.ancestor.clone(),
            position,
        });
        kids.sort_by(|a, b| compare_nodes(b, a));
        stack.extend(kids);
    }

    if out.len() != graph.len() {
        return Err(RegistryError::GraphInvalid {
            subject: EntityPath::Resource(graph.subject().clone()),
            reason: format!(
                "{} of {} versions unreachable from any root",
                graph.len() - out.len(),
                graph.len()
            ),
        });
    }
    Ok(out)
}

/// Number of roots in an ordered list
pub fn root_count(order: &[VersionAncestor]) -> usize {
    order.iter().filter(|v| v.position == Position::Root).count()
}
