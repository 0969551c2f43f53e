//! Cycle detection over a staged ancestry graph
//!
//! Every node's ancestor chain is walked until it reaches a root (a node that
//! is its own ancestor), a node already known to be acyclic, or a node on the
//! current walk. The last case is a cycle and every node from the first
//! revisit onward is a member. Each node is visited at most once, so the
//! whole check is linear in the number of versions.

use rustc_hash::FxHashMap;

use xreg_core::{EntityPath, RegistryError, Result, VersionId};

use super::graph::AncestryGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Every version that participates in any cycle, sorted and deduplicated
///
/// Self-loops are roots, not cycles. Ancestors missing from the graph end a
/// walk; `AncestryGraph::validate_ancestors` reports them.
pub fn cycle_members(graph: &AncestryGraph) -> Vec<VersionId> {
    let mut marks: FxHashMap<&VersionId, Mark> = FxHashMap::default();
    let mut members: Vec<VersionId> = Vec::new();
    let mut path: Vec<&VersionId> = Vec::new();

    let mut starts: Vec<&VersionId> = graph.nodes().map(|n| &n.id).collect();
    starts.sort();

    for start in starts {
        if marks.contains_key(start) {
            continue;
        }
        path.clear();
        let mut current = start;
        loop {
            match marks.get(current).copied() {
                Some(Mark::Done) => break,
                Some(Mark::OnPath) => {
                    if let Some(pos) = path.iter().position(|id| *id == current) {
                        members.extend(path[pos..].iter().map(|id| (*id).clone()));
                    }
                    break;
                }
                None => {
                    let Some(node) = graph.get(current) else {
                        break;
                    };
                    marks.insert(current, Mark::OnPath);
                    path.push(current);
                    if node.is_root() {
                        break;
                    }
                    current = &node.ancestor;
                }
            }
        }
        for id in &path {
            marks.insert(*id, Mark::Done);
        }
    }

    members.sort();
    members.dedup();
    members
}

/// Whether the graph has any cycle
pub fn has_cycle(graph: &AncestryGraph) -> bool {
    !cycle_members(graph).is_empty()
}

/// Fail with `CircularAncestor` naming every cycle member
pub fn check_acyclic(graph: &AncestryGraph) -> Result<()> {
    let ids = cycle_members(graph);
    if ids.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::CircularAncestor {
            subject: EntityPath::Resource(graph.subject().clone()),
            ids,
        })
    }
}
