//! Retention pruning
//!
//! While a resource holds more versions than `max_versions` allows, the
//! oldest-in-order version that is not protected is deleted and its
//! children are re-rooted. The protected version (the default) is never
//! deleted, so with a cap of at least one the loop always terminates.
//!
//! Pruning may turn one chain into a forest with several roots; it is the
//! one place allowed to do so regardless of `single_version_root`.

use std::cmp::Ordering;

use tracing::debug;

use xreg_core::{EntityPath, RegistryError, Result, VersionId};

use super::graph::AncestryGraph;
use super::order::{compare_nodes, ordered_versions};

/// What one pruning pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Deleted versions, in deletion order
    pub pruned: Vec<VersionId>,
    /// Surviving versions whose ancestor was reset to themselves
    pub repaired: Vec<VersionId>,
}

impl PruneReport {
    /// Whether nothing was deleted
    pub fn is_empty(&self) -> bool {
        self.pruned.is_empty()
    }

    fn record(&mut self, pruned: VersionId, repaired: impl IntoIterator<Item = VersionId>) {
        self.repaired.retain(|r| r != &pruned);
        for r in repaired {
            if !self.repaired.contains(&r) {
                self.repaired.push(r);
            }
        }
        self.pruned.push(pruned);
    }
}

/// Enforces a maximum version count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPruner {
    max_versions: usize,
}

impl RetentionPruner {
    /// Pruner for a cap; 0 means unlimited
    pub fn new(max_versions: usize) -> Self {
        Self { max_versions }
    }

    /// The configured cap
    pub fn max_versions(&self) -> usize {
        self.max_versions
    }

    /// Whether `count` versions exceed the cap
    pub fn exceeds(&self, count: usize) -> bool {
        self.max_versions > 0 && count > self.max_versions
    }

    /// Prune an acyclic graph in topological order
    ///
    /// The order is recomputed after every deletion since re-rooting moves
    /// versions around. Fails with `GraphInvalid` if the cap can only be met
    /// by deleting `protected`.
    pub fn prune(&self, graph: &mut AncestryGraph, protected: &VersionId) -> Result<PruneReport> {
        let mut report = PruneReport::default();
        while self.exceeds(graph.len()) {
            let order = ordered_versions(graph)?;
            let victim = order
                .into_iter()
                .map(|v| v.id)
                .find(|id| id != protected)
                .ok_or_else(|| self.exhausted(graph))?;
            self.remove(graph, victim, &mut report);
        }
        self.log(graph, &report);
        Ok(report)
    }

    /// Prune by age alone
    ///
    /// Used when the staged graph still has a cycle and cannot be ordered:
    /// versions go oldest first by `(created_at, case-insensitive id)`.
    pub fn prune_by_age(
        &self,
        graph: &mut AncestryGraph,
        protected: &VersionId,
    ) -> Result<PruneReport> {
        let mut report = PruneReport::default();
        while self.exceeds(graph.len()) {
            let victim = graph
                .nodes()
                .filter(|n| &n.id != protected)
                .min_by(|a, b| compare_nodes(a, b))
                .map(|n| n.id.clone())
                .ok_or_else(|| self.exhausted(graph))?;
            self.remove(graph, victim, &mut report);
        }
        self.log(graph, &report);
        Ok(report)
    }

    /// The newest version by age, the one kept when nothing else is protected
    pub fn newest(graph: &AncestryGraph) -> Option<VersionId> {
        graph
            .nodes()
            .max_by(|a, b| match compare_nodes(a, b) {
                Ordering::Equal => a.id.cmp(&b.id),
                other => other,
            })
            .map(|n| n.id.clone())
    }

    fn remove(&self, graph: &mut AncestryGraph, victim: VersionId, report: &mut PruneReport) {
        if let Some((_, repaired)) = graph.remove_node(&victim) {
            report.record(victim, repaired);
        }
    }

    fn exhausted(&self, graph: &AncestryGraph) -> RegistryError {
        RegistryError::GraphInvalid {
            subject: EntityPath::Resource(graph.subject().clone()),
            reason: format!(
                "cannot prune to {} version(s): only the protected default remains",
                self.max_versions
            ),
        }
    }

    fn log(&self, graph: &AncestryGraph, report: &PruneReport) {
        if !report.is_empty() {
            debug!(
                target: "xreg::ancestry",
                resource = %graph.subject(),
                max_versions = self.max_versions,
                pruned = ?report.pruned,
                repaired = ?report.repaired,
                "Pruned versions"
            );
        }
    }
}
