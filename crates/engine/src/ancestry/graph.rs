//! AncestryGraph: per-resource arena of version ancestor edges
//!
//! Nodes are keyed by `VersionId` and point at their ancestor by key, so the
//! forest never holds references into itself. A node whose ancestor is its
//! own ID is a root.
//!
//! Edge changes are *staged*: every insert, replace and removal is recorded
//! in an undo journal until `commit_staged()` is called. A batch can stage
//! all of its edges, validate the union, and `discard_staged()` on failure
//! to get back exactly the graph it started from.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use xreg_core::{EntityPath, RegistryError, ResourceKey, ResourceRecord, Result, Timestamp, VersionId};

/// Children list; most versions have few direct descendants
pub type Children = SmallVec<[VersionId; 4]>;

/// One version as the graph sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestryNode {
    /// Version ID
    pub id: VersionId,
    /// Ancestor ID; equal to `id` for a root
    pub ancestor: VersionId,
    /// Creation time, used to order siblings
    pub created_at: Timestamp,
}

impl AncestryNode {
    /// Create a node
    pub fn new(id: VersionId, ancestor: VersionId, created_at: Timestamp) -> Self {
        Self {
            id,
            ancestor,
            created_at,
        }
    }

    /// Whether this node is its own ancestor
    #[inline]
    pub fn is_root(&self) -> bool {
        self.id == self.ancestor
    }
}

#[derive(Debug, Clone)]
enum JournalEntry {
    Inserted(VersionId),
    Replaced(AncestryNode),
    Removed(AncestryNode),
}

/// Version forest of one resource
#[derive(Debug, Clone)]
pub struct AncestryGraph {
    subject: ResourceKey,
    nodes: FxHashMap<VersionId, AncestryNode>,
    journal: Vec<JournalEntry>,
}

impl AncestryGraph {
    /// Empty graph for `subject`
    pub fn new(subject: ResourceKey) -> Self {
        Self {
            subject,
            nodes: FxHashMap::default(),
            journal: Vec::new(),
        }
    }

    /// Graph of every version of a stored resource
    pub fn from_record(record: &ResourceRecord) -> Self {
        let mut graph = Self::new(record.key.clone());
        for v in record.versions.values() {
            graph.nodes.insert(
                v.id.clone(),
                AncestryNode::new(v.id.clone(), v.ancestor.clone(), v.stamps.created_at),
            );
        }
        graph
    }

    /// Resource this graph belongs to
    pub fn subject(&self) -> &ResourceKey {
        &self.subject
    }

    /// Number of versions
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no versions
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is a node
    pub fn contains(&self, id: &VersionId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up a node
    pub fn get(&self, id: &VersionId) -> Option<&AncestryNode> {
        self.nodes.get(id)
    }

    /// Iterate over nodes in arbitrary order
    pub fn nodes(&self) -> impl Iterator<Item = &AncestryNode> {
        self.nodes.values()
    }

    /// Every node ID, sorted
    pub fn sorted_ids(&self) -> Vec<VersionId> {
        let mut ids: Vec<VersionId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Direct descendants of `id`, excluding `id` itself
    pub fn children_of(&self, id: &VersionId) -> Children {
        let mut children: Children = self
            .nodes
            .values()
            .filter(|n| &n.ancestor == id && !n.is_root())
            .map(|n| n.id.clone())
            .collect();
        children.sort();
        children
    }

    /// Every root, sorted
    pub fn roots(&self) -> Vec<VersionId> {
        let mut roots: Vec<VersionId> = self
            .nodes
            .values()
            .filter(|n| n.is_root())
            .map(|n| n.id.clone())
            .collect();
        roots.sort();
        roots
    }

    /// Map from each node to its children
    pub fn children_index(&self) -> FxHashMap<&VersionId, Children> {
        let mut index: FxHashMap<&VersionId, Children> = FxHashMap::default();
        for node in self.nodes.values() {
            if !node.is_root() {
                index.entry(&node.ancestor).or_default().push(node.id.clone());
            }
        }
        index
    }

    // === Staged mutation ===

    /// Stage an edge without checking that the ancestor exists
    ///
    /// Inserts the node or replaces its ancestor and creation time. Use
    /// [`validate_ancestors`](Self::validate_ancestors) once the whole batch
    /// is staged.
    pub fn stage_edge(&mut self, id: VersionId, ancestor: VersionId, created_at: Timestamp) {
        let node = AncestryNode::new(id.clone(), ancestor, created_at);
        match self.nodes.insert(id.clone(), node) {
            Some(previous) => self.journal.push(JournalEntry::Replaced(previous)),
            None => self.journal.push(JournalEntry::Inserted(id)),
        }
    }

    /// Set one edge, requiring its ancestor to exist already
    ///
    /// On `UnknownAncestor` the graph is left unchanged.
    pub fn set_edge(
        &mut self,
        id: VersionId,
        ancestor: VersionId,
        created_at: Timestamp,
    ) -> Result<()> {
        if ancestor != id && !self.nodes.contains_key(&ancestor) {
            return Err(RegistryError::UnknownAncestor {
                subject: EntityPath::Resource(self.subject.clone()),
                missing: vec![ancestor],
            });
        }
        self.stage_edge(id, ancestor, created_at);
        Ok(())
    }

    /// Check every ancestor against the current node set
    ///
    /// Called after a whole batch is staged, so forward references between
    /// entries of the same batch resolve. Fails with `UnknownAncestor`
    /// listing every missing ID, sorted and deduplicated.
    pub fn validate_ancestors(&self) -> Result<()> {
        let mut missing: Vec<VersionId> = self
            .nodes
            .values()
            .filter(|n| !self.nodes.contains_key(&n.ancestor))
            .map(|n| n.ancestor.clone())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        missing.dedup();
        Err(RegistryError::UnknownAncestor {
            subject: EntityPath::Resource(self.subject.clone()),
            missing,
        })
    }

    /// Remove a node and re-root every child that pointed at it
    ///
    /// Returns the removed node and the IDs of the repaired children, or
    /// `None` if `id` is not in the graph.
    pub fn remove_node(&mut self, id: &VersionId) -> Option<(AncestryNode, Children)> {
        let removed = self.nodes.remove(id)?;
        self.journal.push(JournalEntry::Removed(removed.clone()));

        let mut repaired: Children = self
            .nodes
            .values()
            .filter(|n| &n.ancestor == id)
            .map(|n| n.id.clone())
            .collect();
        repaired.sort();
        for child in &repaired {
            if let Some(node) = self.nodes.get_mut(child) {
                self.journal.push(JournalEntry::Replaced(node.clone()));
                node.ancestor = child.clone();
            }
        }
        Some((removed, repaired))
    }

    /// Whether any change is staged
    pub fn has_staged(&self) -> bool {
        !self.journal.is_empty()
    }

    /// Accept every staged change
    pub fn commit_staged(&mut self) {
        self.journal.clear();
    }

    /// Undo every staged change, newest first
    pub fn discard_staged(&mut self) {
        while let Some(entry) = self.journal.pop() {
            match entry {
                JournalEntry::Inserted(id) => {
                    self.nodes.remove(&id);
                }
                JournalEntry::Replaced(previous) | JournalEntry::Removed(previous) => {
                    self.nodes.insert(previous.id.clone(), previous);
                }
            }
        }
    }
}
