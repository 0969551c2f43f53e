//! Transaction writeset
//!
//! A writeset contains all mutations staged by one transaction. It is applied
//! to the store in a single step under the store's write lock.
//!
//! Resource records are written whole: the transaction holding a resource's
//! lock owns that record exclusively. Group and Registry changes caused by a
//! resource write are recorded as *bumps* instead of full records, so two
//! transactions touching different resources of the same group both land
//! without overwriting each other.

use xreg_core::{GroupKey, GroupRecord, ResourceKey, ResourceRecord, Timestamp};

/// A single staged mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Create or replace a resource (meta + all versions)
    PutResource(ResourceRecord),

    /// Delete a resource and all its versions
    DeleteResource(ResourceKey),

    /// Create or replace a group record
    PutGroup(GroupRecord),

    /// Delete a group and every resource in it
    DeleteGroup(GroupKey),

    /// Bump a group's epoch and modification time
    BumpGroup {
        /// Group to bump
        key: GroupKey,
        /// Transaction time
        at: Timestamp,
    },

    /// Bump the registry's epoch and modification time
    BumpRegistry {
        /// Transaction time
        at: Timestamp,
    },
}

impl Mutation {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::PutResource(_) => "put_resource",
            Mutation::DeleteResource(_) => "delete_resource",
            Mutation::PutGroup(_) => "put_group",
            Mutation::DeleteGroup(_) => "delete_group",
            Mutation::BumpGroup { .. } => "bump_group",
            Mutation::BumpRegistry { .. } => "bump_registry",
        }
    }

    /// Whether this mutation removes an entity
    pub fn is_delete(&self) -> bool {
        matches!(self, Mutation::DeleteResource(_) | Mutation::DeleteGroup(_))
    }
}

/// Ordered list of mutations from one transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Writeset {
    mutations: Vec<Mutation>,
}

impl Writeset {
    /// Empty writeset
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a mutation
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Staged mutations in order
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Number of staged mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Drop everything staged
    pub fn clear(&mut self) {
        self.mutations.clear();
    }

    /// Consume into the mutation list
    pub fn into_mutations(self) -> Vec<Mutation> {
        self.mutations
    }
}
