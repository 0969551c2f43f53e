//! Single-root policy

use xreg_core::{EntityPath, RegistryError, ResourceKey, Result};

use super::order::{root_count, VersionAncestor};

/// Enforces `single_version_root` on an ordered version list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootConstraint {
    single_root: bool,
}

impl RootConstraint {
    /// Constraint that is active when `single_root` is set
    pub fn new(single_root: bool) -> Self {
        Self { single_root }
    }

    /// Whether the policy is on
    pub fn is_enabled(&self) -> bool {
        self.single_root
    }

    /// Fail with `TooManyRootVersions` when enabled and `order` has more than one root
    pub fn check(&self, subject: &ResourceKey, order: &[VersionAncestor]) -> Result<()> {
        if !self.single_root {
            return Ok(());
        }
        let count = root_count(order);
        if count > 1 {
            return Err(RegistryError::TooManyRootVersions {
                subject: EntityPath::Resource(subject.clone()),
                count,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ancestry::Position;
    use xreg_core::VersionId;

    fn entry(id: &str, ancestor: &str, position: Position) -> VersionAncestor {
        VersionAncestor {
            id: VersionId::new_unchecked(id),
            ancestor: VersionId::new_unchecked(ancestor),
            position,
        }
    }

    fn key() -> ResourceKey {
        ResourceKey::parse("dirs", "d1", "files", "f1").unwrap()
    }

    #[test]
    fn test_disabled_allows_forest() {
        let order = vec![entry("a", "a", Position::Root), entry("b", "b", Position::Root)];
        assert!(RootConstraint::new(false).check(&key(), &order).is_ok());
    }

    #[test]
    fn test_enabled_rejects_two_roots() {
        let order = vec![entry("a", "a", Position::Root), entry("b", "b", Position::Root)];
        let err = RootConstraint::new(true).check(&key(), &order).unwrap_err();
        assert!(matches!(err, RegistryError::TooManyRootVersions { count: 2, .. }));
    }

    #[test]
    fn test_enabled_accepts_tree() {
        let order = vec![entry("a", "a", Position::Root), entry("b", "a", Position::Leaf)];
        assert!(RootConstraint::new(true).check(&key(), &order).is_ok());
    }
}
