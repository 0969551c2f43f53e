//! Default-version selection
//!
//! Two modes:
//! - **floating** (`default_version_sticky = false`): the default is the
//!   last version in ancestor-respecting order, recomputed after every
//!   change to the ordered list
//! - **sticky**: the default is pinned until explicitly changed
//!
//! Every method reports whether the Meta record observably changed so the
//! caller can bump it.

use tracing::debug;

use xreg_core::{MetaRecord, VersionId};

use super::order::VersionAncestor;

/// How the default is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultMode {
    /// Follows the last version in order
    Floating,
    /// Pinned
    Sticky,
}

/// Maintains `MetaRecord::default_version_id`
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVersionSelector;

impl DefaultVersionSelector {
    /// Current mode of `meta`
    pub fn mode(meta: &MetaRecord) -> DefaultMode {
        if meta.default_version_sticky {
            DefaultMode::Sticky
        } else {
            DefaultMode::Floating
        }
    }

    /// The version the floating rule selects
    pub fn floating_choice(order: &[VersionAncestor]) -> Option<&VersionId> {
        order.last().map(|v| &v.id)
    }

    /// Re-point a floating default at the last version in order
    ///
    /// Sticky defaults are left alone. Returns whether the pointer moved.
    pub fn refresh(meta: &mut MetaRecord, order: &[VersionAncestor]) -> bool {
        if meta.default_version_sticky {
            return false;
        }
        match Self::floating_choice(order) {
            Some(last) if last != &meta.default_version_id => {
                debug!(
                    target: "xreg::ancestry",
                    from = %meta.default_version_id,
                    to = %last,
                    "Floating default moved"
                );
                meta.default_version_id = last.clone();
                true
            }
            _ => false,
        }
    }

    /// Pin the default to `id`
    ///
    /// Returns whether either the pointer or the mode changed.
    pub fn pin(meta: &mut MetaRecord, id: VersionId) -> bool {
        let changed = !meta.default_version_sticky || meta.default_version_id != id;
        meta.default_version_sticky = true;
        meta.default_version_id = id;
        changed
    }

    /// Pin whatever is default right now
    pub fn pin_current(meta: &mut MetaRecord) -> bool {
        let current = meta.default_version_id.clone();
        Self::pin(meta, current)
    }

    /// Switch to floating and recompute immediately
    pub fn unpin(meta: &mut MetaRecord, order: &[VersionAncestor]) -> bool {
        let was_sticky = meta.default_version_sticky;
        meta.default_version_sticky = false;
        let moved = Self::refresh(meta, order);
        was_sticky || moved
    }
}
