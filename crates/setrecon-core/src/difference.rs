//! The outcome of decoding a filter.

use std::collections::HashSet;

use bytes::Bytes;

/// Items recovered by peeling a filter.
///
/// `removed` holds items with a positive contribution (present on the local
/// side only), `added` items with a negative one (present on the remote side
/// only). Membership is exact only when `complete` is true.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Difference {
    pub added: HashSet<Bytes>,
    pub removed: HashSet<Bytes>,
    pub complete: bool,
}

impl Difference {
    /// A complete, empty difference.
    pub fn empty() -> Self {
        Self {
            added: HashSet::new(),
            removed: HashSet::new(),
            complete: true,
        }
    }

    /// True when the difference is complete and has no items.
    pub fn is_empty(&self) -> bool {
        self.complete && self.added.is_empty() && self.removed.is_empty()
    }

    /// Total number of recovered items.
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }
}

impl Default for Difference {
    fn default() -> Self {
        Self::empty()
    }
}
