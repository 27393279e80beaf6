//! Filter configuration shared by both peers.
//!
//! The digest and the selector decide where and how every item is recorded.
//! Two filters can only be meaningfully combined when they were built with
//! equivalent configurations; nothing in the wire form checks this.

use std::fmt;
use std::sync::Arc;

use crate::digest::{Blake3Digester, Digester};
use crate::error::{IbfError, Result};
use crate::selector::{BucketSelector, PadAndHashSelector};

/// Highest level any filter may have.
///
/// A filter holds `2^level` buckets of at least 56 bytes each, so a table at
/// this level needs upwards of 60 GiB. Negotiations stop far below it.
pub const MAX_LEVEL: u32 = 30;

/// Default number of buckets each item is stored in.
pub const DEFAULT_SPREAD: u8 = 3;

/// Number of buckets in a filter of the given level.
pub fn level_to_size(level: u32) -> usize {
    1usize << level
}

/// Reject levels above [`MAX_LEVEL`].
pub fn check_level(level: u32) -> Result<()> {
    if level > MAX_LEVEL {
        return Err(IbfError::LevelTooLarge {
            level,
            max: MAX_LEVEL,
        });
    }
    Ok(())
}

/// Digest and selector used to build and decode filters.
#[derive(Clone)]
pub struct FilterConfig {
    digester: Arc<dyn Digester>,
    selector: Arc<dyn BucketSelector>,
}

impl FilterConfig {
    /// Create a configuration from explicit parts.
    pub fn new(digester: Arc<dyn Digester>, selector: Arc<dyn BucketSelector>) -> Self {
        Self { digester, selector }
    }

    /// Blake3 digests and a Blake3 pad-and-hash selector with the given spread.
    pub fn blake3(spread: u8) -> Result<Self> {
        let digester: Arc<dyn Digester> = Arc::new(Blake3Digester::new());
        let selector = PadAndHashSelector::new(Arc::clone(&digester), spread)?;
        Ok(Self::new(digester, Arc::new(selector)))
    }

    /// Digest of `content`.
    pub fn digest(&self, content: &[u8]) -> Vec<u8> {
        self.digester.digest(content)
    }

    /// Bucket indices of `content` at `level`, if the selector supports it.
    pub fn select(&self, level: u32, content: &[u8]) -> Option<Vec<usize>> {
        self.selector.select(level, content)
    }

    /// The configured digester.
    pub fn digester(&self) -> &Arc<dyn Digester> {
        &self.digester
    }

    /// The configured selector.
    pub fn selector(&self) -> &Arc<dyn BucketSelector> {
        &self.selector
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(
            Arc::new(Blake3Digester::new()),
            Arc::new(PadAndHashSelector::default()),
        )
    }
}

impl fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterConfig").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_to_size() {
        assert_eq!(level_to_size(0), 1);
        assert_eq!(level_to_size(1), 2);
        assert_eq!(level_to_size(10), 1024);
    }

    #[test]
    fn test_check_level() {
        assert!(check_level(MAX_LEVEL).is_ok());
        assert!(matches!(
            check_level(MAX_LEVEL + 1),
            Err(IbfError::LevelTooLarge { level: 31, max: 30 })
        ));
    }

    #[test]
    fn test_default_matches_blake3_spread_three() {
        let default = FilterConfig::default();
        let explicit = FilterConfig::blake3(DEFAULT_SPREAD).unwrap();
        assert_eq!(default.digest(b"a"), explicit.digest(b"a"));
        assert_eq!(default.select(8, b"a"), explicit.select(8, b"a"));
    }
}
