//! Bucket selection: mapping content to the bucket indices it influences.

use std::fmt;
use std::sync::Arc;

use crate::config::DEFAULT_SPREAD;
use crate::digest::{Blake3Digester, Digester};
use crate::error::{IbfError, Result};

/// Deterministic mapping from (level, content) to bucket indices.
///
/// Returns `None` when the selector cannot address a table of `2^level`
/// buckets. Callers must treat that as a configuration error, never as a
/// reason to skip the item.
pub trait BucketSelector: Send + Sync {
    /// Select the indices in `[0, 2^level)` that `content` is stored in.
    fn select(&self, level: u32, content: &[u8]) -> Option<Vec<usize>>;
}

impl<F> BucketSelector for F
where
    F: Fn(u32, &[u8]) -> Option<Vec<usize>> + Send + Sync,
{
    fn select(&self, level: u32, content: &[u8]) -> Option<Vec<usize>> {
        self(level, content)
    }
}

/// Highest level a 32-bit hash prefix can address.
const ADDRESSABLE_LEVEL: u32 = 32;

/// Pads content with a counter byte and hashes it once per spread step.
///
/// Index `i` is the big-endian `u32` prefix of `digest(content || [i])`
/// taken modulo the table size. Because the table size is a power of two,
/// the index chosen at a small level is the index chosen at any larger level
/// folded down, which keeps reduced filters identical to freshly built ones.
/// Indices are not de-duplicated for the same reason.
#[derive(Clone)]
pub struct PadAndHashSelector {
    digester: Arc<dyn Digester>,
    spread: u8,
}

impl PadAndHashSelector {
    /// Create a selector storing every item in `spread` buckets.
    ///
    /// An odd spread is recommended: an item falling an even number of times
    /// in a single bucket cancels out of that bucket.
    pub fn new(digester: Arc<dyn Digester>, spread: u8) -> Result<Self> {
        if spread == 0 {
            return Err(IbfError::InvalidConfig(
                "items must be stored in at least one bucket".into(),
            ));
        }
        Ok(Self { digester, spread })
    }

    /// Selector hashing with plain Blake3.
    pub fn blake3(spread: u8) -> Result<Self> {
        Self::new(Arc::new(Blake3Digester::new()), spread)
    }

    /// Number of buckets each item is stored in.
    pub fn spread(&self) -> u8 {
        self.spread
    }
}

impl Default for PadAndHashSelector {
    /// Plain Blake3 with [`DEFAULT_SPREAD`].
    fn default() -> Self {
        Self {
            digester: Arc::new(Blake3Digester::new()),
            spread: DEFAULT_SPREAD,
        }
    }
}

impl BucketSelector for PadAndHashSelector {
    fn select(&self, level: u32, content: &[u8]) -> Option<Vec<usize>> {
        if level > ADDRESSABLE_LEVEL {
            return None;
        }
        let mask = (1u64 << level) - 1;

        let mut padded = Vec::with_capacity(content.len() + 1);
        padded.extend_from_slice(content);
        padded.push(0);
        let last = content.len();

        let mut indices = Vec::with_capacity(self.spread as usize);
        for i in 0..self.spread {
            padded[last] = i;
            let digested = self.digester.digest(&padded);
            let prefix: [u8; 4] = digested.get(..4)?.try_into().ok()?;
            let index = u64::from(u32::from_be_bytes(prefix)) & mask;
            indices.push(usize::try_from(index).ok()?);
        }
        Some(indices)
    }
}

impl fmt::Debug for PadAndHashSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PadAndHashSelector")
            .field("spread", &self.spread)
            .finish_non_exhaustive()
    }
}
