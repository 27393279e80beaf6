//! Invertible Bloom filter.
//!
//! An [`Ibf`] is a fixed-size table of `2^level` [`Bucket`]s. Every item is
//! accumulated into the buckets its selector picks. Subtracting the filter
//! of one set from the filter of another cancels the items both sides share,
//! and what remains can be peeled back into the symmetric difference when the
//! table is large enough relative to it.
//!
//! Filters are immutable values. Mutating operations consume the filter and
//! return a new one; bucket storage is shared between clones and copied only
//! when a shared filter is modified:
//!
//! ```rust
//! use setrecon_core::{FilterConfig, Ibf};
//!
//! let empty = Ibf::new(6, FilterConfig::default()).unwrap();
//! let one = empty.clone().add(b"item").unwrap();
//!
//! assert!(empty.decode().is_empty());
//! assert_eq!(one.decode().removed.len(), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::bucket::Bucket;
use crate::config::{check_level, level_to_size, FilterConfig};
use crate::difference::Difference;
use crate::error::{IbfError, Result};

/// An immutable invertible Bloom filter.
#[derive(Clone)]
pub struct Ibf {
    level: u32,
    buckets: Arc<Vec<Bucket>>,
    config: FilterConfig,
}

/// Serialized form of a filter: its level and the ordered bucket list.
///
/// Digest and selector are not part of the wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IbfWire {
    /// Table level; the filter holds `2^level` buckets.
    pub level: u32,
    /// Buckets in index order.
    pub buckets: Vec<Bucket>,
}

#[derive(Serialize)]
struct IbfWireRef<'a> {
    level: u32,
    buckets: &'a [Bucket],
}

#[derive(Deserialize)]
struct IbfWireText {
    level: u32,
    buckets: Vec<String>,
}

impl Ibf {
    /// Create an empty filter of `2^level` buckets.
    pub fn new(level: u32, config: FilterConfig) -> Result<Self> {
        check_level(level)?;
        Ok(Self {
            level,
            buckets: Arc::new(vec![Bucket::EMPTY; level_to_size(level)]),
            config,
        })
    }

    /// Create a filter from existing buckets.
    pub fn from_buckets(level: u32, buckets: Vec<Bucket>, config: FilterConfig) -> Result<Self> {
        check_level(level)?;
        let expected = level_to_size(level);
        if buckets.len() != expected {
            return Err(IbfError::BucketCountMismatch {
                level,
                expected,
                got: buckets.len(),
            });
        }
        Ok(Self {
            level,
            buckets: Arc::new(buckets),
            config,
        })
    }

    /// Table level.
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Number of buckets, `2^level`.
    pub fn size(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in index order.
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Digest and selector this filter was built with.
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Record one occurrence of `content`.
    pub fn add(self, content: &[u8]) -> Result<Self> {
        self.modify(1, content)
    }

    /// Record one removal of `content`.
    pub fn remove(self, content: &[u8]) -> Result<Self> {
        self.modify(-1, content)
    }

    /// Add every item the source yields until it ends.
    pub async fn add_many<S>(self, source: S) -> Result<Self>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        self.modify_many(1, source).await
    }

    /// Remove every item the source yields until it ends.
    pub async fn remove_many<S>(self, source: S) -> Result<Self>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        self.modify_many(-1, source).await
    }

    async fn modify_many<S>(mut self, delta: i64, source: S) -> Result<Self>
    where
        S: Stream,
        S::Item: AsRef<[u8]>,
    {
        futures::pin_mut!(source);
        while let Some(content) = source.next().await {
            self = self.modify(delta, content.as_ref())?;
        }
        Ok(self)
    }

    fn modify(mut self, delta: i64, content: &[u8]) -> Result<Self> {
        let indices = self.indices(content)?;
        let digest = self.config.digest(content);
        let buckets = Arc::make_mut(&mut self.buckets);
        for index in indices {
            buckets[index] = buckets[index].modify(delta, content, &digest);
        }
        Ok(self)
    }

    /// Selected indices for `content`, validated against this table.
    fn indices(&self, content: &[u8]) -> Result<Vec<usize>> {
        let indices = self
            .config
            .select(self.level, content)
            .ok_or(IbfError::SelectorIncompatible { level: self.level })?;
        let size = self.size();
        if let Some(&index) = indices.iter().find(|&&index| index >= size) {
            return Err(IbfError::IndexOutOfRange { index, size });
        }
        Ok(indices)
    }

    /// Bucket-wise sum of two filters of the same size.
    pub fn merge(&self, other: &Ibf) -> Result<Ibf> {
        self.combine(other, Bucket::group)
    }

    /// Bucket-wise difference of two filters of the same size.
    ///
    /// Items only in `self` end up with positive counts, items only in
    /// `other` with negative ones.
    pub fn subtract(&self, other: &Ibf) -> Result<Ibf> {
        self.combine(other, Bucket::ungroup)
    }

    fn combine(&self, other: &Ibf, op: fn(&Bucket, &Bucket) -> Bucket) -> Result<Ibf> {
        if self.size() != other.size() {
            return Err(IbfError::SizeMismatch {
                local: self.size(),
                other: other.size(),
            });
        }
        let buckets = self
            .buckets
            .iter()
            .zip(other.buckets.iter())
            .map(|(a, b)| op(a, b))
            .collect();
        Ok(Ibf {
            level: self.level,
            buckets: Arc::new(buckets),
            config: self.config.clone(),
        })
    }

    /// Fold this filter down to a smaller level.
    ///
    /// Bucket `i` is grouped into bucket `i mod 2^level`. With a selector
    /// whose small-level indices are its large-level indices folded the same
    /// way, the result equals a filter built directly at `level`. `self` is
    /// left untouched.
    pub fn reduce(&self, level: u32) -> Result<Ibf> {
        if level > self.level {
            return Err(IbfError::InvalidReduction {
                from: self.level,
                to: level,
            });
        }
        if level == self.level {
            return Ok(self.clone());
        }

        let size = level_to_size(level);
        let mut buckets = self.buckets[..size].to_vec();
        for (i, bucket) in self.buckets.iter().enumerate().skip(size) {
            let target = &mut buckets[i % size];
            *target = target.group(bucket);
        }
        Ok(Ibf {
            level,
            buckets: Arc::new(buckets),
            config: self.config.clone(),
        })
    }

    /// Peel the filter into the items it holds.
    ///
    /// Positive contributions decode as `removed`, negative ones as `added`.
    /// The difference is complete when every bucket is empty once nothing is
    /// left to peel. The filter itself is not modified.
    pub fn decode(&self) -> Difference {
        let mut buckets: Vec<Bucket> = self.buckets.as_ref().clone();
        let mut difference = Difference::empty();

        // Every genuine peel lowers the total weight; the budget stops a run
        // of false purity from cycling.
        let mut budget = buckets
            .iter()
            .fold(buckets.len() as u64, |acc, b| {
                acc.saturating_add(b.count().unsigned_abs())
            });
        let mut candidates: Vec<usize> = (0..buckets.len()).collect();

        while let Some(index) = candidates.pop() {
            let Some(item) = self
                .pure_content(&buckets[index])
                .map(Bytes::copy_from_slice)
            else {
                continue;
            };
            if budget == 0 {
                difference.complete = false;
                return difference;
            }
            budget -= 1;

            let sign = buckets[index].count();
            let Ok(indices) = self.indices(&item) else {
                difference.complete = false;
                return difference;
            };
            let digest = self.config.digest(&item);
            for i in indices {
                buckets[i] = buckets[i].modify(-sign, &item, &digest);
                candidates.push(i);
            }

            if sign > 0 {
                difference.removed.insert(item);
            } else {
                difference.added.insert(item);
            }
        }

        difference.complete = buckets.iter().all(Bucket::is_empty);
        difference
    }

    /// The single item held by a pure bucket, if the bucket is pure.
    ///
    /// Trailing zeros left behind by longer items that were already peeled
    /// out are trimmed until the digest matches.
    fn pure_content<'a>(&self, bucket: &'a Bucket) -> Option<&'a [u8]> {
        if bucket.count().unsigned_abs() != 1 {
            return None;
        }
        let mut content = bucket.xored();
        loop {
            if zero_extended_eq(&self.config.digest(content), bucket.hashed()) {
                return Some(content);
            }
            match content.split_last() {
                Some((0, rest)) => content = rest,
                _ => return None,
            }
        }
    }

    /// Copy out the serializable form.
    pub fn to_wire(&self) -> IbfWire {
        IbfWire {
            level: self.level,
            buckets: self.buckets.to_vec(),
        }
    }

    /// Rebuild a filter from its wire form with a locally supplied configuration.
    pub fn from_wire(wire: IbfWire, config: FilterConfig) -> Result<Self> {
        Self::from_buckets(wire.level, wire.buckets, config)
    }

    /// Encode as `{"level": .., "buckets": ["<count>:<xored>:<hashed>", ..]}`.
    pub fn to_json(&self) -> Result<String> {
        let view = IbfWireRef {
            level: self.level,
            buckets: &self.buckets,
        };
        serde_json::to_string(&view).map_err(|e| IbfError::EncodingError(e.to_string()))
    }

    /// Parse the JSON wire form with a locally supplied configuration.
    pub fn from_json(json: &str, config: FilterConfig) -> Result<Self> {
        let wire: IbfWireText =
            serde_json::from_str(json).map_err(|e| IbfError::DecodingError(e.to_string()))?;
        let buckets = wire
            .buckets
            .iter()
            .map(|b| b.parse())
            .collect::<Result<Vec<Bucket>>>()?;
        Self::from_buckets(wire.level, buckets, config)
    }
}

fn zero_extended_eq(a: &[u8], b: &[u8]) -> bool {
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    long[..short.len()] == *short && long[short.len()..].iter().all(|x| *x == 0)
}

impl PartialEq for Ibf {
    /// Compares level and buckets; configurations are not comparable.
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.buckets == other.buckets
    }
}

impl fmt::Debug for Ibf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let occupied = self.buckets.iter().filter(|b| !b.is_empty()).count();
        f.debug_struct("Ibf")
            .field("level", &self.level)
            .field("size", &self.size())
            .field("occupied", &occupied)
            .finish()
    }
}
