//! Test fixtures and helpers.
//!
//! Common setup code for reconciliation tests.

use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use setrecon_core::FilterConfig;
use setrecon_sync::ItemsSummarizer;

/// Stub item stored in buckets 6, 3 and 4.
pub const STUB_ITEM_A: &[u8] = &[5];
/// Stub item stored in buckets 2, 3 and 4.
pub const STUB_ITEM_B: &[u8] = &[6];

/// A hand-wired configuration for level 5 filters.
///
/// Only [`STUB_ITEM_A`] and [`STUB_ITEM_B`] are addressable, which makes
/// bucket contents easy to predict. Digests are one byte: `[4]` for item A,
/// `[8]` for item B, `[0xff]` for anything else.
pub fn stub_config() -> FilterConfig {
    let digester = |content: &[u8]| match content {
        [5] => vec![4],
        [6] => vec![8],
        _ => vec![0xff],
    };
    let selector = |level: u32, content: &[u8]| {
        if level != 5 {
            return None;
        }
        match content {
            [5] => Some(vec![6, 3, 4]),
            [6] => Some(vec![2, 3, 4]),
            _ => None,
        }
    };
    FilterConfig::new(Arc::new(digester), Arc::new(selector))
}

/// Serializer for byte-vector items.
pub fn identity(item: &Vec<u8>) -> Vec<u8> {
    item.clone()
}

/// Deserializer for byte-vector items.
pub fn to_vec(bytes: &[u8]) -> Result<Vec<u8>, Infallible> {
    Ok(bytes.to_vec())
}

/// Summarizer over byte-vector items with the default configuration.
pub type BytesSummarizer = ItemsSummarizer<Vec<u8>, fn(&Vec<u8>) -> Vec<u8>>;

/// Two sets with a known difference.
#[derive(Debug, Clone, Default)]
pub struct SetPair {
    /// Items on both sides.
    pub shared: Vec<Vec<u8>>,
    /// Items only the local side holds.
    pub local_only: Vec<Vec<u8>>,
    /// Items only the remote side holds.
    pub remote_only: Vec<Vec<u8>>,
}

impl SetPair {
    /// The small worked example: `{[1,2],[2,2],[3,2]}` against `{[1,2],[4,2]}`.
    pub fn example() -> Self {
        Self {
            shared: vec![vec![1, 2]],
            local_only: vec![vec![2, 2], vec![3, 2]],
            remote_only: vec![vec![4, 2]],
        }
    }

    /// Random distinct 16-byte items, deterministic in `seed`.
    pub fn random(seed: u64, shared: usize, local_only: usize, remote_only: usize) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut seen = HashSet::new();
        let mut draw = |n: usize| {
            let mut items = Vec::with_capacity(n);
            while items.len() < n {
                let item: [u8; 16] = rng.gen();
                if seen.insert(item) {
                    items.push(item.to_vec());
                }
            }
            items
        };
        Self {
            shared: draw(shared),
            local_only: draw(local_only),
            remote_only: draw(remote_only),
        }
    }

    /// The local set, shared items first.
    pub fn local(&self) -> Vec<Vec<u8>> {
        self.shared.iter().chain(&self.local_only).cloned().collect()
    }

    /// The remote set, shared items first.
    pub fn remote(&self) -> Vec<Vec<u8>> {
        self.shared.iter().chain(&self.remote_only).cloned().collect()
    }

    /// What the local side should learn it must add, in resolver order.
    pub fn expected_added(&self) -> Vec<Vec<u8>> {
        sorted(&self.remote_only)
    }

    /// What the local side should learn it must remove, in resolver order.
    pub fn expected_removed(&self) -> Vec<Vec<u8>> {
        sorted(&self.local_only)
    }

    pub fn difference_size(&self) -> usize {
        self.local_only.len() + self.remote_only.len()
    }

    /// Summarizer over the local set with the default configuration.
    pub fn local_summarizer(&self) -> BytesSummarizer {
        summarizer(self.local())
    }

    /// Summarizer over the remote set with the default configuration.
    pub fn remote_summarizer(&self) -> BytesSummarizer {
        summarizer(self.remote())
    }
}

fn summarizer(items: Vec<Vec<u8>>) -> BytesSummarizer {
    ItemsSummarizer::new(items, identity as fn(&Vec<u8>) -> Vec<u8>, FilterConfig::default())
}

fn sorted(items: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut items = items.to_vec();
    items.sort();
    items
}
