//! Proptest generators for property-based testing.

use proptest::prelude::*;

use setrecon_core::Bucket;

use crate::fixtures::SetPair;

/// Generate item content of 1 to `max_len` bytes.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len)
}

/// Generate an arbitrary bucket.
pub fn bucket() -> impl Strategy<Value = Bucket> {
    (-8i64..=8, content(24), content(32))
        .prop_map(|(count, xored, hashed)| Bucket::new(count, xored, hashed))
}

/// Generate a filter level small enough to build quickly.
pub fn level() -> impl Strategy<Value = u32> {
    0u32..=12
}

/// Generate a set pair with at most `max_shared` common items and at most
/// `max_diff` items on each side only.
pub fn set_pair(max_shared: usize, max_diff: usize) -> impl Strategy<Value = SetPair> {
    (
        prop::collection::hash_set(content(16), 0..=max_shared),
        prop::collection::hash_set(content(16), 0..=max_diff),
        prop::collection::hash_set(content(16), 0..=max_diff),
    )
        .prop_map(|(shared, local, remote)| {
            let local: Vec<_> = local.difference(&shared).cloned().collect();
            let remote: Vec<_> = remote
                .into_iter()
                .filter(|item| !shared.contains(item) && !local.contains(item))
                .collect();
            SetPair {
                shared: shared.into_iter().collect(),
                local_only: local,
                remote_only: remote,
            }
        })
}

impl Arbitrary for SetPair {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        set_pair(64, 16).boxed()
    }
}
