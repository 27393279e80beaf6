//! # setrecon testkit
//!
//! Testing utilities for setrecon.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Fixed bucket and filter encodings for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Set pairs with a known difference, and a hand-wired stub configuration
//!
//! ## Golden Vectors
//!
//! ```rust
//! use setrecon_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use setrecon_testkit::SetPair;
//!
//! proptest! {
//!     #[test]
//!     fn difference_is_disjoint(pair: SetPair) {
//!         prop_assert!(pair.local_only.iter().all(|i| !pair.shared.contains(i)));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use setrecon_testkit::SetPair;
//!
//! let pair = SetPair::random(42, 1000, 10, 5);
//! assert_eq!(pair.difference_size(), 15);
//! let local = pair.local_summarizer();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    identity, stub_config, to_vec, BytesSummarizer, SetPair, STUB_ITEM_A, STUB_ITEM_B,
};
pub use generators::{bucket, content, set_pair};
pub use vectors::{bucket_vectors, filter_vectors, verify_all_vectors, BucketVector, FilterVector};
