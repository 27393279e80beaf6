//! # setrecon core
//!
//! Pure primitives for set reconciliation: buckets, invertible Bloom
//! filters, digests and bucket selectors.
//!
//! This crate contains no I/O and no runtime. It is pure computation over
//! filter values; the negotiation protocol lives in `setrecon-sync`.
//!
//! ## Key Types
//!
//! - [`Bucket`] - One XOR/count accumulator cell
//! - [`Ibf`] - Fixed-size table of buckets with add, remove, merge and peel
//! - [`Difference`] - Items recovered by peeling
//! - [`FilterConfig`] - Digest and selector both peers must share
//! - [`BucketSelector`] / [`Digester`] - The two pluggable functions
//!
//! ## Sign convention
//!
//! An item added to a filter decodes as *removed*: it is present on the side
//! the filter describes and absent from the side it is compared against. An
//! item removed decodes as *added*. `local.subtract(&remote).decode()` therefore
//! yields what the local side must add and remove to match the remote side.

pub mod bucket;
pub mod config;
pub mod difference;
pub mod digest;
pub mod error;
pub mod ibf;
pub mod selector;
pub mod updater;

pub use bucket::Bucket;
pub use config::{check_level, level_to_size, FilterConfig, DEFAULT_SPREAD, MAX_LEVEL};
pub use difference::Difference;
pub use digest::{Blake3Digester, Digester};
pub use error::{IbfError, Result};
pub use ibf::{Ibf, IbfWire};
pub use selector::{BucketSelector, PadAndHashSelector};
pub use updater::{updater, ItemSink, ItemSource};
