//! # setrecon
//!
//! Set reconciliation over invertible Bloom filters.
//!
//! ## Overview
//!
//! Two parties holding large, mostly overlapping sets learn their exact
//! symmetric difference by exchanging compact summaries instead of the sets
//! themselves. The summaries start tiny and double until the difference can
//! be peeled out of them, so the cost follows the size of the difference.
//!
//! - **Filters**: [`Ibf`] tables of XOR/count [`Bucket`]s, built and decoded
//!   with a shared [`FilterConfig`]
//! - **Summarizers**: per-level filter sources over local items, streams,
//!   remote JSON or a cached large filter
//! - **Resolver**: the adaptive loop that negotiates the [`Reconciliation`]
//!
//! ## Usage
//!
//! ```rust
//! use setrecon::{from_items, FilterConfig, Resolver};
//!
//! # async fn example() -> setrecon::Result<()> {
//! let remote = from_items(
//!     vec!["apple".to_string(), "cherry".to_string()],
//!     |s: &String| s.as_bytes().to_vec(),
//!     FilterConfig::default(),
//! );
//! let resolver = Resolver::from_items(
//!     vec!["apple".to_string(), "banana".to_string()],
//!     remote,
//!     |s: &String| s.as_bytes().to_vec(),
//!     |b: &[u8]| String::from_utf8(b.to_vec()),
//! );
//!
//! let result = resolver.resolve().await?;
//! assert_eq!(result.added, vec!["cherry".to_string()]);
//! assert_eq!(result.removed, vec!["banana".to_string()]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Re-exports
//!
//! - `setrecon::core` - Buckets, filters, selectors and digests
//! - `setrecon::sync` - Summarizers and the resolver

pub use setrecon_core as core;
pub use setrecon_sync as sync;

pub use setrecon_core::{
    updater, Blake3Digester, Bucket, BucketSelector, Difference, Digester, FilterConfig, Ibf,
    IbfError, ItemSink, ItemSource, PadAndHashSelector, DEFAULT_SPREAD, MAX_LEVEL,
};
pub use setrecon_sync::{
    from_items, from_json, from_large, from_stream, CachedFilter, Reconciliation, Resolver,
    ResolverConfig, Result, Summarizer, SummarizerExt, SyncError, MAX_RESOLVER_LEVEL,
};
