//! # setrecon sync
//!
//! Summarizers and the adaptive resolver that negotiates a set difference.
//!
//! ## Overview
//!
//! Each side of a reconciliation is a [`Summarizer`]: something that can
//! produce its filter at any requested level. The [`Resolver`] starts small,
//! asks both sides for a summary, subtracts and peels. When peeling gets
//! stuck it doubles the table and asks again, until the difference decodes
//! or `max_level` is passed.
//!
//! The remote side is usually a [`JsonSummarizer`] whose producer calls out
//! to a peer that serves [`SummarizerExt::summarize_json`]. Transport is the
//! caller's business.
//!
//! ## Usage
//!
//! ```rust
//! use setrecon_core::FilterConfig;
//! use setrecon_sync::{from_items, Resolver};
//!
//! # async fn example() -> setrecon_sync::Result<()> {
//! let remote = from_items(
//!     vec![vec![1u8, 2], vec![4, 2]],
//!     |v: &Vec<u8>| v.clone(),
//!     FilterConfig::default(),
//! );
//! let resolver = Resolver::from_items(
//!     vec![vec![1u8, 2], vec![2, 2], vec![3, 2]],
//!     remote,
//!     |v: &Vec<u8>| v.clone(),
//!     |b: &[u8]| Ok::<_, std::convert::Infallible>(b.to_vec()),
//! );
//!
//! let result = resolver.resolve().await?;
//! assert_eq!(result.added, vec![vec![4, 2]]);
//! assert_eq!(result.removed, vec![vec![2, 2], vec![3, 2]]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Round Flow
//!
//! ```text
//! Resolver                  local           remote
//!   |--- summarize(n) ------->|                |
//!   |--- summarize(n) ------------------------>|
//!   |<-- filter --------------|                |
//!   |<-- filter -------------------------------|
//!   |   subtract, peel
//!   |   complete? done : n + 1
//! ```

pub mod error;
pub mod resolver;
pub mod summarizer;

pub use error::{Result, SyncError};
pub use resolver::{Reconciliation, Resolver, ResolverConfig, MAX_RESOLVER_LEVEL};
pub use summarizer::{
    from_items, from_json, from_large, from_stream, CachedFilter, ItemsSummarizer, JsonSummarizer,
    LargeProducer, LargeSummarizer, StreamSummarizer, Summarizer, SummarizerExt, SummaryProducer,
};
