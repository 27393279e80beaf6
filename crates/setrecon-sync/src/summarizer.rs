//! Summarizers: filters on demand, at any level of detail.
//!
//! A summarizer answers "give me your filter at level `n`". The larger the
//! level, the more a summary costs on the wire and the larger the difference
//! it can decode. Summaries are built lazily, one per request, from:
//!
//! - an in-memory item list ([`from_items`]),
//! - a stream of items created afresh for every request ([`from_stream`]),
//! - JSON text fetched from elsewhere, usually a peer ([`from_json`]),
//! - a cached large filter folded down to the level asked for ([`from_large`]).

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::Stream;
use tokio::sync::OnceCell;

use setrecon_core::{FilterConfig, Ibf};

use crate::error::{Result, SyncError};

/// Produces a filter summarizing some state at a requested level.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Build or fetch the filter of `2^level` buckets.
    async fn summarize(&self, level: u32) -> Result<Ibf>;
}

#[async_trait]
impl<S: Summarizer + ?Sized> Summarizer for Arc<S> {
    async fn summarize(&self, level: u32) -> Result<Ibf> {
        (**self).summarize(level).await
    }
}

/// Extension trait for serving summaries.
pub trait SummarizerExt: Summarizer {
    /// Summarize and encode to the JSON wire form.
    ///
    /// This is what a peer hands out to the other side's [`from_json`].
    fn summarize_json(&self, level: u32) -> impl Future<Output = Result<String>> + Send;
}

impl<S: Summarizer + ?Sized> SummarizerExt for S {
    async fn summarize_json(&self, level: u32) -> Result<String> {
        let ibf = self.summarize(level).await?;
        Ok(ibf.to_json()?)
    }
}

/// Source of JSON summaries, typically a request to a remote peer.
pub trait SummaryProducer: Send + Sync {
    fn produce(&self, level: u32) -> impl Future<Output = Result<String>> + Send;
}

impl<F, Fut> SummaryProducer for F
where
    F: Fn(u32) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String>> + Send,
{
    fn produce(&self, level: u32) -> impl Future<Output = Result<String>> + Send {
        self(level)
    }
}

/// Source of an already built large filter.
pub trait LargeProducer: Send + Sync {
    fn produce(&self) -> impl Future<Output = Result<Ibf>> + Send;
}

impl<F, Fut> LargeProducer for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Ibf>> + Send,
{
    fn produce(&self) -> impl Future<Output = Result<Ibf>> + Send {
        self()
    }
}

/// Summarizes an in-memory list of items.
pub struct ItemsSummarizer<T, F> {
    items: Vec<T>,
    serialize: F,
    config: FilterConfig,
}

impl<T, F> ItemsSummarizer<T, F>
where
    F: Fn(&T) -> Vec<u8>,
{
    pub fn new(items: Vec<T>, serialize: F, config: FilterConfig) -> Self {
        Self {
            items,
            serialize,
            config,
        }
    }

    /// Items summarized on every request.
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

#[async_trait]
impl<T, F> Summarizer for ItemsSummarizer<T, F>
where
    T: Send + Sync,
    F: Fn(&T) -> Vec<u8> + Send + Sync,
{
    async fn summarize(&self, level: u32) -> Result<Ibf> {
        let mut ibf = Ibf::new(level, self.config.clone())?;
        for item in &self.items {
            ibf = ibf.add(&(self.serialize)(item))?;
        }
        tracing::debug!(level, items = self.items.len(), "summarized items");
        Ok(ibf)
    }
}

/// Summarizes a stream of items, created afresh for every request.
///
/// Items may take time to arrive; nothing is materialized beyond the filter.
pub struct StreamSummarizer<F> {
    factory: F,
    config: FilterConfig,
}

impl<F> StreamSummarizer<F> {
    pub fn new(factory: F, config: FilterConfig) -> Self {
        Self { factory, config }
    }
}

#[async_trait]
impl<F, S> Summarizer for StreamSummarizer<F>
where
    F: Fn() -> S + Send + Sync,
    S: Stream + Send + 'static,
    S::Item: AsRef<[u8]> + Send,
{
    async fn summarize(&self, level: u32) -> Result<Ibf> {
        let empty = Ibf::new(level, self.config.clone())?;
        let ibf = empty.add_many((self.factory)()).await?;
        tracing::debug!(level, "summarized stream");
        Ok(ibf)
    }
}

/// Parses JSON summaries with the local configuration.
///
/// The producer side does not need to run this code, only to emit the same
/// wire form from an equivalent configuration.
pub struct JsonSummarizer<P> {
    producer: P,
    config: FilterConfig,
}

impl<P: SummaryProducer> JsonSummarizer<P> {
    pub fn new(producer: P, config: FilterConfig) -> Self {
        Self { producer, config }
    }
}

#[async_trait]
impl<P: SummaryProducer> Summarizer for JsonSummarizer<P> {
    async fn summarize(&self, level: u32) -> Result<Ibf> {
        let json = match self.producer.produce(level).await {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(level, "summary producer failed: {}", e);
                return Err(e);
            }
        };

        let ibf = Ibf::from_json(&json, self.config.clone())?;
        if ibf.level() != level {
            return Err(SyncError::TransportError(format!(
                "requested level {} summary, received level {}",
                level,
                ibf.level()
            )));
        }
        tracing::debug!(level, bytes = json.len(), "parsed remote summary");
        Ok(ibf)
    }
}

/// Folds a large filter down to the requested level.
///
/// The large filter is never modified, so one cached build can serve any
/// number of requests.
pub struct LargeSummarizer<P> {
    producer: P,
}

impl<P: LargeProducer> LargeSummarizer<P> {
    pub fn new(producer: P) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl<P: LargeProducer> Summarizer for LargeSummarizer<P> {
    async fn summarize(&self, level: u32) -> Result<Ibf> {
        let large = self.producer.produce().await?;
        let reduced = large.reduce(level)?;
        tracing::debug!(level, from = large.level(), "reduced large summary");
        Ok(reduced)
    }
}

/// A large filter built once, on first use, and shared afterwards.
///
/// Clones share the cache.
pub struct CachedFilter<S> {
    inner: Arc<CachedInner<S>>,
}

struct CachedInner<S> {
    source: S,
    level: u32,
    cell: OnceCell<Ibf>,
}

impl<S: Summarizer> CachedFilter<S> {
    /// Cache `source`'s summary at `level`.
    pub fn new(source: S, level: u32) -> Self {
        Self {
            inner: Arc::new(CachedInner {
                source,
                level,
                cell: OnceCell::new(),
            }),
        }
    }

    /// Level of the cached filter.
    pub fn level(&self) -> u32 {
        self.inner.level
    }

    /// True once the filter has been built.
    pub fn is_built(&self) -> bool {
        self.inner.cell.initialized()
    }
}

impl<S> Clone for CachedFilter<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Summarizer> LargeProducer for CachedFilter<S> {
    async fn produce(&self) -> Result<Ibf> {
        let inner = &self.inner;
        let ibf = inner
            .cell
            .get_or_try_init(|| async {
                tracing::debug!(level = inner.level, "building cached filter");
                inner.source.summarize(inner.level).await
            })
            .await?;
        Ok(ibf.clone())
    }
}

/// Summarize an in-memory list of items.
pub fn from_items<T, F>(items: Vec<T>, serialize: F, config: FilterConfig) -> ItemsSummarizer<T, F>
where
    F: Fn(&T) -> Vec<u8>,
{
    ItemsSummarizer::new(items, serialize, config)
}

/// Summarize a stream of items, created afresh by `factory` per request.
pub fn from_stream<F, S>(factory: F, config: FilterConfig) -> StreamSummarizer<F>
where
    F: Fn() -> S,
    S: Stream,
{
    StreamSummarizer::new(factory, config)
}

/// Summarize JSON text produced per level.
pub fn from_json<P: SummaryProducer>(producer: P, config: FilterConfig) -> JsonSummarizer<P> {
    JsonSummarizer::new(producer, config)
}

/// Summarize by reducing a large filter.
pub fn from_large<P: LargeProducer>(producer: P) -> LargeSummarizer<P> {
    LargeSummarizer::new(producer)
}
