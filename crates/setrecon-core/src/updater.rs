//! Push-style item producers.
//!
//! Some sources cannot be pulled: they call back with each item and then
//! signal that they are finished. [`updater`] bridges that shape to the
//! stream [`Ibf::add_many`] folds:
//!
//! ```rust
//! # futures::executor::block_on(async {
//! use setrecon_core::{updater, FilterConfig, Ibf};
//!
//! let (sink, source) = updater();
//! sink.item(b"first".to_vec());
//! sink.done();
//! assert!(!sink.item(b"late".to_vec()));
//!
//! let ibf = Ibf::new(6, FilterConfig::default())
//!     .unwrap()
//!     .add_many(source)
//!     .await
//!     .unwrap();
//! assert_eq!(ibf.decode().removed.len(), 1);
//! # });
//! ```
//!
//! [`Ibf::add_many`]: crate::Ibf::add_many

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::channel::mpsc;
use futures::{Stream, StreamExt};

enum Signal {
    Item(Bytes),
    Done,
}

/// Create a connected sink and source.
pub fn updater() -> (ItemSink, ItemSource) {
    let (tx, rx) = mpsc::unbounded();
    let sink = ItemSink {
        tx,
        completed: Arc::new(AtomicBool::new(false)),
    };
    let source = ItemSource {
        rx,
        finished: false,
    };
    (sink, source)
}

/// Pushing half of an updater. Clones share the completed flag.
#[derive(Clone)]
pub struct ItemSink {
    tx: mpsc::UnboundedSender<Signal>,
    completed: Arc<AtomicBool>,
}

impl ItemSink {
    /// Push one item.
    ///
    /// Returns `false` when the item was dropped: after [`done`] was called
    /// or once the source is gone.
    ///
    /// [`done`]: ItemSink::done
    pub fn item(&self, content: impl Into<Bytes>) -> bool {
        if self.completed.load(Ordering::Acquire) {
            return false;
        }
        self.tx.unbounded_send(Signal::Item(content.into())).is_ok()
    }

    /// Signal the end of the items. Only the first call has an effect.
    pub fn done(&self) {
        if !self.completed.swap(true, Ordering::AcqRel) {
            let _ = self.tx.unbounded_send(Signal::Done);
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed.load(Ordering::Acquire)
    }
}

/// Pulling half of an updater.
///
/// Ends at the done marker, or when every sink has been dropped. Anything
/// sent after the marker is never yielded.
pub struct ItemSource {
    rx: mpsc::UnboundedReceiver<Signal>,
    finished: bool,
}

impl Stream for ItemSource {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_next_unpin(cx) {
            Poll::Ready(Some(Signal::Item(content))) => Poll::Ready(Some(content)),
            Poll::Ready(Some(Signal::Done)) | Poll::Ready(None) => {
                self.finished = true;
                self.rx.close();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FilterConfig, Ibf};

    async fn collect(source: ItemSource) -> Vec<Bytes> {
        source.collect().await
    }

    #[tokio::test]
    async fn test_items_before_done_are_yielded() {
        let (sink, source) = updater();
        assert!(sink.item(vec![1u8]));
        assert!(sink.item(vec![2u8]));
        sink.done();
        assert_eq!(
            collect(source).await,
            vec![Bytes::from_static(&[1]), Bytes::from_static(&[2])]
        );
    }

    #[tokio::test]
    async fn test_items_after_done_are_dropped() {
        let (sink, source) = updater();
        sink.item(vec![1u8]);
        sink.done();
        assert!(sink.is_done());
        assert!(!sink.item(vec![2u8]));
        assert_eq!(collect(source).await, vec![Bytes::from_static(&[1])]);
    }

    #[tokio::test]
    async fn test_clone_shares_completion() {
        let (sink, source) = updater();
        let other = sink.clone();
        sink.item(vec![1u8]);
        other.done();
        assert!(!sink.item(vec![2u8]));
        assert_eq!(collect(source).await.len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_sinks_ends_source() {
        let (sink, source) = updater();
        sink.item(vec![7u8]);
        drop(sink);
        assert_eq!(collect(source).await, vec![Bytes::from_static(&[7])]);
    }

    #[tokio::test]
    async fn test_late_item_absent_from_filter() {
        let (sink, source) = updater();
        let config = FilterConfig::default();
        let pending = tokio::spawn(async move {
            Ibf::new(6, config).unwrap().add_many(source).await.unwrap()
        });

        sink.item(b"kept".to_vec());
        sink.done();
        sink.item(b"late".to_vec());

        let ibf = pending.await.unwrap();
        let diff = ibf.decode();
        assert!(diff.complete);
        assert_eq!(diff.removed.len(), 1);
        assert!(diff.removed.contains(&Bytes::from_static(b"kept")));
    }

    #[tokio::test]
    async fn test_remove_many_from_updater() {
        let (sink, source) = updater();
        sink.item(b"gone".to_vec());
        sink.done();
        let ibf = Ibf::new(6, FilterConfig::default())
            .unwrap()
            .remove_many(source)
            .await
            .unwrap();
        assert!(ibf.decode().added.contains(&Bytes::from_static(b"gone")));
    }
}
