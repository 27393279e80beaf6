//! Adaptive reconciliation.
//!
//! The resolver asks both sides for a summary at the current level, subtracts
//! remote from local and peels. An incomplete decode doubles the table and
//! tries again, so the bytes exchanged track the size of the difference
//! rather than the size of the sets.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use bytes::Bytes;

use setrecon_core::{FilterConfig, Ibf};

use crate::error::{Result, SyncError};
use crate::summarizer::{ItemsSummarizer, Summarizer};

/// Deepest level a resolver may be configured to reach.
///
/// A round holds `2^level` buckets per side, each at least 56 bytes, so this
/// level already costs over 200 MiB per filter.
pub const MAX_RESOLVER_LEVEL: u32 = 22;

/// Configuration for a reconciliation.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Level of the first round.
    pub start_level: u32,
    /// Last level tried before giving up, at most [`MAX_RESOLVER_LEVEL`].
    pub max_level: u32,
    /// Timeout for both summaries of one round.
    pub round_timeout: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            start_level: 0,
            max_level: 20,
            round_timeout: Duration::from_secs(30),
        }
    }
}

impl ResolverConfig {
    /// Check the level range before any round is run.
    pub fn validate(&self) -> Result<()> {
        if self.max_level > MAX_RESOLVER_LEVEL {
            return Err(SyncError::InvalidConfig(format!(
                "max_level {} exceeds {}",
                self.max_level, MAX_RESOLVER_LEVEL
            )));
        }
        if self.start_level > self.max_level {
            return Err(SyncError::InvalidConfig(format!(
                "start_level {} is above max_level {}",
                self.start_level, self.max_level
            )));
        }
        Ok(())
    }
}

/// Outcome of a reconciliation.
///
/// `added` holds what the local side lacks, `removed` what it has that the
/// remote side does not. Both are ordered by serialized bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<T> {
    /// Items only the remote side holds.
    pub added: Vec<T>,
    /// Items only the local side holds.
    pub removed: Vec<T>,
    /// Level of the round that decoded.
    pub level: u32,
    /// Rounds run, the decoding one included.
    pub rounds: u32,
}

impl<T> Reconciliation<T> {
    /// True if both sides already held the same set.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Computes the difference between a local and a remote set.
pub struct Resolver<L, R, D> {
    local: L,
    remote: R,
    deserialize: D,
    config: ResolverConfig,
}

impl<L, R, D> Resolver<L, R, D> {
    /// Reconcile two summarizers, mapping recovered bytes through
    /// `deserialize`.
    pub fn from_summarizers(local: L, remote: R, deserialize: D) -> Self {
        Self {
            local,
            remote,
            deserialize,
            config: ResolverConfig::default(),
        }
    }

    /// Replace the default configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }
}

impl<T, S, R, D> Resolver<ItemsSummarizer<T, S>, R, D>
where
    S: Fn(&T) -> Vec<u8>,
{
    /// Reconcile a local item list against a remote summarizer.
    ///
    /// The local filters use the default configuration, so the remote side
    /// must too.
    pub fn from_items(items: Vec<T>, remote: R, serialize: S, deserialize: D) -> Self {
        Self::from_summarizers(
            ItemsSummarizer::new(items, serialize, FilterConfig::default()),
            remote,
            deserialize,
        )
    }
}

impl<L, R, D> Resolver<L, R, D>
where
    L: Summarizer,
    R: Summarizer,
{
    /// Run rounds until a decode completes.
    ///
    /// Fails with [`SyncError::LevelExhausted`] when no level up to
    /// `max_level` decodes. Any summarizer failure ends the reconciliation.
    pub async fn resolve<T, E>(&self) -> Result<Reconciliation<T>>
    where
        D: Fn(&[u8]) -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        self.config.validate()?;

        let mut level = self.config.start_level;
        let mut rounds = 0;
        while level <= self.config.max_level {
            rounds += 1;
            let (local, remote) = self.summaries(level).await?;
            let difference = local.subtract(&remote)?.decode();

            if difference.complete {
                let reconciliation = Reconciliation {
                    added: self.deserialize_all(difference.added)?,
                    removed: self.deserialize_all(difference.removed)?,
                    level,
                    rounds,
                };
                tracing::info!(
                    "Reconciled at level {} after {} rounds: {} added, {} removed",
                    level,
                    rounds,
                    reconciliation.added.len(),
                    reconciliation.removed.len()
                );
                return Ok(reconciliation);
            }

            tracing::debug!(
                "Incomplete decode at level {} ({} recovered)",
                level,
                difference.len()
            );
            level += 1;
        }

        tracing::warn!("No complete decode up to level {}", self.config.max_level);
        Err(SyncError::LevelExhausted {
            max_level: self.config.max_level,
        })
    }

    /// Request both summaries concurrently.
    async fn summaries(&self, level: u32) -> Result<(Ibf, Ibf)> {
        tracing::debug!("Requesting summaries at level {}", level);
        let both = async {
            tokio::try_join!(self.local.summarize(level), self.remote.summarize(level))
        };
        match tokio::time::timeout(self.config.round_timeout, both).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!("Timed out waiting for summaries at level {}", level);
                Err(SyncError::Timeout(format!(
                    "summaries at level {} not ready within {:?}",
                    level, self.config.round_timeout
                )))
            }
        }
    }

    fn deserialize_all<T, E>(&self, items: HashSet<Bytes>) -> Result<Vec<T>>
    where
        D: Fn(&[u8]) -> std::result::Result<T, E>,
        E: fmt::Display,
    {
        let mut items: Vec<Bytes> = items.into_iter().collect();
        items.sort();
        items
            .iter()
            .map(|item| (self.deserialize)(item).map_err(|e| SyncError::Deserialize(e.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summarizer::{from_items, from_json, Summarizer, SummarizerExt};
    use async_trait::async_trait;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    fn serialize(item: &Vec<u8>) -> Vec<u8> {
        item.clone()
    }

    fn deserialize(bytes: &[u8]) -> std::result::Result<Vec<u8>, Infallible> {
        Ok(bytes.to_vec())
    }

    fn summarizer(items: Vec<Vec<u8>>) -> ItemsSummarizer<Vec<u8>, fn(&Vec<u8>) -> Vec<u8>> {
        from_items(items, serialize as fn(&Vec<u8>) -> Vec<u8>, FilterConfig::default())
    }

    fn range(from: u16, to: u16) -> Vec<Vec<u8>> {
        (from..to).map(|i| i.to_be_bytes().to_vec()).collect()
    }

    #[tokio::test]
    async fn test_resolve_small_difference() {
        let local = summarizer(vec![vec![1, 2], vec![2, 2], vec![3, 2]]);
        let remote = summarizer(vec![vec![1, 2], vec![4, 2]]);

        let result = Resolver::from_summarizers(local, remote, deserialize)
            .resolve()
            .await
            .unwrap();

        assert_eq!(result.added, vec![vec![4, 2]]);
        assert_eq!(result.removed, vec![vec![2, 2], vec![3, 2]]);
    }

    #[tokio::test]
    async fn test_from_items() {
        let remote = summarizer(vec![vec![1, 2], vec![4, 2]]);
        let result = Resolver::from_items(
            vec![vec![1u8, 2], vec![2, 2], vec![3, 2]],
            remote,
            serialize,
            deserialize,
        )
        .resolve()
        .await
        .unwrap();

        assert_eq!(result.added, vec![vec![4, 2]]);
        assert_eq!(result.removed, vec![vec![2, 2], vec![3, 2]]);
    }

    #[tokio::test]
    async fn test_identical_sets_resolve_in_one_round() {
        let result = Resolver::from_summarizers(
            summarizer(range(0, 500)),
            summarizer(range(0, 500)),
            deserialize,
        )
        .resolve()
        .await
        .unwrap();

        assert!(result.is_empty());
        assert_eq!(result.level, 0);
        assert_eq!(result.rounds, 1);
    }

    #[tokio::test]
    async fn test_large_difference_grows_level() {
        let local = summarizer(range(0, 1000));
        let remote = summarizer(range(900, 1100));

        let result = Resolver::from_summarizers(local, remote, deserialize)
            .resolve()
            .await
            .unwrap();

        assert_eq!(result.removed, range(0, 900));
        assert_eq!(result.added, range(1000, 1100));
        assert!(result.level >= 10);
        assert_eq!(result.rounds, result.level + 1);
    }

    struct Recording<S> {
        inner: S,
        levels: Arc<Mutex<Vec<u32>>>,
    }

    #[async_trait]
    impl<S: Summarizer> Summarizer for Recording<S> {
        async fn summarize(&self, level: u32) -> Result<Ibf> {
            self.levels.lock().unwrap().push(level);
            self.inner.summarize(level).await
        }
    }

    #[tokio::test]
    async fn test_levels_requested_in_order() {
        let local_levels = Arc::new(Mutex::new(Vec::new()));
        let remote_levels = Arc::new(Mutex::new(Vec::new()));
        let local = Recording {
            inner: summarizer(range(0, 40)),
            levels: Arc::clone(&local_levels),
        };
        let remote = Recording {
            inner: summarizer(range(20, 40)),
            levels: Arc::clone(&remote_levels),
        };

        let config = ResolverConfig {
            start_level: 2,
            ..Default::default()
        };
        let result = Resolver::from_summarizers(local, remote, deserialize)
            .with_config(config)
            .resolve()
            .await
            .unwrap();

        let expected: Vec<u32> = (2..=result.level).collect();
        assert_eq!(*local_levels.lock().unwrap(), expected);
        assert_eq!(*remote_levels.lock().unwrap(), expected);
        assert_eq!(result.removed.len(), 20);
    }

    #[tokio::test]
    async fn test_remote_over_json() {
        let served = Arc::new(summarizer(vec![vec![1, 2], vec![4, 2]]));
        let remote = from_json(
            move |level: u32| {
                let served = Arc::clone(&served);
                async move { served.summarize_json(level).await }
            },
            FilterConfig::default(),
        );

        let local = summarizer(vec![vec![1, 2], vec![2, 2]]);
        let result = Resolver::from_summarizers(local, remote, deserialize)
            .resolve()
            .await
            .unwrap();

        assert_eq!(result.added, vec![vec![4, 2]]);
        assert_eq!(result.removed, vec![vec![2, 2]]);
    }

    #[tokio::test]
    async fn test_transport_error_ends_resolution() {
        let remote = from_json(
            |_level: u32| async {
                Err::<String, _>(SyncError::TransportError("peer unreachable".into()))
            },
            FilterConfig::default(),
        );

        let result = Resolver::from_summarizers(summarizer(range(0, 10)), remote, deserialize)
            .resolve()
            .await;
        assert!(matches!(result, Err(SyncError::TransportError(_))));
    }

    #[tokio::test]
    async fn test_level_exhausted() {
        let config = ResolverConfig {
            max_level: 1,
            ..Default::default()
        };
        let local = summarizer(range(0, 50));
        let result = Resolver::from_summarizers(local, summarizer(Vec::new()), deserialize)
            .with_config(config)
            .resolve()
            .await;
        assert!(matches!(result, Err(SyncError::LevelExhausted { max_level: 1 })));
    }

    #[tokio::test]
    async fn test_round_timeout() {
        let remote = from_json(
            |_level: u32| async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok::<_, SyncError>(String::new())
            },
            FilterConfig::default(),
        );
        let config = ResolverConfig {
            round_timeout: Duration::from_millis(50),
            ..Default::default()
        };

        let result = Resolver::from_summarizers(summarizer(range(0, 10)), remote, deserialize)
            .with_config(config)
            .resolve()
            .await;
        assert!(matches!(result, Err(SyncError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_deserialize_failure() {
        let result = Resolver::from_summarizers(
            summarizer(vec![vec![0xff, 0xfe]]),
            summarizer(Vec::new()),
            |bytes: &[u8]| String::from_utf8(bytes.to_vec()),
        )
        .resolve()
        .await;
        assert!(matches!(result, Err(SyncError::Deserialize(_))));
    }

    #[test]
    fn test_config_validation() {
        assert!(ResolverConfig::default().validate().is_ok());

        let inverted = ResolverConfig {
            start_level: 5,
            max_level: 3,
            ..Default::default()
        };
        assert!(matches!(inverted.validate(), Err(SyncError::InvalidConfig(_))));

        let deepest = ResolverConfig {
            max_level: MAX_RESOLVER_LEVEL,
            ..Default::default()
        };
        assert!(deepest.validate().is_ok());

        let too_deep = ResolverConfig {
            max_level: MAX_RESOLVER_LEVEL + 1,
            ..Default::default()
        };
        assert!(matches!(too_deep.validate(), Err(SyncError::InvalidConfig(_))));

        let filter_cap = ResolverConfig {
            max_level: setrecon_core::MAX_LEVEL,
            ..Default::default()
        };
        assert!(filter_cap.validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_config_rejected_before_any_round() {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let local = Recording {
            inner: summarizer(range(0, 3)),
            levels: Arc::clone(&levels),
        };
        let config = ResolverConfig {
            start_level: 9,
            max_level: 2,
            ..Default::default()
        };
        let result = Resolver::from_summarizers(local, summarizer(Vec::new()), deserialize)
            .with_config(config)
            .resolve()
            .await;
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
        assert!(levels.lock().unwrap().is_empty());
    }
}
