//! Feed acquisition engine.
//!
//! Fans a batch request out to every remote strategy, merges and
//! deduplicates what comes back, and tops up any shortfall from the local
//! corpus. [`BatchSource::fetch_batch`] has no error type: a total remote
//! outage degrades to local content instead of failing the caller.

use crate::cache::{NoopCache, PoemCache};
use crate::config::Config;
use crate::corpus::PoemSource;
use crate::model::Poem;
use crate::remote::{ApiClient, FetchError, FetchStrategy, IdProbe, KeywordSearch, PoetProbe};
use async_trait::async_trait;
use futures::future::join_all;
use rand::seq::SliceRandom;
use std::collections::HashSet;
use std::sync::Arc;

/// Anything that can hand the feed a batch of poems.
#[async_trait]
pub trait BatchSource: Send + Sync {
    /// Returns `count` poems whenever any source can supply them. Never fails.
    async fn fetch_batch(&self, count: usize) -> Vec<Poem>;
}

/// Concurrent multi-strategy acquisition with local fallback.
pub struct FeedEngine {
    strategies: Vec<Box<dyn FetchStrategy>>,
    source: Arc<dyn PoemSource>,
    cache: Arc<dyn PoemCache>,
    client: Option<Arc<ApiClient>>,
    fetch_one_retries: u32,
}

impl FeedEngine {
    /// Engine with no remote strategies. Every batch comes from the cache
    /// and the local corpus.
    pub fn offline(source: Arc<dyn PoemSource>) -> Self {
        Self {
            strategies: Vec::new(),
            source,
            cache: Arc::new(NoopCache),
            client: None,
            fetch_one_retries: 0,
        }
    }

    /// Engine wired to the remote API with the three standard strategies.
    pub fn from_config(
        config: &Config,
        source: Arc<dyn PoemSource>,
        cache: Arc<dyn PoemCache>,
    ) -> Result<Self, FetchError> {
        let client = Arc::new(ApiClient::new(&config.api_base_url, config.timeouts)?);
        let concurrency = config.probe_concurrency;

        Ok(Self::offline(source)
            .with_cache(cache)
            .with_client(Arc::clone(&client), config.fetch_one_retries)
            .with_strategy(IdProbe::new(
                Arc::clone(&client),
                config.id_range_max,
                config.max_id_probes,
                concurrency,
            ))
            .with_strategy(KeywordSearch::with_default_terms(
                Arc::clone(&client),
                concurrency,
            ))
            .with_strategy(PoetProbe::with_known_poets(client, concurrency)))
    }

    pub fn with_strategy(mut self, strategy: impl FetchStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn PoemCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Client used by [`FeedEngine::fetch_one`].
    pub fn with_client(mut self, client: Arc<ApiClient>, retries: u32) -> Self {
        self.client = Some(client);
        self.fetch_one_retries = retries;
        self
    }

    pub fn strategy_count(&self) -> usize {
        self.strategies.len()
    }

    /// Fetch one random poem, independent of batch acquisition.
    ///
    /// Retries transient failures, then falls back to a corpus poem. Returns
    /// `None` only if the corpus is empty.
    pub async fn fetch_one(&self) -> Option<Poem> {
        if let Some(client) = &self.client {
            match client.random_poem_with_retry(self.fetch_one_retries).await {
                Ok(poem) => return Some(poem),
                Err(e) => {
                    tracing::warn!(error = %e, "Random poem unavailable, using local corpus");
                }
            }
        }
        self.source.sample_poems().into_iter().next()
    }

    /// Run every strategy concurrently and merge their output.
    async fn fetch_remote(&self, count: usize) -> Vec<Poem> {
        if self.strategies.is_empty() {
            return Vec::new();
        }

        let share = count.div_ceil(self.strategies.len());
        let results = join_all(self.strategies.iter().map(|s| async move {
            let poems = s.fetch(share).await;
            tracing::debug!(strategy = s.name(), share = share, found = poems.len(), "Strategy finished");
            poems
        }))
        .await;

        let merged: Vec<Poem> = results.into_iter().flatten().collect();
        let raw = merged.len();
        let unique = dedup_by_id(merged);
        tracing::debug!(raw = raw, unique = unique.len(), "Merged remote results");
        unique
    }

    /// Poems saved by earlier successful fetches.
    async fn cached(&self) -> Vec<Poem> {
        match self.cache.load_cached().await {
            Ok(poems) => dedup_by_id(poems),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read poem cache");
                Vec::new()
            }
        }
    }

    /// Draw `count` corpus poems, preferring ids not in `exclude`. Repeats
    /// only once the corpus is exhausted.
    fn fill_from_corpus(&self, count: usize, exclude: &HashSet<i64>) -> Vec<Poem> {
        let mut fill: Vec<Poem> = self
            .source
            .sample_poems()
            .into_iter()
            .filter(|p| !exclude.contains(&p.id))
            .take(count)
            .collect();

        while fill.len() < count {
            let round = self.source.sample_poems();
            if round.is_empty() {
                break;
            }
            let needed = count - fill.len();
            fill.extend(round.into_iter().take(needed));
        }
        fill
    }
}

#[async_trait]
impl BatchSource for FeedEngine {
    async fn fetch_batch(&self, count: usize) -> Vec<Poem> {
        if count == 0 {
            return Vec::new();
        }

        let remote = self.fetch_remote(count).await;
        let mut primary = if remote.is_empty() {
            if !self.strategies.is_empty() {
                tracing::warn!(count = count, "Remote returned nothing, falling back to local content");
            }
            self.cached().await
        } else {
            if let Err(e) = self.cache.save(&remote).await {
                tracing::warn!(error = %e, "Failed to save fetched poems to cache");
            }
            remote
        };

        primary.shuffle(&mut rand::thread_rng());
        if primary.len() >= count {
            primary.truncate(count);
            return primary;
        }

        let exclude: HashSet<i64> = primary.iter().map(|p| p.id).collect();
        let shortfall = count - primary.len();
        let fill = self.fill_from_corpus(shortfall, &exclude);
        tracing::info!(
            fetched = primary.len(),
            backfilled = fill.len(),
            requested = count,
            "Backfilled batch from local corpus"
        );

        // Fetched content leads; corpus filler follows
        primary.extend(fill);
        primary
    }
}

/// Keep the first poem seen for each id.
pub fn dedup_by_id(poems: Vec<Poem>) -> Vec<Poem> {
    let mut seen = HashSet::with_capacity(poems.len());
    poems.into_iter().filter(|p| seen.insert(p.id)).collect()
}
