//! Remote acquisition strategies.
//!
//! Each strategy is one narrow way of pulling poems from the API. They are
//! independent on purpose: an endpoint that misbehaves starves only its own
//! strategy. Every strategy is best-effort: a failed or timed-out request
//! contributes nothing and the rest of the strategy carries on.

use crate::model::Poem;
use crate::remote::client::{ApiClient, FetchError};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use rand::seq::{index, SliceRandom};
use std::future::Future;
use std::sync::Arc;

/// Well-known poets, searched by name in the corpus language.
pub const SEARCH_TERMS: &[&str] = &[
    "حافظ",
    "سعدی",
    "مولوی",
    "فردوسی",
    "خیام",
    "عطار",
    "نظامی",
    "باباطاهر",
];

/// Archive ids of well-known poets.
pub const KNOWN_POET_IDS: &[i64] = &[2, 3, 4, 5, 7, 9, 22, 28];

/// One independent tactic for sourcing poems.
#[async_trait]
pub trait FetchStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Collect up to roughly `target` poems. Never fails.
    async fn fetch(&self, target: usize) -> Vec<Poem>;
}

/// Fetches poems by randomly chosen numeric ids.
pub struct IdProbe {
    client: Arc<ApiClient>,
    id_range_max: i64,
    max_probes: usize,
    concurrency: usize,
}

impl IdProbe {
    pub fn new(
        client: Arc<ApiClient>,
        id_range_max: i64,
        max_probes: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            client,
            id_range_max,
            max_probes,
            concurrency: concurrency.max(1),
        }
    }

    /// Distinct ids in `1..=id_range_max`, at most `count` of them.
    fn candidate_ids(&self, count: usize) -> Vec<i64> {
        let range = usize::try_from(self.id_range_max).unwrap_or(0);
        let amount = count.min(self.max_probes).min(range);
        index::sample(&mut rand::thread_rng(), range, amount)
            .into_iter()
            .map(|i| i as i64 + 1)
            .collect()
    }
}

#[async_trait]
impl FetchStrategy for IdProbe {
    fn name(&self) -> &'static str {
        "id_probe"
    }

    async fn fetch(&self, target: usize) -> Vec<Poem> {
        let ids = self.candidate_ids(target);
        let probes = ids.len();

        let poems: Vec<Poem> = fan_out(ids, self.concurrency, |id| {
            let client = Arc::clone(&self.client);
            async move { client.poem_by_id(id).await }
        })
        .await;

        tracing::debug!(
            strategy = self.name(),
            probes = probes,
            found = poems.len(),
            "Id probing finished"
        );
        poems
    }
}

/// Searches for each well-known poet name and keeps a fair share of each
/// result list.
pub struct KeywordSearch {
    client: Arc<ApiClient>,
    terms: Vec<String>,
    concurrency: usize,
}

impl KeywordSearch {
    pub fn new(client: Arc<ApiClient>, terms: Vec<String>, concurrency: usize) -> Self {
        Self {
            client,
            terms,
            concurrency: concurrency.max(1),
        }
    }

    pub fn with_default_terms(client: Arc<ApiClient>, concurrency: usize) -> Self {
        let terms = SEARCH_TERMS.iter().map(|t| t.to_string()).collect();
        Self::new(client, terms, concurrency)
    }
}

#[async_trait]
impl FetchStrategy for KeywordSearch {
    fn name(&self) -> &'static str {
        "keyword_search"
    }

    async fn fetch(&self, target: usize) -> Vec<Poem> {
        if target == 0 || self.terms.is_empty() {
            return Vec::new();
        }
        let share = fair_share(target, self.terms.len());

        let poems = fan_out_lists(self.terms.clone(), self.concurrency, share, |term| {
            let client = Arc::clone(&self.client);
            async move { client.search(&term).await }
        })
        .await;

        tracing::debug!(
            strategy = self.name(),
            terms = self.terms.len(),
            share = share,
            found = poems.len(),
            "Keyword search finished"
        );
        poems
    }
}

/// Lists poems of each well-known poet and keeps a fair share of each.
pub struct PoetProbe {
    client: Arc<ApiClient>,
    poet_ids: Vec<i64>,
    concurrency: usize,
}

impl PoetProbe {
    pub fn new(client: Arc<ApiClient>, poet_ids: Vec<i64>, concurrency: usize) -> Self {
        Self {
            client,
            poet_ids,
            concurrency: concurrency.max(1),
        }
    }

    pub fn with_known_poets(client: Arc<ApiClient>, concurrency: usize) -> Self {
        Self::new(client, KNOWN_POET_IDS.to_vec(), concurrency)
    }
}

#[async_trait]
impl FetchStrategy for PoetProbe {
    fn name(&self) -> &'static str {
        "poet_probe"
    }

    async fn fetch(&self, target: usize) -> Vec<Poem> {
        if target == 0 || self.poet_ids.is_empty() {
            return Vec::new();
        }
        let share = fair_share(target, self.poet_ids.len());

        let poems = fan_out_lists(self.poet_ids.clone(), self.concurrency, share, |poet_id| {
            let client = Arc::clone(&self.client);
            async move { client.poems_by_poet(poet_id).await }
        })
        .await;

        tracing::debug!(
            strategy = self.name(),
            poets = self.poet_ids.len(),
            share = share,
            found = poems.len(),
            "Poet probing finished"
        );
        poems
    }
}

/// Ceiling of `target / parts`, never zero.
pub(crate) fn fair_share(target: usize, parts: usize) -> usize {
    target.div_ceil(parts.max(1)).max(1)
}

/// Run one single-poem request per key with bounded concurrency, keeping
/// only successes.
async fn fan_out<K, F, Fut>(keys: Vec<K>, concurrency: usize, request: F) -> Vec<Poem>
where
    K: Copy + std::fmt::Debug,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Poem, FetchError>>,
{
    stream::iter(keys)
        .map(|key| {
            let fut = request(key);
            async move { (key, fut.await) }
        })
        .buffer_unordered(concurrency)
        .filter_map(|(key, result)| async move {
            match result {
                Ok(poem) => Some(poem),
                Err(e) => {
                    tracing::debug!(key = ?key, error = %e, "Request yielded nothing");
                    None
                }
            }
        })
        .collect()
        .await
}

/// Run one list request per key with bounded concurrency. Each list is
/// shuffled and cut to `share` before being merged.
async fn fan_out_lists<K, F, Fut>(
    keys: Vec<K>,
    concurrency: usize,
    share: usize,
    request: F,
) -> Vec<Poem>
where
    K: Clone + std::fmt::Debug,
    F: Fn(K) -> Fut,
    Fut: Future<Output = Result<Vec<Poem>, FetchError>>,
{
    let lists: Vec<Vec<Poem>> = stream::iter(keys)
        .map(|key| {
            let fut = request(key.clone());
            async move { (key, fut.await) }
        })
        .buffer_unordered(concurrency)
        .filter_map(|(key, result)| async move {
            match result {
                Ok(poems) => Some(poems),
                Err(e) => {
                    tracing::debug!(key = ?key, error = %e, "Request yielded nothing");
                    None
                }
            }
        })
        .collect()
        .await;

    let mut rng = rand::thread_rng();
    lists
        .into_iter()
        .flat_map(|mut poems| {
            poems.shuffle(&mut rng);
            poems.truncate(share);
            poems
        })
        .collect()
}
