//! Feed pagination controller.
//!
//! Owns the ever-growing feed the presentation layer renders. Batches come
//! from a [`BatchSource`] and are appended in the order their loads resolve.
//!
//! # States
//!
//! `Idle → LoadingInitial → Ready`. A refresh re-enters `LoadingInitial`;
//! load-more is a sub-state of `Ready` guarded by a single-flight latch.
//!
//! # Stale results
//!
//! Every initial load bumps a generation counter. A batch whose load started
//! under an older generation is discarded when it resolves, so a slow load
//! from before a refresh can never overwrite or extend the refreshed feed.

use crate::config::Config;
use crate::decoration::DecorationPicker;
use crate::engine::BatchSource;
use crate::model::Poem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// User-visible feed failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// No source, not even the local corpus, produced a single poem.
    #[error("Failed to load poetry")]
    Empty,
}

/// Tunables for one controller.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    pub initial_batch_size: usize,
    pub page_size: usize,
    pub prefetch_lookahead: usize,
    /// Delay of the proactive load-more after an initial load. `None` disables it.
    pub prewarm_delay: Option<Duration>,
    pub min_refresh_display: Duration,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for FeedOptions {
    fn from(config: &Config) -> Self {
        Self {
            initial_batch_size: config.initial_batch_size.max(1),
            page_size: config.page_size.max(1),
            prefetch_lookahead: config.prefetch_lookahead,
            prewarm_delay: (config.prewarm_delay_ms > 0).then(|| config.prewarm_delay()),
            min_refresh_display: config.min_refresh_display(),
        }
    }
}

/// Immutable view of the feed for rendering.
///
/// `poems` and `decorations` are index-aligned and shared with the
/// controller, so taking a snapshot never copies the feed.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub poems: Arc<Vec<Poem>>,
    pub decorations: Arc<Vec<String>>,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub last_error: Option<FeedError>,
}

/// Lightweight change notification published after every state transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedStatus {
    pub len: usize,
    pub is_loading_initial: bool,
    pub is_loading_more: bool,
    pub is_refreshing: bool,
    pub last_error: Option<FeedError>,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct FeedState {
    // Mutations create a new Vec only when a snapshot still holds the old one
    poems: Arc<Vec<Poem>>,
    decorations: Arc<Vec<String>>,
    is_loading_initial: bool,
    is_loading_more: bool,
    is_refreshing: bool,
    last_error: Option<FeedError>,
    generation: u64,
    /// Bumped per refresh; only the newest refresh clears `is_refreshing`
    refresh_epoch: u64,
}

impl FeedState {
    fn status(&self) -> FeedStatus {
        FeedStatus {
            len: self.poems.len(),
            is_loading_initial: self.is_loading_initial,
            is_loading_more: self.is_loading_more,
            is_refreshing: self.is_refreshing,
            last_error: self.last_error.clone(),
            generation: self.generation,
        }
    }

    fn clear(&mut self) {
        self.poems = Arc::new(Vec::new());
        self.decorations = Arc::new(Vec::new());
    }
}

struct Inner {
    source: Arc<dyn BatchSource>,
    decorations: DecorationPicker,
    options: FeedOptions,
    state: Mutex<FeedState>,
    /// Single-flight latch for load-more
    loading_more: AtomicBool,
    prewarm: Mutex<Option<JoinHandle<()>>>,
    status_tx: watch::Sender<FeedStatus>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let slot = self.prewarm.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.take() {
            handle.abort();
        }
    }
}

/// Holds the load-more latch for the lifetime of one load.
struct LoadMoreLatch<'a> {
    feed: &'a FeedController,
}

impl Drop for LoadMoreLatch<'_> {
    fn drop(&mut self) {
        self.feed.state().is_loading_more = false;
        self.feed.inner.loading_more.store(false, Ordering::Release);
        self.feed.publish();
    }
}

/// Pagination and state controller for one feed.
///
/// Cloning is cheap; clones share the same feed.
#[derive(Clone)]
pub struct FeedController {
    inner: Arc<Inner>,
}

impl FeedController {
    pub fn new(
        source: Arc<dyn BatchSource>,
        decorations: DecorationPicker,
        options: FeedOptions,
    ) -> Self {
        let (status_tx, _) = watch::channel(FeedStatus::default());
        Self {
            inner: Arc::new(Inner {
                source,
                decorations,
                options,
                state: Mutex::new(FeedState::default()),
                loading_more: AtomicBool::new(false),
                prewarm: Mutex::new(None),
                status_tx,
            }),
        }
    }

    /// Receive a [`FeedStatus`] after every transition.
    pub fn subscribe(&self) -> watch::Receiver<FeedStatus> {
        self.inner.status_tx.subscribe()
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.state();
        FeedSnapshot {
            poems: Arc::clone(&state.poems),
            decorations: Arc::clone(&state.decorations),
            is_loading_initial: state.is_loading_initial,
            is_loading_more: state.is_loading_more,
            is_refreshing: state.is_refreshing,
            last_error: state.last_error.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.state().poems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the feed with a fresh initial batch.
    ///
    /// Returns the number of poems installed; zero if the batch was empty or
    /// superseded by a newer load before it resolved.
    pub async fn load_initial(&self) -> usize {
        self.run_initial().await
    }

    /// Append one more page to the feed.
    ///
    /// Returns `false` without requesting anything if a load-more is already
    /// in flight. Triggers are dropped, not queued. An empty page is silent.
    pub async fn load_more(&self) -> bool {
        if self
            .inner
            .loading_more
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::trace!("Load-more already in flight, dropping trigger");
            return false;
        }
        // Released on every exit, including when this future is dropped mid-fetch
        let _latch = LoadMoreLatch { feed: self };

        let generation = {
            let mut state = self.state();
            state.is_loading_more = true;
            state.generation
        };
        self.publish();

        let page_size = self.inner.options.page_size;
        let poems = self.inner.source.fetch_batch(page_size).await;

        {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(
                    expected = state.generation,
                    got = generation,
                    "Ignoring stale load-more batch (generation mismatch)"
                );
            } else if !poems.is_empty() {
                let tokens = self.inner.decorations.pick(poems.len());
                let added = poems.len();
                Arc::make_mut(&mut state.poems).extend(poems);
                Arc::make_mut(&mut state.decorations).extend(tokens);
                tracing::debug!(added = added, total = state.poems.len(), "Appended page");
            }
        }
        true
    }

    /// Clear the feed and load it again.
    ///
    /// The refreshing flag stays set for at least the configured minimum so
    /// a fast refresh is still visible.
    pub async fn refresh(&self) {
        let started = Instant::now();
        let epoch = {
            let mut state = self.state();
            state.refresh_epoch = state.refresh_epoch.wrapping_add(1);
            state.is_refreshing = true;
            state.clear();
            state.refresh_epoch
        };
        self.publish();

        self.run_initial().await;

        let min = self.inner.options.min_refresh_display;
        let elapsed = started.elapsed();
        if elapsed < min {
            tokio::time::sleep(min - elapsed).await;
        }

        {
            let mut state = self.state();
            // A newer refresh owns the flag now
            if state.refresh_epoch == epoch {
                state.is_refreshing = false;
            }
        }
        self.publish();
    }

    /// Manual retry from the error state.
    pub async fn retry(&self) {
        self.refresh().await;
    }

    /// Whether an item at `index` is close enough to the tail to prefetch.
    pub fn should_prefetch(&self, index: usize) -> bool {
        let len = self.len();
        len > 0 && index.saturating_add(self.inner.options.prefetch_lookahead) >= len
    }

    /// Presentation layer hook: the item at `index` became visible.
    ///
    /// Loads another page when `index` is within the lookahead window of the
    /// tail. Returns whether a page was requested.
    pub async fn on_visible(&self, index: usize) -> bool {
        if !self.should_prefetch(index) {
            return false;
        }
        self.load_more().await
    }

    /// Abort the scheduled prewarm, if any.
    pub fn shutdown(&self) {
        self.cancel_prewarm();
    }

    async fn run_initial(&self) -> usize {
        self.cancel_prewarm();

        let generation = {
            let mut state = self.state();
            state.generation = state.generation.wrapping_add(1);
            state.clear();
            state.is_loading_initial = true;
            state.last_error = None;
            state.generation
        };
        self.publish();
        tracing::debug!(generation, "Starting initial load");

        let poems = self
            .inner
            .source
            .fetch_batch(self.inner.options.initial_batch_size)
            .await;

        let installed = {
            let mut state = self.state();
            if state.generation != generation {
                tracing::debug!(
                    expected = state.generation,
                    got = generation,
                    "Ignoring stale initial batch (generation mismatch)"
                );
                return 0;
            }

            state.is_loading_initial = false;
            if poems.is_empty() {
                tracing::error!("Initial load produced no poems");
                state.last_error = Some(FeedError::Empty);
                0
            } else {
                let count = poems.len();
                state.decorations = Arc::new(self.inner.decorations.pick(count));
                state.poems = Arc::new(poems);
                count
            }
        };
        self.publish();

        if installed > 0 {
            tracing::info!(poems = installed, generation, "Feed loaded");
            self.schedule_prewarm();
        }
        installed
    }

    /// Load the next page shortly after an initial load, before the user can
    /// reach the tail. The task holds only a weak reference to the feed.
    fn schedule_prewarm(&self) {
        let Some(delay) = self.inner.options.prewarm_delay else {
            return;
        };

        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                FeedController { inner }.load_more().await;
            }
        });

        let previous = self.prewarm_slot().replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_prewarm(&self) {
        if let Some(handle) = self.prewarm_slot().take() {
            handle.abort();
        }
    }

    fn publish(&self) {
        let status = self.state().status();
        self.inner.status_tx.send_replace(status);
    }

    // Locks are never held across an await, so a poisoned lock only means a
    // panic elsewhere; the state itself is still consistent.
    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn prewarm_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner.prewarm.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::SampleCorpus;
    use crate::engine::FeedEngine;
    use crate::model::{Category, Poet};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicI64, AtomicUsize};

    fn poem(id: i64) -> Poem {
        Poem {
            id,
            title: format!("P{id}"),
            url_slug: String::new(),
            plain_text: "v".to_string(),
            html_text: "<p>v</p>".to_string(),
            poet: Poet::unknown(),
            category: Category::unknown(),
        }
    }

    /// Source handing out sequential ids after an optional delay.
    struct Counting {
        calls: AtomicUsize,
        next_id: AtomicI64,
        delay: Duration,
        empty: bool,
    }

    impl Counting {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                next_id: AtomicI64::new(1),
                delay,
                empty: false,
            })
        }

        fn empty() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                next_id: AtomicI64::new(1),
                delay: Duration::ZERO,
                empty: true,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BatchSource for Counting {
        async fn fetch_batch(&self, count: usize) -> Vec<Poem> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let first = self.next_id.fetch_add(count as i64, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.empty {
                return Vec::new();
            }
            (first..first + count as i64).map(poem).collect()
        }
    }

    fn options() -> FeedOptions {
        FeedOptions {
            initial_batch_size: 20,
            page_size: 5,
            prefetch_lookahead: 3,
            prewarm_delay: None,
            min_refresh_display: Duration::ZERO,
        }
    }

    fn controller(source: Arc<dyn BatchSource>, options: FeedOptions) -> FeedController {
        FeedController::new(source, DecorationPicker::default(), options)
    }

    fn ids(snapshot: &FeedSnapshot) -> Vec<i64> {
        snapshot.poems.iter().map(|p| p.id).collect()
    }

    #[tokio::test]
    async fn test_initial_load_installs_batch_and_tokens() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(source.clone(), options());

        assert_eq!(feed.load_initial().await, 20);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.poems.len(), 20);
        assert_eq!(snapshot.decorations.len(), 20);
        assert!(!snapshot.is_loading_initial);
        assert_eq!(snapshot.last_error, None);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_append_preserves_initial_prefix() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(source.clone(), options());

        feed.load_initial().await;
        let initial = ids(&feed.snapshot());

        for _ in 0..3 {
            assert!(feed.load_more().await);
        }

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.poems.len(), 20 + 3 * 5);
        assert_eq!(snapshot.decorations.len(), snapshot.poems.len());
        assert_eq!(&ids(&snapshot)[..20], &initial[..]);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_load_more_issues_one_request() {
        let source = Counting::new(Duration::from_millis(100));
        let feed = controller(source.clone(), options());

        let (first, second) = tokio::join!(feed.load_more(), feed.load_more());

        assert!(first);
        assert!(!second);
        assert_eq!(source.calls(), 1);
        assert_eq!(feed.len(), 5);
        assert!(!feed.snapshot().is_loading_more);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latch_released_after_load() {
        let source = Counting::new(Duration::from_millis(100));
        let feed = controller(source.clone(), options());

        assert!(feed.load_more().await);
        assert!(feed.load_more().await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_source_surfaces_error() {
        let feed = controller(Counting::empty(), options());

        assert_eq!(feed.load_initial().await, 0);

        let snapshot = feed.snapshot();
        assert!(snapshot.poems.is_empty());
        assert!(!snapshot.is_loading_initial);
        assert_eq!(snapshot.last_error, Some(FeedError::Empty));
    }

    #[tokio::test]
    async fn test_empty_page_is_silent() {
        let feed = controller(Counting::empty(), options());
        assert!(feed.load_more().await);

        let snapshot = feed.snapshot();
        assert!(snapshot.poems.is_empty());
        assert_eq!(snapshot.last_error, None);
        assert!(!snapshot.is_loading_more);
    }

    #[tokio::test]
    async fn test_offline_engine_populates_from_corpus() {
        let engine = Arc::new(FeedEngine::offline(Arc::new(SampleCorpus)));
        let feed = controller(engine, options());

        assert_eq!(feed.load_initial().await, 20);
        let snapshot = feed.snapshot();
        assert!(!snapshot.is_loading_initial);
        assert_eq!(snapshot.last_error, None);
        assert!(snapshot.poems.iter().all(|p| (1..=10).contains(&p.id)));
    }

    #[tokio::test]
    async fn test_refresh_replaces_feed() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(source.clone(), options());

        feed.load_initial().await;
        feed.load_more().await;
        feed.refresh().await;

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.poems.len(), 20);
        // Ids continue from the previous loads: 1..=25 were used before
        assert_eq!(snapshot.poems[0].id, 26);
        assert!(!snapshot.is_refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_indicator_has_minimum_duration() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(
            source,
            FeedOptions {
                min_refresh_display: Duration::from_millis(600),
                ..options()
            },
        );

        let started = Instant::now();
        feed.refresh().await;
        assert!(started.elapsed() >= Duration::from_millis(600));
        assert!(!feed.snapshot().is_refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_initial_load_discarded() {
        let source = Counting::new(Duration::from_millis(100));
        let feed = controller(source.clone(), options());

        let slow = feed.clone();
        let stale = tokio::spawn(async move { slow.load_initial().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // The refresh starts after the first load and supersedes it
        feed.refresh().await;
        assert_eq!(stale.await.unwrap(), 0);

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.poems.len(), 20);
        assert_eq!(snapshot.poems[0].id, 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_load_more_discarded_after_refresh() {
        let source = Counting::new(Duration::from_millis(100));
        let feed = controller(source.clone(), options());
        feed.load_initial().await;

        let pager = feed.clone();
        let page = tokio::spawn(async move { pager.load_more().await });
        tokio::time::sleep(Duration::from_millis(10)).await;

        feed.refresh().await;
        assert!(page.await.unwrap());

        // Only the refreshed batch remains; the in-flight page was dropped
        assert_eq!(feed.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prewarm_loads_next_page() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(
            source.clone(),
            FeedOptions {
                prewarm_delay: Some(Duration::from_secs(2)),
                ..options()
            },
        );

        feed.load_initial().await;
        assert_eq!(feed.len(), 20);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(feed.len(), 25);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prewarm_cancelled_on_shutdown() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(
            source.clone(),
            FeedOptions {
                prewarm_delay: Some(Duration::from_secs(2)),
                ..options()
            },
        );

        feed.load_initial().await;
        feed.shutdown();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prewarm_skipped_when_controller_dropped() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(
            source.clone(),
            FeedOptions {
                prewarm_delay: Some(Duration::from_secs(2)),
                ..options()
            },
        );

        feed.load_initial().await;
        drop(feed);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_prefetch_window() {
        let feed = controller(Counting::new(Duration::ZERO), options());
        assert!(!feed.should_prefetch(0)); // Empty feed never prefetches

        feed.load_initial().await;
        assert!(!feed.should_prefetch(0));
        assert!(!feed.should_prefetch(16));
        assert!(feed.should_prefetch(17));
        assert!(feed.should_prefetch(19));
    }

    #[tokio::test]
    async fn test_on_visible_triggers_load_more_near_tail() {
        let source = Counting::new(Duration::ZERO);
        let feed = controller(source.clone(), options());
        feed.load_initial().await;

        assert!(!feed.on_visible(5).await);
        assert_eq!(feed.len(), 20);

        assert!(feed.on_visible(18).await);
        assert_eq!(feed.len(), 25);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_subscribers_see_final_status() {
        let feed = controller(Counting::new(Duration::ZERO), options());
        let mut rx = feed.subscribe();

        feed.load_initial().await;

        assert!(rx.has_changed().unwrap());
        let status = rx.borrow_and_update().clone();
        assert_eq!(status.len, 20);
        assert!(!status.is_loading_initial);
        assert_eq!(status.generation, 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_error_state() {
        let feed = controller(Counting::empty(), options());
        feed.load_initial().await;
        assert_eq!(feed.snapshot().last_error, Some(FeedError::Empty));

        feed.retry().await;
        // Still empty, but the error was reset and re-raised by the new load
        assert_eq!(feed.snapshot().last_error, Some(FeedError::Empty));
        assert_eq!(feed.subscribe().borrow().generation, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_during_prewarm_fetch_releases_latch() {
        let source = Counting::new(Duration::from_millis(500));
        let feed = controller(
            source.clone(),
            FeedOptions {
                prewarm_delay: Some(Duration::from_secs(2)),
                ..options()
            },
        );

        feed.load_initial().await;
        // The prewarm fires at 2s and is now mid-fetch
        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert!(feed.snapshot().is_loading_more);

        feed.refresh().await;
        feed.shutdown();
        assert!(!feed.snapshot().is_loading_more);

        let calls = source.calls();
        assert!(feed.on_visible(feed.len() - 1).await);
        assert_eq!(source.calls(), calls + 1);
        assert_eq!(feed.len(), 25);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_load_more_releases_latch() {
        let source = Counting::new(Duration::from_millis(500));
        let feed = controller(source.clone(), options());

        let abandoned = tokio::time::timeout(Duration::from_millis(100), feed.load_more()).await;
        assert!(abandoned.is_err());
        assert!(!feed.snapshot().is_loading_more);

        assert!(feed.load_more().await);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_initial_overtaking_refresh_clears_indicator() {
        let source = Counting::new(Duration::from_millis(200));
        let feed = controller(
            source,
            FeedOptions {
                min_refresh_display: Duration::from_millis(600),
                ..options()
            },
        );

        let refresher = feed.clone();
        let refresh = tokio::spawn(async move { refresher.refresh().await });
        tokio::time::sleep(Duration::from_millis(100)).await;

        feed.load_initial().await;
        refresh.await.unwrap();

        let snapshot = feed.snapshot();
        assert!(!snapshot.is_refreshing);
        assert!(!snapshot.is_loading_initial);
        assert_eq!(snapshot.poems.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refreshes_newest_owns_indicator() {
        let source = Counting::new(Duration::from_millis(200));
        let feed = controller(
            source,
            FeedOptions {
                min_refresh_display: Duration::from_millis(600),
                ..options()
            },
        );

        let first = feed.clone();
        let first = tokio::spawn(async move { first.refresh().await });
        tokio::time::sleep(Duration::from_millis(500)).await;

        let second = feed.clone();
        let second = tokio::spawn(async move { second.refresh().await });
        first.await.unwrap();
        // The second refresh is still inside its minimum display window
        assert!(feed.snapshot().is_refreshing);

        second.await.unwrap();
        assert!(!feed.snapshot().is_refreshing);
    }
}
