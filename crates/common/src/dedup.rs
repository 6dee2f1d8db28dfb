//! Request de-duplication cache
//!
//! Collapses concurrent calls that share a key into a single in-flight
//! operation and serves the shared outcome to late joiners for a short
//! TTL. Keys are opaque strings; callers choose granularity (a status
//! probe might use a fixed key, a search should fold its parameters
//! into the key).
//!
//! Guarantees:
//! - For all calls with the same key inside the TTL window, the
//!   underlying operation runs exactly once; every caller observes the
//!   same success value or the same error.
//! - The entry is registered before the first await, so callers racing
//!   within the same scheduler tick still coalesce.
//! - Failed entries are evicted immediately; the very next call runs
//!   the operation again (no negative caching). Expired entries are
//!   swept whenever a new entry is registered, so the map stays
//!   bounded by the live working set even under high key churn.
//! - A caller dropping its future does not cancel the operation for
//!   the remaining waiters, and does not poison the entry.

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::debug;

/// Default TTL for successful results.
pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

type SharedOutcome<T, E> = Shared<BoxFuture<'static, Result<T, E>>>;

struct CacheEntry<T, E>
where
    T: Clone,
    E: Clone,
{
    outcome: SharedOutcome<T, E>,
    inserted_at: Instant,
    ttl: Duration,
    generation: u64,
}

impl<T: Clone, E: Clone> CacheEntry<T, E> {
    fn is_live(&self) -> bool {
        self.inserted_at.elapsed() <= self.ttl
    }
}

struct CacheStorage<T, E>
where
    T: Clone,
    E: Clone,
{
    data: HashMap<String, CacheEntry<T, E>>,
    insertion_counter: u64,
}

/// Keyed single-flight cache for async operations.
///
/// # Type Parameters
///
/// * `T` - Success value (must implement `Clone` so the shared outcome
///   can fan out to every waiter)
/// * `E` - Error value (same requirement)
pub struct RequestCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    storage: Mutex<CacheStorage<T, E>>,
    default_ttl: Duration,
}

impl<T, E> Default for RequestCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> RequestCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Clone + Send + Sync + 'static,
{
    /// Create a cache with the default TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache whose `execute` calls use the given TTL.
    #[must_use]
    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self {
            storage: Mutex::new(CacheStorage { data: HashMap::new(), insertion_counter: 0 }),
            default_ttl,
        }
    }

    /// Run `request_fn` under `key`, coalescing with any live entry.
    ///
    /// # Errors
    /// Propagates the shared operation's error to every waiter; the
    /// entry is evicted before the error is returned.
    pub async fn execute<F, Fut>(&self, key: &str, request_fn: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        self.execute_with_ttl(key, self.default_ttl, request_fn).await
    }

    /// Run `request_fn` under `key` with an explicit TTL for the result.
    ///
    /// # Errors
    /// Propagates the shared operation's error to every waiter.
    pub async fn execute_with_ttl<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        request_fn: F,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let (outcome, generation) = {
            let mut storage = self.storage.lock();
            match storage.data.get(key) {
                Some(entry) if entry.is_live() => {
                    debug!(key = %key, "joining in-flight or cached request");
                    (entry.outcome.clone(), entry.generation)
                }
                _ => {
                    // Keys churn freely (searches fold parameters into
                    // the key), so dead entries are reclaimed here
                    // rather than left to accumulate.
                    storage.data.retain(|_, entry| entry.is_live());
                    storage.insertion_counter += 1;
                    let generation = storage.insertion_counter;
                    // Registered before the first await so same-tick
                    // callers coalesce onto this future.
                    let outcome = request_fn().boxed().shared();
                    storage.data.insert(
                        key.to_string(),
                        CacheEntry {
                            outcome: outcome.clone(),
                            inserted_at: Instant::now(),
                            ttl,
                            generation,
                        },
                    );
                    debug!(key = %key, "registered new request");
                    (outcome, generation)
                }
            }
        };

        let result = outcome.await;

        if result.is_err() {
            // Evict only the entry this caller awaited; a newer entry
            // under the same key belongs to a fresh attempt.
            let mut storage = self.storage.lock();
            if storage.data.get(key).is_some_and(|entry| entry.generation == generation) {
                storage.data.remove(key);
                debug!(key = %key, "evicted failed request");
            }
        }

        result
    }

    /// Remove a single entry.
    pub fn invalidate(&self, key: &str) {
        self.storage.lock().data.remove(key);
    }

    /// Remove every entry.
    pub fn invalidate_all(&self) {
        self.storage.lock().data.clear();
    }

    /// Whether a live (non-expired) entry exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.storage.lock().data.get(key).is_some_and(CacheEntry::is_live)
    }

    /// Number of stored entries, expired ones included until the next
    /// sweep.
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.lock().data.len()
    }

    /// Whether the cache holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.lock().data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    type TestCache = RequestCache<String, String>;

    fn counting_fn(
        calls: &Arc<AtomicUsize>,
        value: &str,
        delay: Duration,
    ) -> impl Future<Output = Result<String, String>> + Send + 'static {
        let calls = calls.clone();
        let value = value.to_string();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(value)
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_invocation() {
        let cache = Arc::new(TestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            cache.execute("k", || counting_fn(&calls, "v", Duration::from_millis(20))),
            cache.execute("k", || counting_fn(&calls, "v", Duration::from_millis(20))),
            cache.execute("k", || counting_fn(&calls, "v", Duration::from_millis(20))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "v");
        assert_eq!(b.unwrap(), "v");
        assert_eq!(c.unwrap(), "v");
    }

    #[tokio::test]
    async fn late_joiner_within_ttl_gets_cached_result() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache.execute("k", || counting_fn(&calls, "v", Duration::ZERO)).await;
        assert_eq!(first.unwrap(), "v");

        let second = cache.execute("k", || counting_fn(&calls, "other", Duration::ZERO)).await;
        assert_eq!(second.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_triggers_fresh_invocation() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_millis(50);

        cache
            .execute_with_ttl("k", ttl, || counting_fn(&calls, "v1", Duration::ZERO))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(70)).await;

        let second = cache
            .execute_with_ttl("k", ttl, || counting_fn(&calls, "v2", Duration::ZERO))
            .await;
        assert_eq!(second.unwrap(), "v2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = {
            let calls = calls.clone();
            move || {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                }
            }
        };

        let first = cache.execute("k", failing.clone()).await;
        assert_eq!(first.unwrap_err(), "boom");
        assert!(!cache.contains("k"));

        // Immediately subsequent call retries fresh.
        let second = cache.execute("k", failing).await;
        assert_eq!(second.unwrap_err(), "boom");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn concurrent_callers_share_the_same_error() {
        let cache = Arc::new(TestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let failing = |calls: &Arc<AtomicUsize>| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<String, _>("down".to_string())
            }
        };

        let (a, b) = tokio::join!(
            cache.execute("k", || failing(&calls)),
            cache.execute("k", || failing(&calls)),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap_err(), "down");
        assert_eq!(b.unwrap_err(), "down");
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_cancel_others() {
        let cache = Arc::new(TestCache::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let waiter = {
            let calls = calls.clone();
            cache.execute("k", move || counting_fn(&calls, "v", Duration::from_millis(30)))
        };
        let aborted = tokio::time::timeout(Duration::from_millis(5), waiter).await;
        assert!(aborted.is_err());

        // The entry survives the aborted waiter; a new caller joins the
        // same in-flight operation and gets the real result.
        let calls2 = calls.clone();
        let result = cache
            .execute("k", move || counting_fn(&calls2, "other", Duration::ZERO))
            .await;
        assert_eq!(result.unwrap(), "v");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entries_are_swept_on_insert() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let ttl = Duration::from_millis(10);

        // Churn through distinct keys, as a parameter-keyed search does.
        for i in 0..8 {
            cache
                .execute_with_ttl(&format!("k{i}"), ttl, || {
                    counting_fn(&calls, "v", Duration::ZERO)
                })
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(30)).await;

        cache
            .execute_with_ttl("fresh", ttl, || counting_fn(&calls, "v", Duration::ZERO))
            .await
            .unwrap();

        // Only the freshly registered entry survives the sweep.
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("fresh"));
    }

    #[tokio::test]
    async fn invalidate_clears_one_key_and_all() {
        let cache = TestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.execute("a", || counting_fn(&calls, "1", Duration::ZERO)).await.unwrap();
        cache.execute("b", || counting_fn(&calls, "2", Duration::ZERO)).await.unwrap();

        cache.invalidate("a");
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));

        cache.invalidate_all();
        assert!(!cache.contains("b"));
    }
}
