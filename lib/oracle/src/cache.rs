// TTL caching for oracle lookups
use ahash::AHashMap;
use parking_lot::Mutex;
use reelsim_core::{Category, CategoryOracle, CategorySet, ExternalRecord, Result};
use std::hash::Hash;
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Categories rarely change, so a day is the default freshness window
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 3600);

/// Thread-safe map whose entries expire after a fixed time-to-live
pub struct TtlCache<K, V> {
    entries: Mutex<AHashMap<K, (Instant, V)>>,
    ttl: Duration,
}

impl<K: Eq + Hash + Clone, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(AHashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some((stored, value)) if stored.elapsed() < self.ttl => return Some(value.clone()),
            Some(_) => {}
            None => return None,
        }
        // expired
        entries.remove(key);
        None
    }

    pub fn insert(&self, key: K, value: V) {
        self.entries.lock().insert(key, (Instant::now(), value));
    }

    /// Return the cached value or compute, store and return it.
    ///
    /// The lock is not held while `compute` runs. Errors are returned as-is and
    /// never cached.
    pub fn get_or_try_insert_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(cached) = self.get(&key) {
            return Ok(cached);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drop expired entries
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, (stored, _)| stored.elapsed() < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Wraps an oracle and memoises all three lookups for `ttl`
pub struct CachedOracle<O> {
    inner: O,
    resolved: TtlCache<String, Option<ExternalRecord>>,
    record_categories: TtlCache<String, CategorySet>,
    category_list: TtlCache<(), Vec<Category>>,
}

impl<O: CategoryOracle> CachedOracle<O> {
    pub fn new(inner: O) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: O, ttl: Duration) -> Self {
        Self {
            inner,
            resolved: TtlCache::new(ttl),
            record_categories: TtlCache::new(ttl),
            category_list: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    /// Drop expired entries from every lookup cache, returning how many went
    pub fn purge_expired(&self) -> usize {
        self.resolved.purge_expired()
            + self.record_categories.purge_expired()
            + self.category_list.purge_expired()
    }

    pub fn len(&self) -> usize {
        self.resolved.len() + self.record_categories.len() + self.category_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<O: CategoryOracle + 'static> CachedOracle<O> {
    /// Purge expired entries every `interval` on a background thread.
    ///
    /// The thread holds a weak reference and exits once the oracle is dropped.
    pub fn start_background_purge(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let oracle: Weak<Self> = Arc::downgrade(self);
        std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            let Some(oracle) = oracle.upgrade() else {
                break;
            };
            let purged = oracle.purge_expired();
            if purged > 0 {
                tracing::debug!(oracle = oracle.name(), purged, "Purged expired oracle cache entries");
            }
        })
    }
}

impl<O: CategoryOracle> CategoryOracle for CachedOracle<O> {
    fn resolve(&self, title: &str) -> Result<Option<ExternalRecord>> {
        self.resolved
            .get_or_try_insert_with(title.to_string(), || self.inner.resolve(title))
    }

    fn categories_of(&self, record_id: &str) -> Result<CategorySet> {
        self.record_categories
            .get_or_try_insert_with(record_id.to_string(), || self.inner.categories_of(record_id))
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.category_list
            .get_or_try_insert_with((), || self.inner.categories())
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}
