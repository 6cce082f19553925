//! In-process entity cache backed by DashMap for lock-free concurrent reads.
//! Sits in front of the hosted data store so sibling views stop refetching
//! the same tables; every write path invalidates explicitly.

use appdesk_core::types::Entity;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
}

/// Snapshot of a full-table read: row order as the store returned it.
struct ListSnapshot {
    ids: Vec<Uuid>,
    loaded_at: Instant,
}

/// Per-entity cache keyed by row id.
///
/// Single rows and the full list are tracked separately: a row fetched by id
/// does not make the list fresh, and `invalidate` drops both.
///
/// Fills are tagged with the generation read before the store was queried.
/// `invalidate` bumps the generation, so a fill that started before a write
/// and lands after it is discarded instead of caching pre-write rows.
pub struct EntityCache<T: Entity> {
    store: DashMap<Uuid, CacheEntry<T>>,
    list: RwLock<Option<ListSnapshot>>,
    generation: AtomicU64,
    ttl: Duration,
    max_entries: usize,
}

impl<T: Entity> EntityCache<T> {
    pub fn new(ttl_secs: u64, max_entries: usize) -> Self {
        Self {
            store: DashMap::new(),
            list: RwLock::new(None),
            generation: AtomicU64::new(0),
            ttl: Duration::from_secs(ttl_secs),
            max_entries,
        }
    }

    /// Get a row by id, returns None if expired or missing.
    pub fn get(&self, id: &Uuid) -> Option<T> {
        let Some(entry) = self.store.get(id) else {
            metrics::counter!("cache.miss", "table" => T::TABLE.as_str()).increment(1);
            return None;
        };
        if entry.inserted_at.elapsed() > self.ttl {
            drop(entry);
            self.store.remove(id);
            metrics::counter!("cache.miss", "table" => T::TABLE.as_str()).increment(1);
            return None;
        }
        metrics::counter!("cache.hit", "table" => T::TABLE.as_str()).increment(1);
        Some(entry.value.clone())
    }

    /// The full table as last loaded, in store order. None once the list is
    /// stale, invalidated, or any of its rows has been evicted.
    pub fn list(&self) -> Option<Vec<T>> {
        let guard = self.list.read();
        let snapshot = match guard.as_ref() {
            Some(s) if s.loaded_at.elapsed() <= self.ttl => s,
            _ => {
                metrics::counter!("cache.miss", "table" => T::TABLE.as_str()).increment(1);
                return None;
            }
        };

        let mut rows = Vec::with_capacity(snapshot.ids.len());
        for id in &snapshot.ids {
            match self.store.get(id) {
                Some(entry) => rows.push(entry.value.clone()),
                None => {
                    metrics::counter!("cache.miss", "table" => T::TABLE.as_str()).increment(1);
                    return None;
                }
            }
        }
        metrics::counter!("cache.hit", "table" => T::TABLE.as_str()).increment(1);
        Some(rows)
    }

    /// Current generation. Read it before querying the store and pass it to
    /// `put` or `replace_all` with the result.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Insert or update a single row read at `generation`. Returns false
    /// when the cache was invalidated since.
    pub fn put(&self, generation: u64, value: T) -> bool {
        // Holding the list lock keeps `invalidate` out until the row is in.
        let _guard = self.list.read();
        if generation != self.generation() {
            debug!(table = %T::TABLE, "Stale row discarded");
            return false;
        }
        let id = value.id();
        // At capacity, rows with new ids are not cached.
        if self.store.len() >= self.max_entries && !self.store.contains_key(&id) {
            return false;
        }
        self.store.insert(
            id,
            CacheEntry {
                value,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Replace the cached table with a full read taken at `generation`.
    /// Tables larger than the capacity are not cached at all. Returns false
    /// when nothing was cached.
    pub fn replace_all(&self, generation: u64, rows: &[T]) -> bool {
        let mut list = self.list.write();
        if generation != self.generation() {
            debug!(table = %T::TABLE, "Stale table read discarded");
            return false;
        }
        self.store.clear();
        if rows.len() > self.max_entries {
            *list = None;
            debug!(table = %T::TABLE, rows = rows.len(), "Table exceeds cache capacity, not cached");
            return false;
        }

        let now = Instant::now();
        let ids = rows.iter().map(|r| r.id()).collect();
        for row in rows {
            self.store.insert(
                row.id(),
                CacheEntry {
                    value: row.clone(),
                    inserted_at: now,
                },
            );
        }
        *list = Some(ListSnapshot { ids, loaded_at: now });
        true
    }

    /// Drop every cached row and the list snapshot, and start a new
    /// generation.
    pub fn invalidate(&self) {
        let mut list = self.list.write();
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.store.clear();
        *list = None;
        metrics::counter!("cache.invalidate", "table" => T::TABLE.as_str()).increment(1);
        debug!(table = %T::TABLE, "Cache invalidated");
    }

    /// Remove expired entries. Call this periodically from a background task.
    pub fn evict_expired(&self) -> usize {
        let before = self.store.len();
        self.store
            .retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
        before - self.store.len()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
