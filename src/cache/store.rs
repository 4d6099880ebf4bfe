//! Entity cache storage.
//!
//! Two independent bounded maps sit in front of the post and user
//! repositories. Entries expire a fixed interval after the write that
//! produced them; reads never extend an entry's life, so a hot but
//! unwritten entity still falls through to the store on schedule.
//! LRU eviction keeps each map at or below its configured capacity.

use std::num::NonZeroUsize;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use lru::LruCache;
use metrics::counter;

use crate::domain::entities::{PostRecord, UserRecord};

use super::config::CacheConfig;
use super::lock::rw_write;

const SOURCE: &str = "cache::store";

struct Expiring<V> {
    value: V,
    expires_at: Instant,
}

enum Probe<V> {
    Hit(V),
    Expired,
    Absent,
}

/// A bounded key→snapshot map with write-time expiry.
pub struct EntityCache<V: Clone> {
    entity: &'static str,
    ttl: Duration,
    entries: RwLock<LruCache<i64, Expiring<V>>>,
}

impl<V: Clone> EntityCache<V> {
    pub fn new(entity: &'static str, capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            entity,
            ttl,
            entries: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Look up a snapshot. Expired entries behave as absent and are
    /// dropped; the expiry clock is never reset by a read.
    pub fn get(&self, id: i64) -> Option<V> {
        let now = Instant::now();
        let mut entries = rw_write(&self.entries, SOURCE, "get");

        let probe = match entries.get(&id) {
            Some(entry) if now < entry.expires_at => Probe::Hit(entry.value.clone()),
            Some(_) => Probe::Expired,
            None => Probe::Absent,
        };

        match probe {
            Probe::Hit(value) => {
                counter!("vellum_cache_hit_total", "entity" => self.entity).increment(1);
                Some(value)
            }
            Probe::Expired => {
                entries.pop(&id);
                counter!("vellum_cache_expired_total", "entity" => self.entity).increment(1);
                counter!("vellum_cache_miss_total", "entity" => self.entity).increment(1);
                None
            }
            Probe::Absent => {
                counter!("vellum_cache_miss_total", "entity" => self.entity).increment(1);
                None
            }
        }
    }

    /// Store a snapshot, overwriting unconditionally and resetting the
    /// expiry clock.
    pub fn put(&self, id: i64, value: V) {
        let entry = Expiring {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        let evicted = rw_write(&self.entries, SOURCE, "put").push(id, entry);
        if evicted.is_some_and(|(key, _)| key != id) {
            counter!("vellum_cache_evict_total", "entity" => self.entity).increment(1);
        }
    }

    /// Remove a snapshot if present. Returns whether one was removed.
    pub fn invalidate(&self, id: i64) -> bool {
        rw_write(&self.entries, SOURCE, "invalidate")
            .pop(&id)
            .is_some()
    }

    pub fn clear(&self) {
        rw_write(&self.entries, SOURCE, "clear").clear();
    }

    pub fn len(&self) -> usize {
        rw_write(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The process-wide pair of entity caches.
pub struct CacheStore {
    pub posts: EntityCache<PostRecord>,
    pub users: EntityCache<UserRecord>,
}

impl CacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            posts: EntityCache::new("post", config.post_limit_non_zero(), config.post_ttl()),
            users: EntityCache::new("user", config.user_limit_non_zero(), config.user_ttl()),
        }
    }

    /// Empty both maps without destroying them.
    pub fn clear_all(&self) {
        self.posts.clear();
        self.users.clear();
    }
}
