use std::time::{Duration, Instant};

use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted: Instant,
}

/// A single value that expires `ttl` after it was stored.
#[derive(Debug)]
pub struct TimedCache<V> {
    ttl: Duration,
    slot: RwLock<Option<CacheEntry<V>>>,
}

impl<V: Clone> TimedCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub async fn get(&self) -> Option<V> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|entry| entry.inserted.elapsed() <= self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn set(&self, value: V) {
        *self.slot.write().await = Some(CacheEntry {
            value,
            inserted: Instant::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_get_set() {
        let cache = TimedCache::new(Duration::from_millis(50));
        assert_eq!(cache.get().await, None);
        cache.set("ja-JP").await;
        assert_eq!(cache.get().await, Some("ja-JP"));
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let cache = TimedCache::new(Duration::from_millis(10));
        cache.set(1u32).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(cache.get().await, None);
    }

    #[tokio::test]
    async fn test_set_replaces_value() {
        let cache = TimedCache::new(Duration::from_secs(60));
        cache.set(1u32).await;
        cache.set(2u32).await;
        assert_eq!(cache.get().await, Some(2));
    }
}
