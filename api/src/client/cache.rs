use std::{future::Future, sync::Arc, time::Duration};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Time-expiring memo of API responses, keyed by request.
///
/// There is no invalidation besides expiry and [`ResponseCache::clear`], and
/// failed fetches are never stored.
#[derive(Clone)]
pub struct ResponseCache<V> {
    entries: Arc<retainer::Cache<String, V>>,
    ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    pub fn new(ttl: Duration) -> Self {
        ResponseCache {
            entries: Arc::new(retainer::Cache::new()),
            ttl,
        }
    }

    pub async fn get_or_fetch<F, Fut, E>(&self, key: String, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.entries.get(&key).await {
            tracing::trace!(%key, "Response cache hit");
            return Ok(V::clone(&hit));
        }

        let value = fetch().await?;
        self.entries.insert(key, value.clone(), self.ttl).await;

        Ok(value)
    }

    pub async fn clear(&self) {
        self.entries.clear().await;
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
