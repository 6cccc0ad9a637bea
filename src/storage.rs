use anyhow::Result;
use async_trait::async_trait;

/// Key/value payload store with expiry, backing [`crate::fetch::CachedFetcher`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Payload for `key` if it expires after `now` (epoch seconds).
    async fn get_cache(&self, key: &str, now: i64) -> Result<Option<String>>;
    async fn put_cache(&self, key: &str, payload: &str, expires_at: i64) -> Result<()>;
}
