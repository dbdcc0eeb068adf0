use async_trait::async_trait;

use crate::domain::entities::ProfileCache;

// Port for retrieving the current time.
pub trait Clock: Send + Sync {
    fn now_epoch_millis(&self) -> u64;
}

// Port for the durable key-value capability that survives restarts. It
// holds the raw token plus the denormalized identity cache.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn read_token(&self) -> Result<Option<String>, String>;
    async fn write_token(&self, token: &str) -> Result<(), String>;
    async fn write_profile_cache(&self, cache: &ProfileCache) -> Result<(), String>;
    // Removes everything. Clearing an already-empty store is a no-op.
    async fn clear(&self) -> Result<(), String>;
}
