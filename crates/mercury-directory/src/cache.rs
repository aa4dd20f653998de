use std::sync::Arc;

use async_trait::async_trait;
use mercury_core::{MercuryError, MEMBER_CACHE_PREFIX};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::warn;

use crate::DirectoryClient;

/// Wraps any [`DirectoryClient`] with a short-TTL Redis cache of membership
/// decisions, keyed `ldap:member:{user}:{group}` → `"0"`/`"1"`.
///
/// Cache writes are best-effort: a Redis hiccup on write never fails the
/// enclosing `is_member` call, it just means the next lookup pays the full
/// directory round trip again.
pub struct DirectoryCache<C> {
    inner: Arc<C>,
    redis: ConnectionManager,
    ttl_secs: u64,
}

impl<C: DirectoryClient> DirectoryCache<C> {
    pub fn new(inner: Arc<C>, redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { inner, redis, ttl_secs }
    }

    fn cache_key(user: &str, group: &str) -> String {
        format!("{MEMBER_CACHE_PREFIX}:{user}:{group}")
    }
}

#[async_trait]
impl<C: DirectoryClient> DirectoryClient for DirectoryCache<C> {
    async fn is_member(&self, user: &str, group: &str) -> Result<bool, MercuryError> {
        let key = Self::cache_key(user, group);
        let mut conn = self.redis.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(cached)) => return Ok(cached == "1"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "directory cache read failed, falling through to directory"),
        }

        let member = self.inner.is_member(user, group).await?;

        let value = if member { "1" } else { "0" };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(&key, value, self.ttl_secs)
            .await
        {
            warn!(error = %e, "directory cache write failed, continuing without cache");
        }

        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_uses_configured_prefix() {
        assert_eq!(
            DirectoryCache::<crate::MockDirectoryClient>::cache_key("alice", "finance"),
            format!("{MEMBER_CACHE_PREFIX}:alice:finance")
        );
    }
}
