//! The volatile key store: `mercury:key:{uuid}` → base64 AES-256 key, with a
//! TTL and burn-on-read semantics.

use mercury_core::{MercuryError, KEY_PREFIX};
use mercury_crypto::GeneratedKey;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub struct KeyStore {
    redis: ConnectionManager,
}

impl KeyStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn key_for(uuid: &str) -> String {
        format!("{KEY_PREFIX}:{uuid}")
    }

    /// Generate a fresh AES-256 key and bind it to `uuid` for `ttl_secs`.
    /// Returns the base64-encoded key. Overwrites any key already bound to
    /// this uuid — the caller (the admission pipeline) is responsible for
    /// deciding whether a rebind should be allowed.
    pub async fn bind(&self, uuid: &str, ttl_secs: u64) -> Result<String, MercuryError> {
        let key = GeneratedKey::generate();
        let encoded = key.to_base64();

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(Self::key_for(uuid), &encoded, ttl_secs)
            .await
            .map_err(|e| MercuryError::Store(format!("binding key for {uuid}: {e}")))?;

        Ok(encoded)
    }

    /// Atomically fetch and delete the key bound to `uuid`. A single `GETDEL`
    /// round trip gives us burn-on-read for free — no Lua script needed,
    /// unlike the quota deduction in `mercury-quota`.
    pub async fn burn_on_read(&self, uuid: &str) -> Result<String, MercuryError> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn
            .get_del(Self::key_for(uuid))
            .await
            .map_err(|e| MercuryError::Store(format!("retrieving key for {uuid}: {e}")))?;

        value.ok_or(MercuryError::KeyNotFound)
    }
}

#[cfg(test)]
mod tests {
    // `ConnectionManager` has no in-process fake, so exercising `bind` and
    // `burn_on_read` against real Redis semantics is covered by
    // `mercury-node`'s integration tests (MERCURY_TEST_REDIS_URL). The
    // key-prefix format is cheap to pin down here without a connection.
    use super::*;

    #[test]
    fn key_for_uses_configured_prefix() {
        assert_eq!(KeyStore::key_for("abc-123"), format!("{KEY_PREFIX}:abc-123"));
    }
}
