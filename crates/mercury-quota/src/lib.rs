//! Hourly per-group quota deduction.
//!
//! A compare-and-set on a single Redis key isn't enough here: the read of
//! the current balance, the comparison against the cost, and the write of
//! the new balance have to happen as one unit, or two concurrent binds for
//! the same group can both pass the check against the same stale balance.
//! `mercury-store`'s burn-on-read gets away with a single `GETDEL`; this
//! needs a real compare-and-decrement, so it's the one place in the service
//! that reaches for a Lua script.

use chrono::Utc;
use mercury_core::{MercuryError, QUOTA_PREFIX, QUOTA_TTL_SECS};
use once_cell::sync::Lazy;
use redis::aio::ConnectionManager;
use redis::Script;

/// `KEYS[1]` = quota key, `ARGV[1]` = default balance if unset,
/// `ARGV[2]` = cost to deduct, `ARGV[3]` = TTL in seconds.
///
/// Returns the remaining balance, or `-1` if the deduction would take the
/// balance below zero (in which case nothing is written).
static DEDUCT_SCRIPT: Lazy<Script> = Lazy::new(|| {
    Script::new(
        r#"
        local current = redis.call('GET', KEYS[1])
        if current == false then
            current = tonumber(ARGV[1])
        else
            current = tonumber(current)
        end
        local cost = tonumber(ARGV[2])
        if current < cost then
            return -1
        end
        local remaining = current - cost
        redis.call('SET', KEYS[1], remaining, 'EX', ARGV[3])
        return remaining
        "#,
    )
});

pub struct QuotaManager {
    redis: ConnectionManager,
    default_hourly: i64,
}

impl QuotaManager {
    pub fn new(redis: ConnectionManager, default_hourly: i64) -> Self {
        Self { redis, default_hourly }
    }

    fn quota_key(group: &str) -> String {
        let hour = Utc::now().format("%Y%m%d%H");
        format!("{QUOTA_PREFIX}:{group}:{hour}")
    }

    /// Deduct `cost` credits from `group`'s balance for the current UTC hour.
    /// Returns the remaining balance on success, or
    /// `MercuryError::QuotaExceeded` if the deduction would go negative.
    pub async fn deduct(&self, group: &str, cost: i64) -> Result<i64, MercuryError> {
        let mut conn = self.redis.clone();
        let key = Self::quota_key(group);

        let remaining: i64 = DEDUCT_SCRIPT
            .key(&key)
            .arg(self.default_hourly)
            .arg(cost)
            .arg(QUOTA_TTL_SECS)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| MercuryError::Quota(format!("deducting {cost} from {group}: {e}")))?;

        if remaining < 0 {
            return Err(MercuryError::QuotaExceeded { group: group.to_string() });
        }

        Ok(remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_key_is_scoped_to_group_and_hour() {
        let key = QuotaManager::quota_key("export-pipelines");
        assert!(key.starts_with(&format!("{QUOTA_PREFIX}:export-pipelines:")));
        // 10-digit YYYYMMDDHH suffix.
        let suffix = key.rsplit(':').next().unwrap();
        assert_eq!(suffix.len(), 10);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}
