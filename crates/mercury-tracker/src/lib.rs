//! Request-lifecycle tracking and the `xzmercury:events` pub/sub feed.
//!
//! Every transition is persisted to `request:{id}` before it is published:
//! a subscriber that misses an event can still recover the current state by
//! fetching the record, but a record with no corresponding event is merely a
//! missed notification, not a correctness problem. Publishing is therefore
//! best-effort and never fails the call that triggered it.

use chrono::Utc;
use mercury_core::{MercuryError, RequestId, RequestState, Timestamp, EVENTS_CHANNEL, REQUEST_PREFIX};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Persisted record of one bind attempt, from admission through consumption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: String,
    pub package_uuid: String,
    pub pipeline_name: String,
    pub caller: String,
    pub state: RequestState,
    pub reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Event published on `xzmercury:events` for every state transition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub request_id: String,
    pub package_uuid: String,
    pub pipeline_name: String,
    pub state: RequestState,
    pub timestamp: Timestamp,
}

pub struct Tracker {
    redis: ConnectionManager,
}

impl Tracker {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn record_key(id: &str) -> String {
        format!("{REQUEST_PREFIX}:{id}")
    }

    async fn persist(&self, record: &RequestRecord) -> Result<(), MercuryError> {
        let mut conn = self.redis.clone();
        let body = serde_json::to_string(record)
            .map_err(|e| MercuryError::Tracker(format!("serializing request record: {e}")))?;
        conn.set_ex::<_, _, ()>(Self::record_key(&record.id), body, mercury_core::REQUEST_TTL_SECS)
            .await
            .map_err(|e| MercuryError::Tracker(format!("persisting request {}: {e}", record.id)))
    }

    async fn publish(&self, record: &RequestRecord) {
        let event = Event {
            request_id: record.id.clone(),
            package_uuid: record.package_uuid.clone(),
            pipeline_name: record.pipeline_name.clone(),
            state: record.state,
            timestamp: record.updated_at,
        };
        let mut conn = self.redis.clone();
        match serde_json::to_string(&event) {
            Ok(body) => {
                if let Err(e) = conn.publish::<_, _, ()>(EVENTS_CHANNEL, body).await {
                    warn!(error = %e, request_id = %record.id, "failed to publish request event");
                }
            }
            Err(e) => warn!(error = %e, "failed to serialize request event"),
        }
    }

    /// Record a freshly approved bind.
    pub async fn create(
        &self,
        package_uuid: &str,
        pipeline: &str,
        caller: &str,
    ) -> Result<RequestRecord, MercuryError> {
        let now = Utc::now().timestamp();
        let record = RequestRecord {
            id: RequestId::generate().as_str().to_string(),
            package_uuid: package_uuid.to_string(),
            pipeline_name: pipeline.to_string(),
            caller: caller.to_string(),
            state: RequestState::Approved,
            reason: None,
            created_at: now,
            updated_at: now,
        };
        self.persist(&record).await?;
        self.publish(&record).await;
        Ok(record)
    }

    /// Record a bind that was rejected before a key was ever bound — still
    /// tracked so the admission history is complete.
    pub async fn reject(
        &self,
        package_uuid: &str,
        pipeline: &str,
        caller: &str,
        reason: &str,
    ) -> Result<RequestRecord, MercuryError> {
        let now = Utc::now().timestamp();
        let record = RequestRecord {
            id: RequestId::generate().as_str().to_string(),
            package_uuid: package_uuid.to_string(),
            pipeline_name: pipeline.to_string(),
            caller: caller.to_string(),
            state: RequestState::Rejected,
            reason: Some(reason.to_string()),
            created_at: now,
            updated_at: now,
        };
        self.persist(&record).await?;
        self.publish(&record).await;
        Ok(record)
    }

    /// Transition an approved request to consumed once its key has been
    /// burned on read.
    pub async fn mark_consumed(&self, request_id: &str) -> Result<RequestRecord, MercuryError> {
        let mut record = self.get(request_id).await?;
        record.state = RequestState::Consumed;
        record.updated_at = Utc::now().timestamp();
        self.persist(&record).await?;
        self.publish(&record).await;
        Ok(record)
    }

    pub async fn get(&self, request_id: &str) -> Result<RequestRecord, MercuryError> {
        let mut conn = self.redis.clone();
        let body: Option<String> = conn
            .get(Self::record_key(request_id))
            .await
            .map_err(|e| MercuryError::Tracker(format!("fetching request {request_id}: {e}")))?;
        let body = body.ok_or_else(|| MercuryError::RequestNotFound(request_id.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|e| MercuryError::Tracker(format!("deserializing request {request_id}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_key_uses_configured_prefix() {
        assert_eq!(Tracker::record_key("abc"), format!("{REQUEST_PREFIX}:abc"));
    }
}
