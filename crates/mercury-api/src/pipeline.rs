//! The admission pipeline: the fixed seven-step `bind` ordering and
//! four-step `retrieve` ordering, composed from the five components it
//! gates against.

use std::sync::Arc;

use mercury_acl::PolicyTable;
use mercury_core::{Caller, MercuryError};
use mercury_directory::DirectoryClient;
use mercury_quota::QuotaManager;
use mercury_store::KeyStore;
use mercury_tracker::Tracker;
use tracing::{error, warn};

pub struct BindOutcome {
    pub request_id: String,
    pub key_b64: String,
    pub hmac: String,
    pub group: String,
    pub quota_remaining: i64,
}

pub struct RetrieveOutcome {
    pub key_b64: String,
}

pub struct AdmissionPipeline {
    directory: Arc<dyn DirectoryClient>,
    policy: PolicyTable,
    keys: KeyStore,
    quota: QuotaManager,
    tracker: Tracker,
    server_secret: String,
    key_ttl_secs: u64,
}

impl AdmissionPipeline {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        policy: PolicyTable,
        keys: KeyStore,
        quota: QuotaManager,
        tracker: Tracker,
        server_secret: String,
        key_ttl_secs: u64,
    ) -> Self {
        Self {
            directory,
            policy,
            keys,
            quota,
            tracker,
            server_secret,
            key_ttl_secs,
        }
    }

    /// Steps 1 (field presence already validated by the caller) through 7 of
    /// the bind ordering.
    pub async fn bind(
        &self,
        package_uuid: &str,
        pipeline_name: &str,
        caller_raw: &str,
    ) -> Result<BindOutcome, MercuryError> {
        // Step 2: policy lookup.
        let policy = self.policy.lookup(pipeline_name);
        let caller = Caller::from_input(caller_raw);

        // Step 3: membership check, skipped for the anonymous service-to-service caller.
        if let Caller::Named(name) = &caller {
            let is_member = self.directory.is_member(name, &policy.group).await;
            match is_member {
                Ok(true) => {}
                Ok(false) => {
                    if let Err(e) = self
                        .tracker
                        .reject(package_uuid, pipeline_name, caller.as_str(), "not a member of required group")
                        .await
                    {
                        warn!(error = %e, "failed to record rejected request");
                    }
                    return Err(MercuryError::NotAuthorized {
                        caller: name.clone(),
                        group: policy.group,
                    });
                }
                Err(e) => {
                    error!(error = %e, "directory lookup failed during bind");
                    return Err(e);
                }
            }
        }

        // Step 4: quota check.
        let quota_remaining = match self.quota.deduct(&policy.group, policy.cost).await {
            Ok(remaining) => remaining,
            Err(e) => {
                if matches!(e, MercuryError::QuotaExceeded { .. }) {
                    if let Err(rec_err) = self
                        .tracker
                        .reject(package_uuid, pipeline_name, caller.as_str(), "quota exceeded")
                        .await
                    {
                        warn!(error = %rec_err, "failed to record rejected request");
                    }
                }
                return Err(e);
            }
        };

        // Step 5: key bind. A failure here is a server fault; the quota
        // credit deducted above is not refunded — an accepted asymmetry
        // rather than adding a compensation-rollback protocol.
        let key_b64 = self.keys.bind(package_uuid, self.key_ttl_secs).await?;
        let hmac = mercury_crypto::hmac_tag(&self.server_secret, package_uuid);

        // Step 6: tracker record. Best-effort — a failure here must not
        // fail the response, since the key is already retrievable.
        let request_id = match self
            .tracker
            .create(package_uuid, pipeline_name, caller.as_str())
            .await
        {
            Ok(record) => record.id,
            Err(e) => {
                warn!(error = %e, "failed to record approved request, key remains bound");
                String::new()
            }
        };

        Ok(BindOutcome {
            request_id,
            key_b64,
            hmac,
            group: policy.group,
            quota_remaining,
        })
    }

    /// Steps 1-4 of the retrieve ordering.
    pub async fn retrieve(
        &self,
        package_uuid: &str,
        request_id: Option<&str>,
    ) -> Result<RetrieveOutcome, MercuryError> {
        let key_b64 = self.keys.burn_on_read(package_uuid).await?;

        if let Some(id) = request_id {
            if let Err(e) = self.tracker.mark_consumed(id).await {
                warn!(error = %e, request_id = %id, "failed to mark request consumed");
            }
        }

        Ok(RetrieveOutcome { key_b64 })
    }

    pub async fn get_request(&self, id: &str) -> Result<mercury_tracker::RequestRecord, MercuryError> {
        self.tracker.get(id).await
    }
}
