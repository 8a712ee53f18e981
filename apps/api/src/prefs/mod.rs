// Session-scoped key-value preferences (saved jobs, drafts, applicant
// profile, last-used identity, theme).
//
// Every failure here is caught and logged; callers see `None` / a no-op
// and the feature degrades quietly.

#[cfg(test)]
pub mod memory;
pub mod redis_store;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::warn;

pub mod keys {
    use crate::models::RecordId;

    pub const SAVED_JOBS: &str = "savedJobs";
    pub const APPLICANT_PROFILE: &str = "applicant_profile_v1";
    pub const LAST_APPLICANT_NAME: &str = "lastApplicantName";
    pub const LAST_APPLICANT_EMAIL: &str = "lastApplicantEmail";
    pub const THEME: &str = "theme";

    pub fn draft(job_id: &RecordId) -> String {
        format!("draft_application_job_{job_id}")
    }
}

#[derive(Debug, Error)]
pub enum LocalStoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Could not parse value for '{key}': {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not encode value for '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    // Raised by the in-memory store's failure switch.
    #[allow(dead_code)]
    #[error("Local store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, LocalStoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), LocalStoreError>;
    async fn remove(&self, key: &str) -> Result<(), LocalStoreError>;
}

/// Error-swallowing facade over a session's [`KeyValueStore`].
#[derive(Clone)]
pub struct Prefs {
    store: Arc<dyn KeyValueStore>,
}

impl Prefs {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!("Could not read '{key}': {e}");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value).await {
            warn!("Could not save '{key}': {e}");
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!("Could not remove '{key}': {e}");
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(source) => {
                let e = LocalStoreError::Parse {
                    key: key.to_string(),
                    source,
                };
                warn!("{e}");
                None
            }
        }
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw).await,
            Err(source) => {
                let e = LocalStoreError::Encode {
                    key: key.to_string(),
                    source,
                };
                warn!("{e}");
            }
        }
    }

    #[cfg(test)]
    pub async fn draft_exists(&self, job_id: &crate::models::RecordId) -> bool {
        self.get(&keys::draft(job_id)).await.is_some()
    }
}
