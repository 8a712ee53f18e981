use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, null_as_default, RecordId};

/// Job fields attached to an application when the store performs the join.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: RecordId,
    #[serde(default)]
    pub job_id: Option<RecordId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resume_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub intro: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "jobs", skip_serializing_if = "Option::is_none")]
    pub job: Option<JobSummary>,
}

impl Application {
    /// Referenced job id, ignoring blank references.
    pub fn job_ref(&self) -> Option<&RecordId> {
        self.job_id.as_ref().filter(|id| !id.is_empty())
    }
}

/// Insert payload for the `applications` collection.
#[derive(Debug, Clone, Serialize)]
pub struct NewApplication {
    pub job_id: RecordId,
    pub name: String,
    pub email: String,
    pub resume_url: String,
    pub intro: String,
}
