use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{lenient_timestamp, null_as_default, RecordId};

/// A job posting as stored in the `jobs` collection.
///
/// Every text field tolerates `null` / absence so a partially filled row
/// still renders instead of failing the whole view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: RecordId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(
        default,
        rename = "type",
        alias = "job_type",
        deserialize_with = "null_as_default"
    )]
    pub job_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Job {
    pub fn is_closed(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case("closed"))
            .unwrap_or(false)
    }
}

/// Insert payload for `POST /api/v1/jobs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewJob {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, rename = "type")]
    pub job_type: String,
    #[serde(default)]
    pub description: String,
}

impl NewJob {
    /// All five fields are required.
    pub fn is_complete(&self) -> bool {
        [
            &self.title,
            &self.company,
            &self.location,
            &self.job_type,
            &self.description,
        ]
        .iter()
        .all(|f| !f.trim().is_empty())
    }
}
