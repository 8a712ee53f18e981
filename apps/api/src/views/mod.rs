// Derived views over raw job and application collections.
// Everything outside `handlers` is pure: no store access, no panics on
// partial rows.

pub mod applications;
pub mod dashboard;
pub mod handlers;
pub mod jobs;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Stable sort by creation time. Missing timestamps sort as earliest.
pub(crate) fn sort_by_created<T, F>(items: &mut [T], order: SortOrder, created_at: F)
where
    F: Fn(&T) -> Option<DateTime<Utc>>,
{
    items.sort_by(|a, b| {
        let (a, b) = (created_at(a), created_at(b));
        match order {
            SortOrder::Newest => b.cmp(&a),
            SortOrder::Oldest => a.cmp(&b),
        }
    });
}

pub(crate) fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}
