use serde::Serialize;

use crate::models::RecordId;
use crate::prefs::{keys, Prefs};

/// Ordered, de-duplicated list of saved job ids for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SavedJobSet {
    ids: Vec<RecordId>,
}

impl SavedJobSet {
    pub fn from_ids(ids: impl IntoIterator<Item = RecordId>) -> Self {
        let mut set = Self::default();
        for id in ids {
            set.insert(id);
        }
        set
    }

    /// Missing or unreadable storage reads as an empty set.
    pub async fn load(prefs: &Prefs) -> Self {
        let ids: Vec<RecordId> = prefs.get_json(keys::SAVED_JOBS).await.unwrap_or_default();
        Self::from_ids(ids)
    }

    pub async fn persist(&self, prefs: &Prefs) {
        prefs.set_json(keys::SAVED_JOBS, &self.ids).await;
    }

    pub async fn clear(prefs: &Prefs) {
        prefs.remove(keys::SAVED_JOBS).await;
    }

    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }

    fn insert(&mut self, id: RecordId) {
        if !id.is_empty() && !self.contains(&id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: &RecordId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|x| x != id);
        self.ids.len() != before
    }

    /// Adds the id at the end, or removes it if already saved.
    /// Returns whether the job is saved afterwards.
    pub fn toggle(&mut self, id: RecordId) -> bool {
        if self.remove(&id) {
            false
        } else {
            self.insert(id);
            true
        }
    }
}
