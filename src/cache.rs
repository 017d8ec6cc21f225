use std::collections::HashMap;
use std::collections::hash_map::Values;

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::models::{EventId, EventRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    #[default]
    Unloaded,
    Loading,
    Ready,
    LoadFailed,
}

/// Last fetched snapshot of a club's events, keyed by id.
#[derive(Debug, Default)]
pub struct CollectionCache {
    records: HashMap<EventId, EventRecord>,
    status: LoadStatus,
}

impl CollectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Marks a fetch as in flight. Returns `false` when one already is.
    pub fn begin_load(&mut self) -> bool {
        if self.status == LoadStatus::Loading {
            return false;
        }
        self.status = LoadStatus::Loading;
        true
    }

    pub fn finish_load(&mut self, records: Vec<EventRecord>) {
        let mut snapshot = HashMap::with_capacity(records.len());
        for record in records {
            if let Some(previous) = snapshot.insert(record.id.clone(), record) {
                warn!(event_id = %previous.id, "duplicate event id in listing, keeping the last one");
            }
        }
        self.records = snapshot;
        self.status = LoadStatus::Ready;
    }

    /// Records a failed fetch. The previous snapshot stays in place.
    pub fn fail_load(&mut self) {
        self.status = LoadStatus::LoadFailed;
    }

    pub fn remove(&mut self, id: &EventId) -> Option<EventRecord> {
        self.records.remove(id)
    }

    pub fn contains(&self, id: &EventId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates the current snapshot. The iterator is `Clone`, so it can be
    /// walked more than once.
    pub fn all(&self) -> Values<'_, EventId, EventRecord> {
        self.records.values()
    }
}
