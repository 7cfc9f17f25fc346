use crate::models::Property;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// A detail record as it was fetched
#[derive(Debug, Clone)]
pub struct CachedDetail {
    pub record: Property,
    pub fetched_at: DateTime<Utc>,
}

/// Lazily fetched detail records plus the open/closed state of each panel.
///
/// Entries are never invalidated for the lifetime of the session; closing a
/// panel keeps its record.
#[derive(Debug, Default, Clone)]
pub struct DetailCache {
    open: HashSet<i64>,
    records: HashMap<i64, CachedDetail>,
}

impl DetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, id: i64) -> bool {
        self.open.contains(&id)
    }

    /// Flip the panel and return its new state
    pub fn toggle(&mut self, id: i64) -> bool {
        if self.open.remove(&id) {
            false
        } else {
            self.open.insert(id);
            true
        }
    }

    pub fn has(&self, id: i64) -> bool {
        self.records.contains_key(&id)
    }

    pub fn populate(&mut self, id: i64, record: Property) {
        self.records.insert(
            id,
            CachedDetail {
                record,
                fetched_at: Utc::now(),
            },
        );
    }

    pub fn get(&self, id: i64) -> Option<&CachedDetail> {
        self.records.get(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.open.clear();
        self.records.clear();
    }
}
