use crate::error::{SyncError, SyncResult};
use crate::models::{price_text, Property};
use std::collections::HashMap;

/// In-progress price edits, one free-form draft per listing
#[derive(Debug, Default, Clone)]
pub struct EditBuffer {
    drafts: HashMap<i64, String>,
}

impl EditBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reseed from a freshly loaded list. Keys afterwards are exactly the
    /// listed ids, each holding the current price.
    pub fn seed_from(&mut self, entities: &[Property]) {
        self.drafts = entities
            .iter()
            .map(|p| (p.id, price_text(p.price)))
            .collect();
    }

    pub fn set(&mut self, id: i64, value: impl Into<String>) {
        self.drafts.insert(id, value.into());
    }

    /// Overwrite the draft with the server-confirmed price
    pub fn commit(&mut self, id: i64, confirmed: Option<f64>) {
        self.drafts.insert(id, price_text(confirmed));
    }

    pub fn discard(&mut self, id: i64) -> Option<String> {
        self.drafts.remove(&id)
    }

    pub fn get(&self, id: i64) -> Option<&str> {
        self.drafts.get(&id).map(String::as_str)
    }

    /// Parse the draft for `id`; a missing draft reads as blank
    pub fn parsed(&self, id: i64) -> SyncResult<Option<f64>> {
        parse_price(self.get(id).unwrap_or(""))
    }

    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.drafts.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn clear(&mut self) {
        self.drafts.clear();
    }
}

/// Blank means "clear the price"; anything else must be a finite number
pub fn parse_price(draft: &str) -> SyncResult<Option<f64>> {
    let raw = draft.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(SyncError::Validation("Price must be a number.".to_string())),
    }
}
