use std::collections::HashSet;
use std::fmt;

/// Remote operation kinds tracked independently per listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Update,
    Delete,
    FetchDetail,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update => f.write_str("price update"),
            Self::Delete => f.write_str("delete"),
            Self::FetchDetail => f.write_str("detail fetch"),
        }
    }
}

/// Busy flags keyed by (listing id, operation kind).
///
/// Flags are advisory: `begin` on a busy pair is idempotent and never
/// touches other pairs.
#[derive(Debug, Default, Clone)]
pub struct OperationTracker {
    busy: HashSet<(i64, OperationKind)>,
}

impl OperationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, id: i64, kind: OperationKind) {
        self.busy.insert((id, kind));
    }

    /// Clear the flag whatever the outcome of the operation was
    pub fn end(&mut self, id: i64, kind: OperationKind) {
        self.busy.remove(&(id, kind));
    }

    pub fn is_busy(&self, id: i64, kind: OperationKind) -> bool {
        self.busy.contains(&(id, kind))
    }

    /// Drop every flag held for `id`
    pub fn purge(&mut self, id: i64) {
        self.busy.retain(|(busy_id, _)| *busy_id != id);
    }

    pub fn in_flight(&self) -> usize {
        self.busy.len()
    }

    pub fn clear(&mut self) {
        self.busy.clear();
    }
}
