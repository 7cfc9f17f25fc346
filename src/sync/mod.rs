//! Keyed-entity synchronization layer.
//!
//! The client's working copy of the listing collection plus the per-listing
//! side stores (price drafts, busy flags, detail records), all reconciled
//! by [`SyncCoordinator`] against server-confirmed responses.

pub mod collection;
pub mod coordinator;
pub mod detail_cache;
pub mod edit_buffer;
pub mod tracker;

pub use collection::CollectionStore;
pub use coordinator::SyncCoordinator;
pub use detail_cache::{CachedDetail, DetailCache};
pub use edit_buffer::{parse_price, EditBuffer};
pub use tracker::{OperationKind, OperationTracker};
