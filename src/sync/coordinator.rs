use crate::error::{SyncError, SyncResult};
use crate::models::{LoginRequest, Property, PropertyDraft, UserProfile};
use crate::session::Session;
use crate::sync::collection::CollectionStore;
use crate::sync::detail_cache::{CachedDetail, DetailCache};
use crate::sync::edit_buffer::EditBuffer;
use crate::sync::tracker::{OperationKind, OperationTracker};
use crate::transport::Transport;
use serde_json::Value;
use std::cell::RefCell;
use tracing::{debug, info, warn};

/// Orchestrates the local stores around each remote operation.
///
/// Runs on a single thread: every method takes `&self`, so operations on
/// different listings can be awaited concurrently (e.g. with `join!`). No
/// store borrow is held across an `.await`, which makes each reconciliation
/// step atomic with respect to the others.
///
/// Mutations are pessimistic. Local state only changes once the server has
/// confirmed, so a failure never needs a rollback.
pub struct SyncCoordinator<T> {
    transport: T,
    session: RefCell<Session>,
    collection: RefCell<CollectionStore>,
    edits: RefCell<EditBuffer>,
    tracker: RefCell<OperationTracker>,
    details: RefCell<DetailCache>,
    status: RefCell<String>,
}

/// Holds a busy flag for the lifetime of one request; the flag is cleared on
/// every exit path, including early returns and a dropped future.
struct BusyGuard<'a> {
    tracker: &'a RefCell<OperationTracker>,
    id: i64,
    kind: OperationKind,
}

impl<'a> BusyGuard<'a> {
    fn begin(tracker: &'a RefCell<OperationTracker>, id: i64, kind: OperationKind) -> Self {
        tracker.borrow_mut().begin(id, kind);
        Self { tracker, id, kind }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        // Coordinator methods never hold the tracker across an await, so the
        // borrow only fails if a guard is dropped inside another borrow.
        match self.tracker.try_borrow_mut() {
            Ok(mut tracker) => tracker.end(self.id, self.kind),
            Err(_) => warn!(
                "Busy flag for property #{} ({}) left set: tracker already borrowed",
                self.id, self.kind
            ),
        }
    }
}

impl<T: Transport> SyncCoordinator<T> {
    pub fn new(transport: T, session: Session) -> Self {
        Self {
            transport,
            session: RefCell::new(session),
            collection: RefCell::new(CollectionStore::new()),
            edits: RefCell::new(EditBuffer::new()),
            tracker: RefCell::new(OperationTracker::new()),
            details: RefCell::new(DetailCache::new()),
            status: RefCell::new(String::new()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // ---------- session ----------

    /// Restore a persisted token, if any
    pub fn init_session(&self) -> bool {
        self.session.borrow_mut().init()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.borrow().is_authenticated()
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.session.borrow().user().cloned()
    }

    pub async fn health(&self) -> SyncResult<Value> {
        self.clear_status();
        let result = self.transport.health().await;
        match &result {
            Ok(body) => self.set_status(format!("Backend OK: {body}")),
            Err(err) => {
                warn!("Health check failed: {}", err);
                self.set_status(format!("Backend error: {err}"));
            }
        }
        result
    }

    /// Log in, persist the token and load the profile
    pub async fn login(&self, email: &str, password: &str) -> SyncResult<()> {
        self.clear_status();
        let credentials = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let result: SyncResult<String> = async {
            let response = self.transport.login(&credentials).await?;
            response.into_token().ok_or_else(|| {
                SyncError::Validation("Login ok, but the response carried no token.".to_string())
            })
        }
        .await;
        let token = self.report("Login", result)?;

        self.session.borrow_mut().establish(token);
        info!("Logged in as {}", credentials.email);
        self.set_status("Logged in.");
        self.load_profile().await;
        Ok(())
    }

    /// Fetch the operator profile. Failures are ignored.
    pub async fn load_profile(&self) -> Option<UserProfile> {
        let token = match self.session.borrow().token() {
            Some(token) => token.to_string(),
            None => return None,
        };

        match self.transport.me(&token).await {
            Ok(user) if self.is_current(&token) => {
                self.session.borrow_mut().set_user(user.clone());
                Some(user)
            }
            Ok(_) => None,
            Err(err) => {
                debug!("Profile not loaded: {}", err);
                None
            }
        }
    }

    /// End the session and drop everything mirrored from it
    pub fn logout(&self) {
        self.session.borrow_mut().logout();
        self.collection.borrow_mut().clear();
        self.edits.borrow_mut().clear();
        self.tracker.borrow_mut().clear();
        self.details.borrow_mut().clear();
        info!("Logged out");
        self.set_status("Logged out.");
    }

    // ---------- list / search ----------

    pub async fn load_properties(&self) -> SyncResult<usize> {
        self.clear_status();
        let result: SyncResult<usize> = async {
            let token = self.token()?;
            let list = self.transport.list(&token).await?;
            self.ensure_current(&token)?;
            Ok(self.apply_listing(list))
        }
        .await;

        let count = self.report("Properties", result)?;
        info!("Loaded {} properties", count);
        self.set_status(format!("Loaded {count} properties."));
        Ok(count)
    }

    /// Replace the collection with the result of a raw query string search
    pub async fn search(&self, query: &str) -> SyncResult<usize> {
        self.clear_status();
        let query = query.trim();
        let result: SyncResult<usize> = async {
            let token = self.token()?;
            let list = self.transport.search(&token, query).await?;
            self.ensure_current(&token)?;
            Ok(self.apply_listing(list))
        }
        .await;

        let count = self.report("Search", result)?;
        info!("Search '{}' returned {} properties", query, count);
        self.set_status(format!("Search returned {count} properties."));
        Ok(count)
    }

    fn apply_listing(&self, list: Vec<Property>) -> usize {
        let mut collection = self.collection.borrow_mut();
        let entities = collection.replace(list);
        self.edits.borrow_mut().seed_from(entities);
        entities.len()
    }

    // ---------- create ----------

    pub async fn create(&self, draft: PropertyDraft) -> SyncResult<Property> {
        self.clear_status();
        let payload = draft.into_submission();
        let result: SyncResult<Property> = async {
            let token = self.token()?;
            let created = self.transport.create(&token, &payload).await?;
            self.ensure_current(&token)?;

            self.edits.borrow_mut().commit(created.id, created.price);
            self.collection.borrow_mut().prepend(created.clone());
            Ok(created)
        }
        .await;

        let created = self.report("Create", result)?;
        info!("Created property #{}", created.id);
        self.set_status(format!("Created property #{}.", created.id));
        Ok(created)
    }

    // ---------- update price ----------

    /// Record a keystroke in the price draft for `id`
    pub fn set_draft(&self, id: i64, value: impl Into<String>) {
        self.edits.borrow_mut().set(id, value);
    }

    /// Submit the price draft for `id` and return the confirmed price
    pub async fn update_price(&self, id: i64) -> SyncResult<Option<f64>> {
        self.clear_status();
        let result = self.try_update_price(id).await;
        let confirmed = self.report("Update", result)?;

        self.set_status(match confirmed {
            Some(price) => format!("Updated property #{id} price to {price}."),
            None => format!("Cleared price of property #{id}."),
        });
        Ok(confirmed)
    }

    async fn try_update_price(&self, id: i64) -> SyncResult<Option<f64>> {
        let token = self.token()?;
        let body = {
            let collection = self.collection.borrow();
            let current = collection.get(id).ok_or(SyncError::NotFoundLocally(id))?;
            let price = self.edits.borrow().parsed(id)?;
            current.to_update(price)
        };
        if self.is_busy(id, OperationKind::Update) {
            return Err(SyncError::Busy {
                id,
                kind: OperationKind::Update,
            });
        }

        let _busy = BusyGuard::begin(&self.tracker, id, OperationKind::Update);
        debug!("Updating property #{} price to {:?}", id, body.price);
        let patch = self.transport.update(&token, id, &body).await?;
        self.ensure_current(&token)?;

        let mut collection = self.collection.borrow_mut();
        match collection.merge_update(id, &patch)? {
            Some(merged) => {
                self.edits.borrow_mut().commit(id, merged.price);
                info!("Property #{} price confirmed at {:?}", id, merged.price);
                Ok(merged.price)
            }
            None => {
                debug!("Property #{} left the list before its update landed", id);
                Ok(patch.get("price").and_then(Value::as_f64))
            }
        }
    }

    // ---------- delete ----------

    /// Delete `id` once `confirm` agrees. The listing is only removed
    /// locally after the server confirms.
    pub async fn delete(&self, id: i64, confirm: impl FnOnce(i64) -> bool) -> SyncResult<()> {
        self.clear_status();
        let result = self.try_delete(id, confirm).await;
        self.report("Delete", result)?;

        info!("Deleted property #{}", id);
        self.set_status(format!("Deleted property #{id}."));
        Ok(())
    }

    async fn try_delete(&self, id: i64, confirm: impl FnOnce(i64) -> bool) -> SyncResult<()> {
        let token = self.token()?;
        if !self.collection.borrow().contains(id) {
            return Err(SyncError::NotFoundLocally(id));
        }
        if self.is_busy(id, OperationKind::Delete) {
            return Err(SyncError::Busy {
                id,
                kind: OperationKind::Delete,
            });
        }
        if !confirm(id) {
            return Err(SyncError::Cancelled(id));
        }

        let _busy = BusyGuard::begin(&self.tracker, id, OperationKind::Delete);
        self.transport.delete(&token, id).await?;
        self.ensure_current(&token)?;

        self.collection.borrow_mut().remove(id);
        self.edits.borrow_mut().discard(id);
        self.tracker.borrow_mut().purge(id);
        Ok(())
    }

    // ---------- details ----------

    /// Open or close the detail panel for `id`.
    ///
    /// Opening a panel whose record is neither cached nor already being
    /// fetched issues exactly one fetch; `Ok(true)` means that fetch
    /// happened and populated the cache.
    pub async fn toggle_details(&self, id: i64) -> SyncResult<bool> {
        let opened = self.details.borrow_mut().toggle(id);
        self.clear_status();

        if !opened || self.details.borrow().has(id) || self.is_busy(id, OperationKind::FetchDetail)
        {
            return Ok(false);
        }

        let result = self.fetch_detail(id).await;
        self.report("Details", result)?;
        Ok(true)
    }

    async fn fetch_detail(&self, id: i64) -> SyncResult<()> {
        let token = self.token()?;
        let _busy = BusyGuard::begin(&self.tracker, id, OperationKind::FetchDetail);
        let record = self.transport.fetch(&token, id).await?;
        self.ensure_current(&token)?;

        debug!("Cached details for property #{}", id);
        self.details.borrow_mut().populate(id, record);
        Ok(())
    }

    // ---------- views ----------

    pub fn properties(&self) -> Vec<Property> {
        self.collection.borrow().as_slice().to_vec()
    }

    pub fn property(&self, id: i64) -> Option<Property> {
        self.collection.borrow().get(id).cloned()
    }

    pub fn draft(&self, id: i64) -> Option<String> {
        self.edits.borrow().get(id).map(str::to_string)
    }

    /// Ids holding a price draft, ascending
    pub fn draft_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.edits.borrow().ids().collect();
        ids.sort_unstable();
        ids
    }

    pub fn is_busy(&self, id: i64, kind: OperationKind) -> bool {
        self.tracker.borrow().is_busy(id, kind)
    }

    pub fn is_open(&self, id: i64) -> bool {
        self.details.borrow().is_open(id)
    }

    pub fn detail(&self, id: i64) -> Option<CachedDetail> {
        self.details.borrow().get(id).cloned()
    }

    pub fn detail_loading(&self, id: i64) -> bool {
        self.is_busy(id, OperationKind::FetchDetail)
    }

    /// Last status line surfaced to the operator
    pub fn status(&self) -> String {
        self.status.borrow().clone()
    }

    // ---------- helpers ----------

    fn token(&self) -> SyncResult<String> {
        self.session
            .borrow()
            .token()
            .map(str::to_string)
            .ok_or(SyncError::NotAuthenticated)
    }

    fn is_current(&self, token: &str) -> bool {
        self.session.borrow().token() == Some(token)
    }

    /// Responses that land after a logout (or a re-login) are dropped
    fn ensure_current(&self, token: &str) -> SyncResult<()> {
        if self.is_current(token) {
            Ok(())
        } else {
            debug!("Dropping a response from an ended session");
            Err(SyncError::NotAuthenticated)
        }
    }

    fn report<V>(&self, action: &str, result: SyncResult<V>) -> SyncResult<V> {
        if let Err(err) = &result {
            let message = err.describe(action);
            if err.is_local() {
                debug!("{}", message);
            } else {
                warn!("{}", message);
            }
            self.set_status(message);
        }
        result
    }

    fn set_status(&self, message: impl Into<String>) {
        *self.status.borrow_mut() = message.into();
    }

    fn clear_status(&self) {
        self.status.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_clears_flag_on_drop() {
        let tracker = RefCell::new(OperationTracker::new());
        {
            let _guard = BusyGuard::begin(&tracker, 4, OperationKind::Update);
            assert!(tracker.borrow().is_busy(4, OperationKind::Update));
        }
        assert!(!tracker.borrow().is_busy(4, OperationKind::Update));
        assert_eq!(tracker.borrow().in_flight(), 0);
    }

    #[test]
    fn guard_dropped_while_tracker_borrowed_does_not_panic() {
        let tracker = RefCell::new(OperationTracker::new());
        let guard = BusyGuard::begin(&tracker, 4, OperationKind::Delete);

        let held = tracker.borrow();
        drop(guard);
        assert!(held.is_busy(4, OperationKind::Delete));
        drop(held);

        // The flag survives the failed release and can still be cleared
        tracker.borrow_mut().end(4, OperationKind::Delete);
        assert!(!tracker.borrow().is_busy(4, OperationKind::Delete));
    }
}
