#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::oneshot;
use wisekey_scout::models::{LoginRequest, Property, PropertyDraft, PropertyPatch, TokenResponse, UserProfile};
use wisekey_scout::{MemoryTokenStore, Session, SyncCoordinator, SyncError, SyncResult, Transport};

/// Request as seen by the scripted transport
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Health,
    Login(String),
    Me,
    List,
    Search(String),
    Create(PropertyDraft),
    Update(i64, PropertyDraft),
    Delete(i64),
    Fetch(i64),
}

/// A queued answer: either immediate or held open until the test sends it
pub enum Reply<T> {
    Now(SyncResult<T>),
    Later(oneshot::Receiver<SyncResult<T>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> SyncResult<T> {
        match self {
            Reply::Now(result) => result,
            Reply::Later(rx) => rx
                .await
                .unwrap_or_else(|_| Err(SyncError::Transport("reply dropped".to_string()))),
        }
    }
}

/// In-memory transport answering from per-endpoint queues and recording
/// every request it receives
#[derive(Default)]
pub struct ScriptedTransport {
    calls: Mutex<Vec<Call>>,
    logins: Mutex<VecDeque<Reply<TokenResponse>>>,
    profiles: Mutex<VecDeque<Reply<UserProfile>>>,
    lists: Mutex<VecDeque<Reply<Vec<Property>>>>,
    creates: Mutex<VecDeque<Reply<Property>>>,
    updates: Mutex<VecDeque<Reply<PropertyPatch>>>,
    deletes: Mutex<VecDeque<Reply<()>>>,
    fetches: Mutex<VecDeque<Reply<Property>>>,
}

impl ScriptedTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| matches(c)).count()
    }

    pub fn on_login(&self, reply: Reply<TokenResponse>) {
        self.logins.lock().unwrap().push_back(reply);
    }

    pub fn on_me(&self, reply: Reply<UserProfile>) {
        self.profiles.lock().unwrap().push_back(reply);
    }

    /// Answers both list and search
    pub fn on_list(&self, reply: Reply<Vec<Property>>) {
        self.lists.lock().unwrap().push_back(reply);
    }

    pub fn on_create(&self, reply: Reply<Property>) {
        self.creates.lock().unwrap().push_back(reply);
    }

    pub fn on_update(&self, reply: Reply<PropertyPatch>) {
        self.updates.lock().unwrap().push_back(reply);
    }

    pub fn on_delete(&self, reply: Reply<()>) {
        self.deletes.lock().unwrap().push_back(reply);
    }

    pub fn on_fetch(&self, reply: Reply<Property>) {
        self.fetches.lock().unwrap().push_back(reply);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<Reply<T>>>) -> Reply<T> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Now(Err(SyncError::Transport("no reply scripted".to_string()))))
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn health(&self) -> SyncResult<Value> {
        self.record(Call::Health);
        Ok(json!({ "status": "ok" }))
    }

    async fn login(&self, credentials: &LoginRequest) -> SyncResult<TokenResponse> {
        self.record(Call::Login(credentials.email.clone()));
        Self::next(&self.logins).resolve().await
    }

    async fn me(&self, _token: &str) -> SyncResult<UserProfile> {
        self.record(Call::Me);
        Self::next(&self.profiles).resolve().await
    }

    async fn list(&self, _token: &str) -> SyncResult<Vec<Property>> {
        self.record(Call::List);
        Self::next(&self.lists).resolve().await
    }

    async fn search(&self, _token: &str, query: &str) -> SyncResult<Vec<Property>> {
        self.record(Call::Search(query.to_string()));
        Self::next(&self.lists).resolve().await
    }

    async fn create(&self, _token: &str, draft: &PropertyDraft) -> SyncResult<Property> {
        self.record(Call::Create(draft.clone()));
        Self::next(&self.creates).resolve().await
    }

    async fn update(&self, _token: &str, id: i64, body: &PropertyDraft) -> SyncResult<PropertyPatch> {
        self.record(Call::Update(id, body.clone()));
        Self::next(&self.updates).resolve().await
    }

    async fn delete(&self, _token: &str, id: i64) -> SyncResult<()> {
        self.record(Call::Delete(id));
        Self::next(&self.deletes).resolve().await
    }

    async fn fetch(&self, _token: &str, id: i64) -> SyncResult<Property> {
        self.record(Call::Fetch(id));
        Self::next(&self.fetches).resolve().await
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

pub fn listing(id: i64, price: Option<f64>) -> Property {
    serde_json::from_value(json!({
        "id": id,
        "title": format!("Listing {id}"),
        "transaction_type": "buy",
        "city": "Tbilisi",
        "currency": "USD",
        "price": price,
        "rooms": 3,
        "owner_id": 1,
    }))
    .unwrap()
}

pub fn patch(value: Value) -> PropertyPatch {
    value.as_object().cloned().unwrap()
}

pub fn rejected(status: u16, body: &str) -> SyncError {
    SyncError::Rejected {
        status,
        body: body.to_string(),
    }
}

/// Coordinator with a live session token
pub fn logged_in() -> SyncCoordinator<ScriptedTransport> {
    let coordinator = SyncCoordinator::new(
        ScriptedTransport::default(),
        Session::new(MemoryTokenStore::with_token("token-1")),
    );
    assert!(coordinator.init_session());
    coordinator
}

/// Logged-in coordinator whose collection holds `entities`
pub async fn loaded(entities: Vec<Property>) -> SyncCoordinator<ScriptedTransport> {
    let coordinator = logged_in();
    coordinator.transport().on_list(Reply::Now(Ok(entities)));
    coordinator.load_properties().await.unwrap();
    coordinator
}
