use crate::error::SyncResult;
use crate::models::{LoginRequest, Property, PropertyDraft, PropertyPatch, TokenResponse, UserProfile};
use async_trait::async_trait;
use serde_json::Value;

/// Remote listings API as seen by the sync layer.
///
/// Implementations map a non-success status to `SyncError::Rejected` with
/// the response text, and network failures to `SyncError::Transport`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Liveness check
    async fn health(&self) -> SyncResult<Value>;

    async fn login(&self, credentials: &LoginRequest) -> SyncResult<TokenResponse>;

    async fn me(&self, token: &str) -> SyncResult<UserProfile>;

    async fn list(&self, token: &str) -> SyncResult<Vec<Property>>;

    /// `query` is a raw query string without the leading `?`
    async fn search(&self, token: &str, query: &str) -> SyncResult<Vec<Property>>;

    async fn create(&self, token: &str, draft: &PropertyDraft) -> SyncResult<Property>;

    async fn update(&self, token: &str, id: i64, body: &PropertyDraft) -> SyncResult<PropertyPatch>;

    async fn delete(&self, token: &str, id: i64) -> SyncResult<()>;

    async fn fetch(&self, token: &str, id: i64) -> SyncResult<Property>;

    /// Name of the backend, for logs
    fn source_name(&self) -> &str;
}
