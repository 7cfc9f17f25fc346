use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::models::{LoginRequest, Property, PropertyDraft, PropertyPatch, TokenResponse, UserProfile};
use crate::transport::traits::Transport;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// HTTP/JSON transport for the listings API
pub struct HttpTransport {
    client: Client,
    base: String,
}

impl HttpTransport {
    /// Create a transport from the client configuration
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base: config.api_base.clone(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn search_url(&self, query: &str) -> String {
        let query = query.trim().trim_start_matches('?');
        if query.is_empty() {
            self.url("/properties/search")
        } else {
            format!("{}?{}", self.url("/properties/search"), query)
        }
    }

    async fn send(&self, request: RequestBuilder) -> SyncResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("{} returned status: {}", self.source_name(), status);
            return Err(SyncError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> SyncResult<T> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        debug!("Received {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    /// A list endpoint that answers with anything but an array counts as empty
    async fn listings(&self, request: RequestBuilder) -> SyncResult<Vec<Property>> {
        match self.json::<Value>(request).await? {
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value(item).map_err(SyncError::from))
                .collect(),
            other => {
                warn!("Expected a JSON array of properties, got {}", other);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn health(&self) -> SyncResult<Value> {
        debug!("GET /health");
        self.json(self.client.get(self.url("/health"))).await
    }

    async fn login(&self, credentials: &LoginRequest) -> SyncResult<TokenResponse> {
        debug!("POST /auth/login as {}", credentials.email);
        self.json(self.client.post(self.url("/auth/login")).json(credentials))
            .await
    }

    async fn me(&self, token: &str) -> SyncResult<UserProfile> {
        self.json(self.client.get(self.url("/users/me")).bearer_auth(token))
            .await
    }

    async fn list(&self, token: &str) -> SyncResult<Vec<Property>> {
        debug!("GET /properties");
        self.listings(self.client.get(self.url("/properties")).bearer_auth(token))
            .await
    }

    async fn search(&self, token: &str, query: &str) -> SyncResult<Vec<Property>> {
        let url = self.search_url(query);
        debug!("GET {}", url);
        self.listings(self.client.get(url).bearer_auth(token)).await
    }

    async fn create(&self, token: &str, draft: &PropertyDraft) -> SyncResult<Property> {
        debug!("POST /properties ({})", draft.title);
        self.json(
            self.client
                .post(self.url("/properties"))
                .bearer_auth(token)
                .json(draft),
        )
        .await
    }

    async fn update(&self, token: &str, id: i64, body: &PropertyDraft) -> SyncResult<PropertyPatch> {
        debug!("PUT /properties/{}", id);
        let request = self
            .client
            .put(self.url(&format!("/properties/{id}")))
            .bearer_auth(token)
            .json(body);

        match self.json::<Value>(request).await? {
            Value::Object(patch) => Ok(patch),
            other => Err(SyncError::Decode(format!(
                "expected a property object, got {other}"
            ))),
        }
    }

    async fn delete(&self, token: &str, id: i64) -> SyncResult<()> {
        debug!("DELETE /properties/{}", id);
        self.send(
            self.client
                .delete(self.url(&format!("/properties/{id}")))
                .bearer_auth(token),
        )
        .await?;
        Ok(())
    }

    async fn fetch(&self, token: &str, id: i64) -> SyncResult<Property> {
        debug!("GET /properties/{}", id);
        self.json(
            self.client
                .get(self.url(&format!("/properties/{id}")))
                .bearer_auth(token),
        )
        .await
    }

    fn source_name(&self) -> &str {
        &self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_omits_empty_query() {
        let transport = HttpTransport::new(&Config::default()).unwrap();
        assert_eq!(
            transport.search_url("  "),
            "http://127.0.0.1:8000/properties/search"
        );
        assert_eq!(
            transport.search_url(" has_balcony=true "),
            "http://127.0.0.1:8000/properties/search?has_balcony=true"
        );
    }
}
