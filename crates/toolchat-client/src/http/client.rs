// HTTP backend implementation (JSON over reqwest)

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use toolchat_types::{Conversation, StructuredReply, Turn};

use crate::config::BackendConfig;
use crate::error::{ClientError, Result};
use crate::traits::{Backend, HistoryClient, ProfileClient, QueryClient, QueryRequest};

/// Client for the recommendation server's `/api` routes
pub struct HttpBackend {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::InvalidConfig("backend base_url is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Decode a JSON body, or turn a non-success status into `ClientError::Status`
    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Read an acknowledgement body. Empty and non-object bodies count as success.
    async fn read_ack(response: Response) -> Result<Ack> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &body));
        }

        let ack: Ack = serde_json::from_str(&body).unwrap_or_default();
        if ack.success == Some(false) {
            return Err(ClientError::Status {
                status: status.as_u16(),
                message: ack.message.unwrap_or_else(|| "Request rejected".to_string()),
            });
        }
        Ok(ack)
    }

    async fn expect_success(response: Response) -> Result<()> {
        Self::read_ack(response).await.map(|_| ())
    }
}

#[derive(Debug, Default, Deserialize)]
struct Ack {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
}

fn status_error(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .or_else(|| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            let text = body.trim();
            if text.is_empty() {
                "Unknown error".to_string()
            } else {
                text.to_string()
            }
        });

    ClientError::Status {
        status: status.as_u16(),
        message,
    }
}

// ============================================================================
// TRAIT IMPLEMENTATIONS
// ============================================================================

#[async_trait]
impl QueryClient for HttpBackend {
    async fn ask(&self, request: QueryRequest) -> Result<StructuredReply> {
        tracing::debug!(
            conversation_id = %request.conversation_id,
            "Sending query to backend"
        );

        let response = self
            .http_client
            .get(self.url("query"))
            .query(&[
                ("q", request.query.as_str()),
                ("session_id", request.conversation_id.as_str()),
                ("user_id", request.user_id.as_str()),
            ])
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn reset_memory(&self, conversation_id: &str) -> Result<String> {
        let response = self
            .http_client
            .post(self.url("conversation/reset"))
            .json(&json!({ "session_id": conversation_id }))
            .send()
            .await?;

        let ack = Self::read_ack(response).await?;
        Ok(ack.message.unwrap_or_default())
    }
}

#[async_trait]
impl HistoryClient for HttpBackend {
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<Conversation>> {
        let response = self
            .http_client
            .get(self.url("sessions"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;

        Self::read_json(response).await
    }

    async fn fetch_turns(&self, conversation_id: &str) -> Result<Vec<Turn>> {
        let response = self
            .http_client
            .get(self.url("history"))
            .query(&[("session_id", conversation_id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(conversation_id.to_string()));
        }

        Self::read_json(response).await
    }

    async fn rename_conversation(&self, conversation_id: &str, title: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("history/rename"))
            .json(&json!({ "session_id": conversation_id, "title": title }))
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn delete_conversation(&self, conversation_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("history/delete"))
            .json(&json!({ "session_id": conversation_id }))
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn delete_all_conversations(&self, user_id: &str) -> Result<()> {
        let response = self
            .http_client
            .post(self.url("history/clear_all"))
            .json(&json!({ "user_id": user_id }))
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

#[async_trait]
impl ProfileClient for HttpBackend {
    async fn get_profile(&self, user_id: &str) -> Result<Option<Value>> {
        let response = self
            .http_client
            .get(self.url("profile"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let profile: Value = Self::read_json(response).await?;
        Ok(if profile.is_null() { None } else { Some(profile) })
    }

    async fn put_profile(&self, user_id: &str, profile: Value) -> Result<()> {
        let response = self
            .http_client
            .put(self.url("profile"))
            .query(&[("user_id", user_id)])
            .json(&profile)
            .send()
            .await?;

        Self::expect_success(response).await
    }

    async fn delete_profile(&self, user_id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.url("profile"))
            .query(&[("user_id", user_id)])
            .send()
            .await?;

        Self::expect_success(response).await
    }
}

impl Backend for HttpBackend {}
