use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::SessionResponse;
use super::{ChatBackend, HealthReport, MessageReply, MessageRequest, SessionId, ToolInfo};
use crate::error::ApiError;

/// Path of the chat API below the server URL.
pub const API_PATH: &str = "/api/chat";

#[derive(Debug, Clone)]
pub struct ChatApiClient {
    client: Client,
    base_url: String,
}

impl ChatApiClient {
    pub fn new(server_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: Self::base_url(server_url),
        }
    }

    /// Build a client whose requests give up after `timeout`. `None` waits forever.
    pub fn with_timeout(server_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self {
            client,
            base_url: Self::base_url(server_url),
        })
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn base_url(server_url: &str) -> String {
        format!("{}{}", server_url.trim_end_matches('/'), API_PATH)
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

        serde_json::from_slice(&body).map_err(|source| ApiError::Decode {
            url: url.to_string(),
            source,
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(%url, "GET");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        Self::read_json(&url, response).await
    }
}

#[async_trait]
impl ChatBackend for ChatApiClient {
    async fn create_session(&self) -> Result<SessionId, ApiError> {
        let url = self.endpoint("/session");
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        let session: SessionResponse = Self::read_json(&url, response).await?;
        Ok(session.session_id)
    }

    async fn health(&self) -> Result<HealthReport, ApiError> {
        self.get("/health").await
    }

    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, ApiError> {
        let url = self.endpoint("/message");
        debug!(%url, chars = request.message.chars().count(), "POST");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        Self::read_json(&url, response).await
    }

    async fn list_tools(&self) -> Result<Vec<ToolInfo>, ApiError> {
        self.get("/tools").await
    }
}
