mod client;
mod types;

use async_trait::async_trait;

use crate::error::ApiError;

pub use client::{ChatApiClient, API_PATH};
pub use types::{HealthReport, MessageReply, MessageRequest, SessionId, ToolInfo};

/// The four `/api/chat` operations the client consumes.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn create_session(&self) -> Result<SessionId, ApiError>;

    async fn health(&self) -> Result<HealthReport, ApiError>;

    async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, ApiError>;

    async fn list_tools(&self) -> Result<Vec<ToolInfo>, ApiError>;
}
