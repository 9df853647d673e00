use std::fmt;

use serde::{Deserialize, Serialize};

use crate::metadata::ResponseMetadata;

/// Server-assigned identifier correlating a sequence of chat turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    pub session_id: SessionId,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub mcp_connected: bool,
    #[serde(default)]
    pub tools_available: u32,
}

/// Body of `POST /message`. A missing session is sent as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRequest {
    pub session_id: Option<SessionId>,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

/// Assistant turn returned by `POST /message`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageReply {
    pub content: String,
    #[serde(default)]
    pub metadata: Option<ResponseMetadata>,
}

/// One entry of `GET /tools`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
