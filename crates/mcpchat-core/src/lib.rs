pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod html;
pub mod metadata;
pub mod status;
pub mod transcript;

// Re-export main types for convenience
pub use api::{ChatApiClient, ChatBackend, HealthReport, MessageReply, MessageRequest, SessionId, ToolInfo};
pub use client::{ChatClient, PendingSend, SEND_FAILURE_TEXT};
pub use config::Config;
pub use error::ApiError;
pub use format::{format_content, parse_content, Node};
pub use metadata::{Annotation, ResponseMetadata, ToolCounter};
pub use status::ConnectionStatus;
pub use transcript::{ChatMessage, ChatRole, Entry, Transcript, TypingPlaceholder};
