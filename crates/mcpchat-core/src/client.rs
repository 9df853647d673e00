//! The chat controller.
//!
//! [`ChatClient`] owns the session, the connection status, the transcript and
//! the loading flag. Front ends drive it with [`ChatClient::initialize`] and
//! either [`ChatClient::send_message`] or the split
//! [`begin_send`](ChatClient::begin_send) / [`finish_send`](ChatClient::finish_send)
//! pair when the request has to run on a background task.

use std::fmt::Display;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::api::{ChatBackend, MessageReply, MessageRequest, SessionId, ToolInfo};
use crate::error::ApiError;
use crate::status::ConnectionStatus;
use crate::transcript::{ChatMessage, Transcript, TypingPlaceholder};

/// Assistant text shown when a message could not be delivered.
pub const SEND_FAILURE_TEXT: &str = "❌ Failed to send message. Please try again.";

/// A send that has been started but not yet answered.
#[derive(Debug)]
#[must_use = "a pending send keeps the client loading until it is finished"]
pub struct PendingSend {
    request: MessageRequest,
    placeholder: TypingPlaceholder,
}

impl PendingSend {
    pub fn request(&self) -> &MessageRequest {
        &self.request
    }
}

#[derive(Debug)]
pub struct ChatClient<B> {
    backend: Arc<B>,
    session_id: Option<SessionId>,
    category_id: Option<String>,
    status: ConnectionStatus,
    transcript: Transcript,
    loading: bool,
}

impl<B: ChatBackend> ChatClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
            session_id: None,
            category_id: None,
            status: ConnectionStatus::connecting(),
            transcript: Transcript::new(),
            loading: false,
        }
    }

    /// Restrict the server's tool selection to one category.
    pub fn with_category(mut self, category_id: Option<String>) -> Self {
        self.category_id = category_id;
        self
    }

    pub fn backend(&self) -> Arc<B> {
        Arc::clone(&self.backend)
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Create the session, then check health. The two requests run one after the other.
    pub async fn initialize(&mut self) {
        self.create_session().await;
        self.check_health().await;
    }

    pub async fn create_session(&mut self) {
        match self.backend.create_session().await {
            Ok(session_id) => {
                info!(session = %session_id, "Session created");
                self.session_id = Some(session_id);
            }
            Err(e) => {
                error!("Failed to create session: {}", e);
                self.status = ConnectionStatus::session_failed();
            }
        }
    }

    pub async fn check_health(&mut self) {
        self.status = match self.backend.health().await {
            Ok(report) => {
                let status = ConnectionStatus::from_health(&report);
                if !status.connected {
                    warn!(status = %report.status, mcp_connected = report.mcp_connected, "Backend unhealthy");
                }
                status
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                ConnectionStatus::connection_failed()
            }
        };
    }

    pub async fn list_tools(&self) -> Result<Vec<ToolInfo>, ApiError> {
        self.backend.list_tools().await
    }

    /// Start a send: record the user message, mark loading and show the typing
    /// placeholder. Returns `None` without touching any state when the text is
    /// blank or another send is still outstanding.
    pub fn begin_send(&mut self, text: &str) -> Option<PendingSend> {
        let message = text.trim();
        if message.is_empty() || self.loading {
            return None;
        }

        self.transcript.push(ChatMessage::user(message));
        self.loading = true;
        let placeholder = self.transcript.show_typing();

        Some(PendingSend {
            request: MessageRequest {
                session_id: self.session_id.clone(),
                message: message.to_string(),
                category_id: self.category_id.clone(),
            },
            placeholder,
        })
    }

    /// Complete a send with the backend's answer. Clears loading whatever the outcome.
    pub fn finish_send<E: Display>(&mut self, pending: PendingSend, result: Result<MessageReply, E>) {
        self.transcript.remove_typing(pending.placeholder);

        match result {
            Ok(reply) => {
                self.transcript
                    .push(ChatMessage::assistant(&reply.content, reply.metadata));
            }
            Err(e) => {
                error!("Error sending message: {}", e);
                self.transcript
                    .push(ChatMessage::assistant(SEND_FAILURE_TEXT, None));
            }
        }

        self.loading = false;
    }

    /// Send `text` and wait for the reply. Returns whether a request was made.
    pub async fn send_message(&mut self, text: &str) -> bool {
        let Some(pending) = self.begin_send(text) else {
            return false;
        };

        let result = self.backend.send_message(pending.request()).await;
        self.finish_send(pending, result);
        true
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;

    use super::*;
    use crate::api::HealthReport;
    use crate::metadata::ResponseMetadata;
    use crate::transcript::{ChatRole, Entry};

    #[derive(Default)]
    struct FakeBackend {
        session: Option<&'static str>,
        health: Option<HealthReport>,
        replies: Mutex<VecDeque<Result<MessageReply, ApiError>>>,
        sent: Mutex<Vec<MessageRequest>>,
        calls: AtomicUsize,
    }

    fn unavailable(path: &str) -> ApiError {
        ApiError::Status {
            url: format!("http://test/api/chat{}", path),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    impl FakeBackend {
        fn healthy() -> Self {
            Self {
                session: Some("session-1"),
                health: Some(HealthReport {
                    status: "healthy".to_string(),
                    mcp_connected: true,
                    tools_available: 4,
                }),
                ..Self::default()
            }
        }

        fn reply(self, reply: Result<MessageReply, ApiError>) -> Self {
            self.replies.lock().unwrap().push_back(reply);
            self
        }
    }

    #[async_trait]
    impl ChatBackend for FakeBackend {
        async fn create_session(&self) -> Result<SessionId, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.session.map(SessionId::new).ok_or_else(|| unavailable("/session"))
        }

        async fn health(&self) -> Result<HealthReport, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.health.clone().ok_or_else(|| unavailable("/health"))
        }

        async fn send_message(&self, request: &MessageRequest) -> Result<MessageReply, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(unavailable("/message")))
        }

        async fn list_tools(&self) -> Result<Vec<ToolInfo>, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ToolInfo {
                name: "echo".to_string(),
                description: None,
            }])
        }
    }

    fn last_message<B: ChatBackend>(client: &ChatClient<B>) -> &ChatMessage {
        match client.transcript().last() {
            Some(Entry::Message(message)) => message,
            other => panic!("expected a message, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_initialize_stores_session_and_status() {
        let mut client = ChatClient::new(FakeBackend::healthy());
        client.initialize().await;

        assert_eq!(client.session_id().map(SessionId::as_str), Some("session-1"));
        assert!(client.status().connected);
        assert_eq!(client.status().text, "Connected (4 tools available)");
    }

    #[tokio::test]
    async fn test_session_failure_then_healthy_check() {
        let backend = FakeBackend {
            session: None,
            ..FakeBackend::healthy()
        };
        let mut client = ChatClient::new(backend);

        client.create_session().await;
        assert_eq!(client.status(), &ConnectionStatus::session_failed());
        assert!(client.session_id().is_none());

        // the health check that follows still decides the final indicator
        client.check_health().await;
        assert!(client.status().connected);
    }

    #[tokio::test]
    async fn test_health_failure_shows_connection_failed() {
        let backend = FakeBackend {
            health: None,
            ..FakeBackend::healthy()
        };
        let mut client = ChatClient::new(backend);
        client.initialize().await;
        assert_eq!(client.status(), &ConnectionStatus::connection_failed());
    }

    #[tokio::test]
    async fn test_blank_input_sends_nothing() {
        let mut client = ChatClient::new(FakeBackend::healthy());
        assert!(!client.send_message("").await);
        assert!(!client.send_message("   \n\t ").await);

        assert!(client.transcript().is_empty());
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn test_second_send_while_in_flight_is_ignored() {
        let mut client = ChatClient::new(FakeBackend::healthy());
        let pending = client.begin_send("first").unwrap();
        assert!(client.is_loading());

        assert!(client.begin_send("second").is_none());
        assert!(!client.send_message("third").await);
        assert_eq!(client.transcript().message_count(), 1);
        assert_eq!(client.backend().calls.load(Ordering::SeqCst), 0);

        client.finish_send(
            pending,
            Ok::<_, ApiError>(MessageReply {
                content: "ok".to_string(),
                metadata: None,
            }),
        );
        assert!(!client.is_loading());
        assert!(client.begin_send("fourth").is_some());
    }

    #[tokio::test]
    async fn test_successful_send_renders_reply_with_metadata() {
        let metadata = ResponseMetadata {
            chunks: Some(3),
            ..ResponseMetadata::tool("rag_ingest")
        };
        let backend = FakeBackend::healthy().reply(Ok(MessageReply {
            content: "Ingested **report.pdf**".to_string(),
            metadata: Some(metadata.clone()),
        }));
        let mut client = ChatClient::new(backend);
        client.initialize().await;

        assert!(client.send_message("  ingest report.pdf  ").await);

        let messages: Vec<&ChatMessage> = client.transcript().messages().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], &ChatMessage::user("ingest report.pdf"));
        assert_eq!(messages[1].role, ChatRole::Assistant);
        assert_eq!(messages[1].metadata, Some(metadata));
        assert!(!client.transcript().is_typing());
        assert!(!client.is_loading());

        let sent = client.backend().sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].session_id, Some(SessionId::new("session-1")));
        assert_eq!(sent[0].message, "ingest report.pdf");
    }

    #[tokio::test]
    async fn test_failed_send_shows_fixed_error() {
        let backend = FakeBackend::healthy().reply(Err(unavailable("/message")));
        let mut client = ChatClient::new(backend);
        client.initialize().await;

        assert!(client.send_message("hello").await);

        let last = last_message(&client);
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.content, SEND_FAILURE_TEXT);
        assert!(!client.transcript().is_typing());
        assert!(!client.is_loading());
        assert_eq!(client.transcript().entries().len(), 2);
    }

    #[tokio::test]
    async fn test_placeholder_visible_until_finished() {
        let mut client = ChatClient::new(FakeBackend::healthy());
        let pending = client.begin_send("hi").unwrap();
        assert_eq!(client.transcript().last(), Some(&Entry::Typing(0)));

        client.finish_send(pending, Err::<MessageReply, _>("task panicked"));
        assert_eq!(last_message(&client).content, SEND_FAILURE_TEXT);
        assert_eq!(client.transcript().entries().len(), 2);
    }

    #[tokio::test]
    async fn test_send_without_session_carries_category() {
        let backend = FakeBackend {
            session: None,
            ..FakeBackend::healthy()
        };
        let mut client = ChatClient::new(backend).with_category(Some("math".to_string()));
        client.initialize().await;

        let pending = client.begin_send("add 2 and 3").unwrap();
        assert_eq!(pending.request().session_id, None);
        assert_eq!(pending.request().category_id.as_deref(), Some("math"));
        client.finish_send(pending, Err::<MessageReply, _>("dropped"));
    }

    #[tokio::test]
    async fn test_list_tools_passes_through() {
        let client = ChatClient::new(FakeBackend::healthy());
        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "echo");
    }
}
