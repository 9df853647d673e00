//! Exercises `ChatApiClient` and `ChatClient` against a local axum server
//! serving the `/api/chat` endpoints.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mcpchat_core::{
    ApiError, ChatApiClient, ChatBackend, ChatClient, ChatRole, Entry, MessageRequest, SessionId,
    SEND_FAILURE_TEXT,
};
use serde_json::{json, Value};

type Received = Arc<Mutex<Vec<Value>>>;

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn healthy_router(received: Received) -> Router {
    Router::new()
        .route(
            "/api/chat/session",
            post(|| async { Json(json!({ "sessionId": "s-42", "message": "Session created successfully" })) }),
        )
        .route(
            "/api/chat/health",
            get(|| async { Json(json!({ "status": "healthy", "mcpConnected": true, "toolsAvailable": 6 })) }),
        )
        .route(
            "/api/chat/message",
            post(|State(received): State<Received>, Json(body): Json<Value>| async move {
                received.lock().unwrap().push(body);
                Json(json!({
                    "id": "m-1",
                    "role": "assistant",
                    "content": "Indexed **3** chunks",
                    "timestamp": "2025-01-01T10:00:00",
                    "metadata": { "tool": "rag_ingest", "chunks": 3 }
                }))
            }),
        )
        .route(
            "/api/chat/tools",
            get(|| async {
                Json(json!([
                    { "name": "rag_query", "description": "Search ingested documents", "inputSchema": {} },
                    { "name": "echo" }
                ]))
            }),
        )
        .with_state(received)
}

fn url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_full_conversation_over_http() {
    let received = Received::default();
    let addr = serve(healthy_router(Arc::clone(&received))).await;

    let mut client = ChatClient::new(ChatApiClient::new(&url(addr)));
    client.initialize().await;

    assert_eq!(client.session_id(), Some(&SessionId::new("s-42")));
    assert!(client.status().connected);
    assert_eq!(client.status().text, "Connected (6 tools available)");

    assert!(client.send_message("ingest notes.md").await);

    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies, vec![json!({ "sessionId": "s-42", "message": "ingest notes.md" })]);

    let reply = match client.transcript().last() {
        Some(Entry::Message(message)) => message.clone(),
        other => panic!("expected reply, got {:?}", other),
    };
    assert_eq!(reply.role, ChatRole::Assistant);
    assert_eq!(reply.content, "Indexed **3** chunks");
    let html = mcpchat_core::html::render_message(&reply);
    assert!(html.contains("Indexed <strong>3</strong> chunks"));
    assert!(html.contains("📄 Document Ingestion"));
    assert!(html.contains("📊 Chunks: 3"));
}

#[tokio::test]
async fn test_list_tools() {
    let addr = serve(healthy_router(Received::default())).await;
    let api = ChatApiClient::new(&url(addr));

    let tools = api.list_tools().await.unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0].name, "rag_query");
    assert_eq!(tools[0].description.as_deref(), Some("Search ingested documents"));
    assert_eq!(tools[1].description, None);
}

#[tokio::test]
async fn test_server_error_status() {
    let router = Router::new().route(
        "/api/chat/message",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    );
    let addr = serve(router).await;
    let api = ChatApiClient::new(&url(addr));

    let request = MessageRequest {
        session_id: None,
        message: "hi".to_string(),
        category_id: None,
    };
    match api.send_message(&request).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status.as_u16(), 500),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_undecodable_health_body() {
    let router = Router::new().route("/api/chat/health", get(|| async { "not json" }));
    let addr = serve(router).await;
    let api = ChatApiClient::new(&url(addr));

    assert!(matches!(api.health().await, Err(ApiError::Decode { .. })));
}

#[tokio::test]
async fn test_unreachable_server_degrades_to_ui_state() {
    // grab a free port and release it so nothing is listening there
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let api = ChatApiClient::new(&url(addr));
    assert!(matches!(api.create_session().await, Err(ApiError::Transport { .. })));

    let mut client = ChatClient::new(api);
    client.initialize().await;
    assert!(client.session_id().is_none());
    assert!(!client.status().connected);
    assert_eq!(client.status().text, "Connection failed");

    assert!(client.send_message("anyone there?").await);
    let entries = client.transcript().entries();
    assert_eq!(entries.len(), 2);
    match &entries[1] {
        Entry::Message(message) => {
            assert_eq!(message.role, ChatRole::Assistant);
            assert_eq!(message.content, SEND_FAILURE_TEXT);
        }
        other => panic!("expected failure message, got {:?}", other),
    }
    assert!(!client.is_loading());
}
