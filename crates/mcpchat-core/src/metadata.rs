//! Tool and command annotations attached to assistant replies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::format::escape_html;

/// Metadata the server attaches to an assistant reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub chunks: Option<u64>,
    #[serde(default)]
    pub sources: Option<u64>,
    #[serde(default)]
    pub command: Option<String>,
    /// Set by the server when it answered with an error message.
    #[serde(default)]
    pub error: bool,
}

impl ResponseMetadata {
    pub fn tool(name: &str) -> Self {
        Self {
            tool: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn command(name: &str) -> Self {
        Self {
            command: Some(name.to_string()),
            ..Self::default()
        }
    }

    /// The annotation to show under the reply, if any. A tool wins over a command.
    pub fn annotation(&self) -> Option<Annotation> {
        if let Some(tool) = &self.tool {
            let counter = match tool.as_str() {
                "rag_ingest" => self.chunks.map(ToolCounter::Chunks),
                "rag_query" => self.sources.map(ToolCounter::Sources),
                _ => None,
            };
            return Some(Annotation::Tool {
                label: tool_display_name(tool),
                counter,
            });
        }

        match self.command.as_deref() {
            Some("help") => Some(Annotation::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCounter {
    Chunks(u64),
    Sources(u64),
}

impl fmt::Display for ToolCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolCounter::Chunks(n) => write!(f, "📊 Chunks: {}", n),
            ToolCounter::Sources(n) => write!(f, "📚 Sources: {}", n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    Tool {
        label: String,
        counter: Option<ToolCounter>,
    },
    Help,
}

pub const HELP_LABEL: &str = "📖 Help Documentation";

impl Annotation {
    /// Inner markup of the `message-meta` block.
    pub fn to_html(&self) -> String {
        match self {
            Annotation::Tool { label, counter } => {
                let mut html = format!("<span>Tool: <strong>{}</strong></span>", escape_html(label));
                if let Some(counter) = counter {
                    html.push_str(&format!("<span>{}</span>", counter));
                }
                html
            }
            Annotation::Help => format!("<span>{}</span>", HELP_LABEL),
        }
    }
}

/// Display name for a tool; unknown tools get a wrench prefix.
pub fn tool_display_name(tool: &str) -> String {
    let known = match tool {
        "rag_ingest" => "📄 Document Ingestion",
        "rag_query" => "🔍 RAG Query",
        "echo" => "📢 Echo",
        "add" => "➕ Add",
        "get_current_time" => "🕒 Current Time",
        "jsonplaceholder-user" => "👤 User Info API",
        other => return format!("🔧 {}", other),
    };
    known.to_string()
}

/// The `message-meta` block for a reply, or `None` when there is nothing to show.
pub fn render_metadata(metadata: &ResponseMetadata) -> Option<String> {
    metadata
        .annotation()
        .map(|annotation| format!("<div class=\"message-meta\">{}</div>", annotation.to_html()))
}
