//! UI-agnostic conversation state
//!
//! The transcript is shared by every front end. Messages are only ever
//! appended; the one exception is the typing placeholder shown while a reply
//! is outstanding.

use serde::{Deserialize, Serialize};

use crate::metadata::ResponseMetadata;

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl ChatMessage {
    pub fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
            metadata: None,
        }
    }

    pub fn assistant(content: &str, metadata: Option<ResponseMetadata>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.to_string(),
            metadata,
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(ChatMessage),
    Typing(u64),
}

/// Handle to a typing placeholder. Removing the placeholder consumes it, so
/// each placeholder goes away exactly once.
#[derive(Debug)]
#[must_use = "a typing placeholder stays visible until it is removed"]
pub struct TypingPlaceholder {
    id: u64,
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    next_placeholder: u64,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.entries.push(Entry::Message(message));
    }

    pub fn show_typing(&mut self) -> TypingPlaceholder {
        let id = self.next_placeholder;
        self.next_placeholder += 1;
        self.entries.push(Entry::Typing(id));
        TypingPlaceholder { id }
    }

    pub fn remove_typing(&mut self, placeholder: TypingPlaceholder) {
        self.entries
            .retain(|entry| !matches!(entry, Entry::Typing(id) if *id == placeholder.id));
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(message) => Some(message),
            Entry::Typing(_) => None,
        })
    }

    pub fn is_typing(&self) -> bool {
        self.entries.iter().any(|entry| matches!(entry, Entry::Typing(_)))
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn message_count(&self) -> usize {
        self.messages().count()
    }

    /// True until the first message arrives; front ends show a welcome text.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
