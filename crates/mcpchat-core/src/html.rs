//! HTML rendition of the transcript, matching the markup the web page uses
//! (`message user|assistant`, `message-avatar`, `message-content`,
//! `message-meta`, and the three-dot `loading` placeholder).

use crate::format::format_content;
use crate::metadata::render_metadata;
use crate::transcript::{ChatMessage, ChatRole, Entry, Transcript};

const ASSISTANT_AVATAR: &str = "🤖";
const USER_AVATAR: &str = "U";

pub fn render_message(message: &ChatMessage) -> String {
    let avatar = match message.role {
        ChatRole::User => USER_AVATAR,
        ChatRole::Assistant => ASSISTANT_AVATAR,
    };

    let mut content = format_content(&message.content);
    if let Some(meta) = message.metadata.as_ref().and_then(render_metadata) {
        content.push_str(&meta);
    }

    format!(
        "<div class=\"message {}\"><div class=\"message-avatar\">{}</div>\
         <div class=\"message-content\">{}</div></div>",
        message.role.as_str(),
        avatar,
        content
    )
}

pub fn render_typing() -> String {
    format!(
        "<div class=\"message assistant\"><div class=\"message-avatar\">{}</div>\
         <div class=\"message-content\"><div class=\"loading\">{}</div></div></div>",
        ASSISTANT_AVATAR,
        "<div class=\"loading-dot\"></div>".repeat(3)
    )
}

/// Render every entry in order. An empty transcript renders the welcome block.
pub fn render_transcript(transcript: &Transcript, welcome: &str) -> String {
    if transcript.is_empty() {
        return format!("<div class=\"welcome\">{}</div>", format_content(welcome));
    }

    transcript
        .entries()
        .iter()
        .map(|entry| match entry {
            Entry::Message(message) => render_message(message),
            Entry::Typing(_) => render_typing(),
        })
        .collect()
}
