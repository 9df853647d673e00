use mcpchat_core::{
    ApiError, ChatApiClient, ChatBackend, ChatClient, MessageReply, PendingSend, ToolInfo,
};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;
use tracing::debug;

/// Most lines the input box grows to before it scrolls.
pub const MAX_INPUT_LINES: u16 = 6;

pub const WELCOME_TEXT: &str = "Welcome! Ask a question, ingest a document with its path, \
or type *help* to see what the server's tools can do.";

/// A send whose request is running on a background task.
pub struct InFlight {
    pending: PendingSend,
    task: JoinHandle<Result<MessageReply, ApiError>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolsView {
    Loading,
    Loaded(Vec<ToolInfo>),
    Failed(String),
}

pub struct App<B = ChatApiClient> {
    pub should_quit: bool,
    pub chat: ChatClient<B>,
    pub server_url: String,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    pub in_flight: Option<InFlight>,

    // Chat pane scrolling
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Tools popup
    pub tools: Option<ToolsView>,
    pub tools_state: ListState,
    pub tools_task: Option<JoinHandle<Result<Vec<ToolInfo>, ApiError>>>,
}

impl<B: ChatBackend + 'static> App<B> {
    pub fn new(chat: ChatClient<B>, server_url: &str) -> Self {
        Self {
            should_quit: false,
            chat,
            server_url: server_url.to_string(),
            input: String::new(),
            cursor: 0,
            in_flight: None,
            chat_scroll: 0,
            chat_max_scroll: 0,
            follow_bottom: true,
            chat_area: None,
            animation_frame: 0,
            tools: None,
            tools_state: ListState::default(),
            tools_task: None,
        }
    }

    pub async fn initialize(&mut self) {
        self.chat.initialize().await;
    }

    pub fn is_loading(&self) -> bool {
        self.chat.is_loading()
    }

    /// Send the input box contents. Blank input or an outstanding send leaves everything as is.
    pub fn submit(&mut self) {
        let Some(pending) = self.chat.begin_send(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.follow_bottom = true;

        let backend = self.chat.backend();
        let request = pending.request().clone();
        debug!(chars = request.message.chars().count(), "Sending message");
        let task = tokio::spawn(async move { backend.send_message(&request).await });
        self.in_flight = Some(InFlight { pending, task });
    }

    /// Hand a finished send back to the chat client. Does nothing while the request is running.
    pub async fn poll_send(&mut self) {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|in_flight| in_flight.task.is_finished());
        if !finished {
            return;
        }

        if let Some(InFlight { pending, task }) = self.in_flight.take() {
            match task.await {
                Ok(result) => self.chat.finish_send(pending, result),
                Err(join_error) => self.chat.finish_send(pending, Err::<MessageReply, _>(join_error)),
            }
            self.follow_bottom = true;
        }
    }

    /// Show the tools popup and fetch the list in the background.
    pub fn open_tools(&mut self) {
        if let Some(task) = self.tools_task.take() {
            task.abort();
        }
        self.tools = Some(ToolsView::Loading);
        self.tools_state.select(None);

        let backend = self.chat.backend();
        self.tools_task = Some(tokio::spawn(async move { backend.list_tools().await }));
    }

    /// Fill the popup once the tools request is done.
    pub async fn poll_tools(&mut self) {
        let finished = self.tools_task.as_ref().is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }

        let Some(task) = self.tools_task.take() else {
            return;
        };
        let view = match task.await {
            Ok(Ok(tools)) => ToolsView::Loaded(tools),
            Ok(Err(e)) => ToolsView::Failed(e.to_string()),
            Err(e) => ToolsView::Failed(e.to_string()),
        };
        if self.tools.is_none() {
            return;
        }
        let has_items = matches!(&view, ToolsView::Loaded(tools) if !tools.is_empty());
        self.tools_state.select(has_items.then_some(0));
        self.tools = Some(view);
    }

    pub fn close_tools(&mut self) {
        if let Some(task) = self.tools_task.take() {
            task.abort();
        }
        self.tools = None;
        self.tools_state.select(None);
    }

    pub fn tools_nav_down(&mut self) {
        if let Some(ToolsView::Loaded(tools)) = &self.tools {
            let len = tools.len();
            if len > 0 {
                let i = self.tools_state.selected().unwrap_or(0);
                self.tools_state.select(Some((i + 1).min(len - 1)));
            }
        }
    }

    pub fn tools_nav_up(&mut self) {
        if let Some(i) = self.tools_state.selected() {
            self.tools_state.select(Some(i.saturating_sub(1)));
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing. The box is disabled while a reply is outstanding.

    pub fn insert_char(&mut self, c: char) {
        if self.is_loading() {
            return;
        }
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars().filter(|c| *c != '\r') {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.is_loading() || self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.is_loading() {
            return;
        }
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    /// Line and column of the cursor inside the input text.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before: String = self.input.chars().take(self.cursor).collect();
        let line = before.matches('\n').count();
        let col = before.rsplit('\n').next().map_or(0, |tail| tail.chars().count());
        (line, col)
    }

    /// Rows the input text needs, growing with its line count up to `MAX_INPUT_LINES`.
    pub fn input_lines(&self) -> u16 {
        let lines = u16::try_from(self.input.split('\n').count()).unwrap_or(u16::MAX);
        lines.clamp(1, MAX_INPUT_LINES)
    }

    // Chat scrolling

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        self.follow_bottom = self.chat_scroll >= self.chat_max_scroll;
    }

    pub fn page_size(&self) -> u16 {
        self.chat_area
            .map_or(10, |area| area.height.saturating_sub(2).max(1))
    }
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
