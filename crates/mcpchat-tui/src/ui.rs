use mcpchat_core::{
    parse_content, Annotation, ChatBackend, ChatMessage, ChatRole, Entry, Node,
};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ToolsView, WELCOME_TEXT};

/// Turn parsed message content into styled terminal lines.
pub fn content_lines(nodes: &[Node]) -> Vec<Line<'static>> {
    let mut builder = LineBuilder::default();
    builder.push_nodes(nodes, Style::default());
    builder.finish()
}

#[derive(Default)]
struct LineBuilder {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    after_block: bool,
}

impl LineBuilder {
    fn push_nodes(&mut self, nodes: &[Node], style: Style) {
        for node in nodes {
            let after_block = std::mem::take(&mut self.after_block);
            match node {
                Node::Text(text) => self.current.push(Span::styled(text.clone(), style)),
                Node::Strong(children) => {
                    self.push_nodes(children, style.add_modifier(Modifier::BOLD));
                }
                Node::Emphasis(children) => {
                    self.push_nodes(children, style.add_modifier(Modifier::ITALIC));
                }
                Node::Code(code) => {
                    self.current.push(Span::styled(code.clone(), style.fg(Color::LightYellow)));
                }
                Node::CodeBlock(code) => {
                    if !self.current.is_empty() {
                        self.break_line();
                    }
                    for line in code.lines() {
                        self.lines.push(Line::from(vec![
                            Span::styled("│ ", Style::default().fg(Color::DarkGray)),
                            Span::styled(line.to_string(), Style::default().fg(Color::LightYellow)),
                        ]));
                    }
                    self.after_block = true;
                }
                // a block already ends its own line
                Node::LineBreak if after_block => {}
                Node::LineBreak => self.break_line(),
            }
        }
    }

    fn break_line(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// One-line summary of the tool or command behind a reply.
pub fn annotation_line(annotation: &Annotation) -> Line<'static> {
    let meta_style = Style::default().fg(Color::DarkGray);
    match annotation {
        Annotation::Tool { label, counter } => {
            let mut spans = vec![
                Span::styled("  Tool: ", meta_style),
                Span::styled(label.clone(), meta_style.add_modifier(Modifier::BOLD)),
            ];
            if let Some(counter) = counter {
                spans.push(Span::styled(format!("   {}", counter), meta_style));
            }
            Line::from(spans)
        }
        Annotation::Help => Line::from(Span::styled(
            format!("  {}", mcpchat_core::metadata::HELP_LABEL),
            meta_style,
        )),
    }
}

fn message_lines(message: &ChatMessage, lines: &mut Vec<Line<'static>>) {
    match message.role {
        ChatRole::User => {
            lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            lines.extend(content_lines(&parse_content(&message.content)));
        }
        ChatRole::Assistant => {
            lines.push(Line::from(Span::styled(
                "🤖 Assistant:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            let is_error = message.metadata.as_ref().is_some_and(|m| m.error);
            for line in content_lines(&parse_content(&message.content)) {
                if is_error {
                    lines.push(line.style(Style::default().fg(Color::Red)));
                } else {
                    lines.push(line);
                }
            }
            if let Some(annotation) = message.metadata.as_ref().and_then(|m| m.annotation()) {
                lines.push(annotation_line(&annotation));
            }
        }
    }
    lines.push(Line::default());
}

fn typing_lines(animation_frame: u8, lines: &mut Vec<Line<'static>>) {
    lines.push(Line::from(Span::styled(
        "🤖 Assistant:",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    // Animated ellipsis: cycles through ".", "..", "..."
    let dots = ".".repeat((animation_frame as usize) + 1);
    lines.push(Line::from(Span::styled(
        format!("Thinking{}", dots),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));
}

/// Rows the paragraph takes when word-wrapped to `width` columns.
fn wrapped_height(paragraph: &Paragraph, width: u16) -> u16 {
    u16::try_from(paragraph.line_count(width.max(1))).unwrap_or(u16::MAX)
}

pub fn render<B: ChatBackend + 'static>(app: &mut App<B>, frame: &mut Frame) {
    let area = frame.area();
    let input_height = app.input_lines() + 2;

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);

    if app.tools.is_some() {
        render_tools_popup(app, frame, area);
    }
}

fn render_header<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let status = app.chat.status();
    let dot_color = if status.connected { Color::Green } else { Color::Red };

    let title = Line::from(vec![
        Span::styled(" MCP Chat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(" ● ", Style::default().fg(dot_color)),
        Span::styled(status.text.clone(), Style::default().fg(Color::White)),
        Span::raw("  "),
        Span::styled(app.server_url.clone(), Style::default().fg(Color::Gray)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_chat<B: ChatBackend + 'static>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);

    let session = app
        .chat
        .session_id()
        .map_or_else(|| " Chat ".to_string(), |id| format!(" Chat · session {} ", id));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(session);

    let transcript = app.chat.transcript();
    let lines: Vec<Line<'static>> = if transcript.is_empty() {
        content_lines(&parse_content(WELCOME_TEXT))
            .into_iter()
            .map(|line| line.style(Style::default().fg(Color::DarkGray)))
            .collect()
    } else {
        let mut lines = Vec::new();
        for entry in transcript.entries() {
            match entry {
                Entry::Message(message) => message_lines(message, &mut lines),
                Entry::Typing(_) => typing_lines(app.animation_frame, &mut lines),
            }
        }
        lines
    };

    let body = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
    let inner = block.inner(area);
    let total = wrapped_height(&body, inner.width);
    app.chat_max_scroll = total.saturating_sub(inner.height);
    if app.follow_bottom {
        app.chat_scroll = app.chat_max_scroll;
    } else {
        app.chat_scroll = app.chat_scroll.min(app.chat_max_scroll);
    }

    let chat = body.block(block).scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    let loading = app.is_loading();
    let (border_color, title) = if loading {
        (Color::DarkGray, " Waiting for reply... ")
    } else {
        (Color::Yellow, " Message (Enter to send, Shift+Enter for newline) ")
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    let inner_width = usize::from(area.width.saturating_sub(2));
    let inner_height = usize::from(area.height.saturating_sub(2)).max(1);
    let (cursor_line, cursor_col) = app.cursor_line_col();

    // Keep the cursor line and column inside the box
    let line_offset = (cursor_line + 1).saturating_sub(inner_height);
    let col_offset = if inner_width == 0 {
        0
    } else {
        (cursor_col + 1).saturating_sub(inner_width)
    };

    let visible: Vec<Line> = app
        .input
        .split('\n')
        .skip(line_offset)
        .take(inner_height)
        .map(|line| Line::from(line.chars().skip(col_offset).take(inner_width).collect::<String>()))
        .collect();

    let text_style = if loading {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let input = Paragraph::new(visible).style(text_style).block(block);
    frame.render_widget(input, area);

    if !loading && app.tools.is_none() {
        let x = u16::try_from(cursor_col - col_offset).unwrap_or(0);
        let y = u16::try_from(cursor_line - line_offset).unwrap_or(0);
        frame.set_cursor_position((area.x + 1 + x, area.y + 1 + y));
    }
}

fn render_footer<B: ChatBackend + 'static>(app: &App<B>, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = if app.tools.is_some() {
        vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" nav ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" close ", label_style),
        ]
    } else {
        vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" S-Enter ", key_style),
            Span::styled(" newline ", label_style),
            Span::styled(" PgUp/PgDn ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" C-t ", key_style),
            Span::styled(" tools ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" quit ", label_style),
        ]
    };

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn render_tools_popup<B: ChatBackend + 'static>(app: &mut App<B>, frame: &mut Frame, area: Rect) {
    let Some(view) = &app.tools else {
        return;
    };

    let rows = match view {
        ToolsView::Loading => 1,
        ToolsView::Loaded(tools) => tools.len().max(1),
        ToolsView::Failed(_) => 2,
    };

    // Calculate popup size and position (centered)
    let popup_width = 70.min(area.width.saturating_sub(4));
    let popup_height = (u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2))
        .min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Available Tools (Esc to close) ");

    match view {
        ToolsView::Loading => {
            let loading = Paragraph::new("Loading tools…")
                .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
                .block(block);
            frame.render_widget(loading, popup_area);
        }
        ToolsView::Loaded(tools) if tools.is_empty() => {
            let empty = Paragraph::new("The server reports no tools.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, popup_area);
        }
        ToolsView::Loaded(tools) => {
            let items: Vec<ListItem> = tools
                .iter()
                .map(|tool| {
                    let mut spans = vec![Span::styled(
                        mcpchat_core::metadata::tool_display_name(&tool.name),
                        Style::default().fg(Color::Yellow).bold(),
                    )];
                    if let Some(description) = &tool.description {
                        spans.push(Span::styled(
                            format!("  {}", description),
                            Style::default().fg(Color::Gray),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect();

            let list = List::new(items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");

            frame.render_stateful_widget(list, popup_area, &mut app.tools_state);
        }
        ToolsView::Failed(error) => {
            let failed = Paragraph::new(format!("Could not load tools: {}", error))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(block);
            frame.render_widget(failed, popup_area);
        }
    }
}
