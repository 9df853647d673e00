//! Markdown subset used by assistant replies.
//!
//! Content is tokenized into a small tree of [`Node`]s: fenced code blocks are
//! extracted first, then inline code, and only the text left over is scanned
//! for line breaks, `**bold**` and `*italic*`. Markers inside code are kept
//! literally. The tree renders to HTML here and to terminal spans in the TUI.

use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.+?)```").expect("code block pattern"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.+?)`").expect("inline code pattern"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Text(String),
    Strong(Vec<Node>),
    Emphasis(Vec<Node>),
    Code(String),
    CodeBlock(String),
    LineBreak,
}

enum Piece<'t> {
    Plain(&'t str),
    Marked(&'t str),
}

/// Split `text` into the stretches outside and the first capture group inside `re` matches.
fn split<'t>(re: &Regex, text: &'t str) -> Vec<Piece<'t>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in re.captures_iter(text) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            pieces.push(Piece::Plain(&text[last..whole.start()]));
        }
        pieces.push(Piece::Marked(inner.as_str()));
        last = whole.end();
    }

    if last < text.len() {
        pieces.push(Piece::Plain(&text[last..]));
    }
    pieces
}

pub fn parse_content(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();

    for piece in split(&CODE_BLOCK_RE, text) {
        match piece {
            Piece::Marked(code) => {
                let code = code.strip_prefix('\n').unwrap_or(code);
                let code = code.strip_suffix('\n').unwrap_or(code);
                nodes.push(Node::CodeBlock(code.to_string()));
            }
            Piece::Plain(rest) => parse_inline_code(rest, &mut nodes),
        }
    }
    nodes
}

fn parse_inline_code(text: &str, nodes: &mut Vec<Node>) {
    for piece in split(&INLINE_CODE_RE, text) {
        match piece {
            Piece::Marked(code) => nodes.push(Node::Code(code.to_string())),
            Piece::Plain(rest) => parse_lines(rest, nodes),
        }
    }
}

fn parse_lines(text: &str, nodes: &mut Vec<Node>) {
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            nodes.push(Node::LineBreak);
        }
        parse_emphasis(line, nodes);
    }
}

// Emphasis never crosses a line, and italic pairs never straddle a bold span.
fn parse_emphasis(line: &str, nodes: &mut Vec<Node>) {
    for piece in split(&BOLD_RE, line) {
        match piece {
            Piece::Marked(inner) => nodes.push(Node::Strong(parse_italic(inner))),
            Piece::Plain(rest) => nodes.extend(parse_italic(rest)),
        }
    }
}

fn parse_italic(text: &str) -> Vec<Node> {
    split(&ITALIC_RE, text)
        .into_iter()
        .map(|piece| match piece {
            Piece::Marked(inner) => Node::Emphasis(vec![Node::Text(inner.to_string())]),
            Piece::Plain(rest) => Node::Text(rest.to_string()),
        })
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn to_html(nodes: &[Node]) -> String {
    let mut html = String::new();
    write_html(nodes, &mut html);
    html
}

fn write_html(nodes: &[Node], html: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => html.push_str(&escape_html(text)),
            Node::Strong(children) => {
                html.push_str("<strong>");
                write_html(children, html);
                html.push_str("</strong>");
            }
            Node::Emphasis(children) => {
                html.push_str("<em>");
                write_html(children, html);
                html.push_str("</em>");
            }
            Node::Code(code) => {
                html.push_str("<code>");
                html.push_str(&escape_html(code));
                html.push_str("</code>");
            }
            Node::CodeBlock(code) => {
                html.push_str("<pre><code>");
                html.push_str(&escape_html(code));
                html.push_str("</code></pre>");
            }
            Node::LineBreak => html.push_str("<br>"),
        }
    }
}

/// Convert message content to HTML.
pub fn format_content(text: &str) -> String {
    to_html(&parse_content(text))
}
