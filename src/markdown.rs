//! Markdown handling for model output.
//!
//! `sanitize` is a best-effort cleanup applied before parsing. Outside fenced
//! code it collapses runs of spaces to one (leading indentation is kept) and
//! consecutive blank lines to a single blank line. A fence left open at the
//! end of the text is closed.
//!
//! `blocks` parses the cleaned text with pulldown-cmark into styled spans and
//! fenced code for the terminal renderer.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Paragraph(Vec<Span>),
    Heading(Vec<Span>),
    /// A list entry; the first span is the indented marker.
    ListItem(Vec<Span>),
    Code { lang: String, code: String },
    Rule,
}

impl Block {
    pub fn text(&self) -> String {
        match self {
            Block::Paragraph(spans) | Block::Heading(spans) | Block::ListItem(spans) => {
                spans.iter().map(|s| s.text.as_str()).collect()
            }
            Block::Code { code, .. } => code.clone(),
            Block::Rule => String::new(),
        }
    }
}

/// Backtick count and info string of a fence line, if it is one.
///
/// An info string containing a backtick does not open a fence, so inline
/// spans like ```` ```x``` ```` at the start of a line stay prose.
fn fence(line: &str) -> Option<(usize, &str)> {
    let trimmed = line.trim_start();
    let ticks = trimmed.len() - trimmed.trim_start_matches('`').len();
    if ticks < 3 {
        return None;
    }
    let info = &trimmed[ticks..];
    if info.contains('`') {
        return None;
    }
    Some((ticks, info.trim()))
}

pub fn sanitize(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    // Backtick count of the open fence.
    let mut open_fence: Option<usize> = None;
    let mut last_blank = false;

    for line in text.lines() {
        match (open_fence, fence(line)) {
            (None, Some((ticks, _))) => {
                open_fence = Some(ticks);
                last_blank = false;
                out.push(line.trim_end().to_string());
                continue;
            }
            (Some(open), Some((ticks, ""))) if ticks >= open => {
                open_fence = None;
                out.push(line.trim_end().to_string());
                continue;
            }
            (Some(_), _) => {
                out.push(line.to_string());
                continue;
            }
            (None, None) => {}
        }

        if line.trim().is_empty() {
            if !last_blank {
                out.push(String::new());
            }
            last_blank = true;
            continue;
        }
        last_blank = false;
        out.push(collapse_spaces(line.trim_end()));
    }

    let mut result = out.join("\n");
    if let Some(ticks) = open_fence {
        result.push('\n');
        result.push_str(&"`".repeat(ticks));
    } else if text.ends_with('\n') {
        result.push('\n');
    }
    result
}

fn collapse_spaces(line: &str) -> String {
    let body = line.trim_start();
    let indent = &line[..line.len() - body.len()];

    let mut out = String::with_capacity(line.len());
    out.push_str(indent);
    let mut prev_space = false;
    for c in body.chars() {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        out.push(c);
    }
    out
}

/// Parses markdown into renderable blocks.
pub fn blocks(text: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = BlockBuilder::default();
    for event in Parser::new_ext(text, options) {
        builder.process_event(event);
    }
    builder.flush();
    builder.blocks
}

#[derive(Default)]
struct BlockBuilder {
    blocks: Vec<Block>,
    spans: Vec<Span>,
    style: SpanStyle,
    /// Next number for ordered lists, `None` for bullet lists.
    lists: Vec<Option<u64>>,
    code: Option<(String, String)>,
}

impl BlockBuilder {
    fn process_event(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.spans.push(Span {
                text: code.to_string(),
                style: SpanStyle {
                    code: true,
                    ..self.style
                },
            }),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::SoftBreak | Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.flush();
                self.blocks.push(Block::Rule);
            }
            Event::TaskListMarker(checked) => {
                self.push_text(if checked { "[x] " } else { "[ ] " })
            }
            _ => {}
        }
    }

    fn start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::CodeBlock(kind) => {
                self.flush();
                let lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some((lang, String::new()));
            }
            Tag::Emphasis => self.style.italic = true,
            Tag::Strong => self.style.bold = true,
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                // A nested list starts inside its parent's item.
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.spans.push(Span::plain(format!("{}{}", "  ".repeat(depth), marker)));
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::CodeBlock => {
                if let Some((lang, mut code)) = self.code.take() {
                    if !code.is_empty() && !code.ends_with('\n') {
                        code.push('\n');
                    }
                    self.blocks.push(Block::Code { lang, code });
                }
            }
            TagEnd::Emphasis => self.style.italic = false,
            TagEnd::Strong => self.style.bold = false,
            TagEnd::Heading(_) => {
                let spans = std::mem::take(&mut self.spans);
                if !spans.is_empty() {
                    self.blocks.push(Block::Heading(spans));
                }
            }
            TagEnd::Paragraph | TagEnd::Item => self.flush(),
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some((_, code)) = &mut self.code {
            code.push_str(text);
            return;
        }
        self.spans.push(Span {
            text: text.to_string(),
            style: self.style,
        });
    }

    fn flush(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let spans = std::mem::take(&mut self.spans);
        if self.lists.is_empty() {
            self.blocks.push(Block::Paragraph(spans));
        } else {
            self.blocks.push(Block::ListItem(spans));
        }
    }
}
