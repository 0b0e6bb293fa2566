use syntect::{
    easy::HighlightLines,
    highlighting::{Theme, ThemeSet},
    parsing::SyntaxSet,
    util::{as_24_bit_terminal_escaped, LinesWithEndings},
};

use crate::api::models::{ChatMessage, Role};
use crate::chat::session::ChatSession;
use crate::markdown::{self, Block, Span};

pub const LOADING_TEXT: &str = "Thinking...";

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const UNDERLINE: &str = "\x1b[4m";
const CYAN: &str = "\x1b[36m";

/// Syntect state for coloring fenced code in a terminal.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl SyntaxHighlighter {
    pub fn new(theme_name: &str) -> Self {
        let syntax_set = SyntaxSet::load_defaults_newlines();
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(theme_name)
            .or_else(|| theme_set.themes.remove("base16-ocean.dark"))
            .unwrap_or_default();

        Self { syntax_set, theme }
    }

    pub fn highlight_block(&self, code: &str, language: &str) -> String {
        let syntax = if language.trim().is_empty() {
            self.syntax_set.find_syntax_plain_text()
        } else {
            self.syntax_set
                .find_syntax_by_token(language)
                .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
        };

        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut out = String::new();
        for line in LinesWithEndings::from(code) {
            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => out.push_str(&as_24_bit_terminal_escaped(&ranges, false)),
                Err(_) => out.push_str(line),
            }
        }
        // Reset colors so the rest of the transcript is unaffected.
        let mut out = out.trim_end_matches('\n').to_string();
        out.push_str(RESET);
        out
    }
}

/// Turns a session into printable text.
pub struct TranscriptRenderer {
    highlighter: Option<SyntaxHighlighter>,
}

impl TranscriptRenderer {
    /// Renderer that colors code blocks with 24-bit terminal escapes.
    pub fn colored(theme_name: &str) -> Self {
        Self {
            highlighter: Some(SyntaxHighlighter::new(theme_name)),
        }
    }

    /// Renderer without escape codes: markup is dropped, code stays fenced.
    pub fn plain() -> Self {
        Self { highlighter: None }
    }

    pub fn render(&self, session: &ChatSession) -> String {
        let mut out = String::new();
        let last = session.messages().len().saturating_sub(1);

        for (i, message) in session.messages().iter().enumerate() {
            if i == last && session.showing_loading() {
                out.push_str(&format!("{}:\n{}\n\n", label(message.role), LOADING_TEXT));
            } else {
                out.push_str(&self.render_message(message));
                out.push('\n');
            }
        }

        if let Some(error) = session.error() {
            out.push_str(&format!("Error: {}\n", error));
        }
        out
    }

    pub fn render_message(&self, message: &ChatMessage) -> String {
        format!("{}:\n{}\n", label(message.role), self.render_markdown(&message.content))
    }

    pub fn render_markdown(&self, text: &str) -> String {
        let cleaned = markdown::sanitize(text);
        let mut out = String::new();
        let mut prev_list_item = None;

        for block in markdown::blocks(&cleaned) {
            let is_list_item = matches!(block, Block::ListItem(_));
            match prev_list_item {
                Some(true) if is_list_item => out.push('\n'),
                Some(_) => out.push_str("\n\n"),
                None => {}
            }
            prev_list_item = Some(is_list_item);

            match block {
                Block::Paragraph(spans) | Block::ListItem(spans) => {
                    out.push_str(&self.render_spans(&spans))
                }
                Block::Heading(spans) => {
                    let heading = self.render_spans(&spans);
                    if self.highlighter.is_some() {
                        out.push_str(&format!("{}{}{}{}", BOLD, UNDERLINE, heading, RESET));
                    } else {
                        out.push_str(&heading);
                    }
                }
                Block::Code { lang, code } => match &self.highlighter {
                    Some(highlighter) => out.push_str(&highlighter.highlight_block(&code, &lang)),
                    None => out.push_str(&format!("```{}\n{}```", lang, code)),
                },
                Block::Rule => out.push_str("----"),
            }
        }
        out
    }

    fn render_spans(&self, spans: &[Span]) -> String {
        if self.highlighter.is_none() {
            return spans.iter().map(|s| s.text.as_str()).collect();
        }

        let mut out = String::new();
        for span in spans {
            let mut codes = String::new();
            if span.style.bold {
                codes.push_str(BOLD);
            }
            if span.style.italic {
                codes.push_str(ITALIC);
            }
            if span.style.code {
                codes.push_str(CYAN);
            }
            if codes.is_empty() {
                out.push_str(&span.text);
            } else {
                out.push_str(&format!("{}{}{}", codes, span.text, RESET));
            }
        }
        out
    }
}

fn label(role: Role) -> &'static str {
    match role {
        Role::Assistant => "Assistant",
        Role::User => "You",
        Role::System => "System",
    }
}
