use uuid::Uuid;

use crate::api::models::{ChatMessage, ChatTurnRequest, Mode, Role, TurnOptions};

pub const WELCOME_ID: &str = "welcome";
pub const WELCOME_TEXT: &str = "Привет! Я AI-помощник по информатике. Я могу помочь с анализом кода \
или подсказать по заданиям ЕГЭ/ОГЭ. Что вас интересует?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
    Streaming,
    ErrorDisplayed,
}

/// A turn that has been added to the transcript and is ready to be sent.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub request: ChatTurnRequest,
    pub assistant_id: String,
}

/// In-memory transcript and UI state of one chat session.
///
/// Nothing here is persisted; the session lives as long as the client does.
#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    mode: Mode,
    phase: Phase,
    error: Option<String>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl ChatSession {
    pub fn new(mode: Mode) -> Self {
        Self {
            messages: vec![ChatMessage {
                id: WELCOME_ID.to_string(),
                role: Role::Assistant,
                content: WELCOME_TEXT.to_string(),
            }],
            mode,
            phase: Phase::Idle,
            error: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, id: &str) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Only affects the system prompt of the next submitted turn.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::AwaitingResponse | Phase::Streaming)
    }

    /// True while the assistant placeholder has not received any text yet.
    pub fn showing_loading(&self) -> bool {
        self.is_busy()
            && self
                .messages
                .last()
                .is_some_and(|m| m.role == Role::Assistant && m.content.is_empty())
    }

    /// Appends the user message and an empty assistant placeholder.
    ///
    /// Returns `None` for blank input or while another turn is in flight.
    pub fn begin_turn(&mut self, input: &str) -> Option<PendingTurn> {
        if input.trim().is_empty() || self.is_busy() {
            return None;
        }

        self.messages.push(ChatMessage {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            content: input.to_string(),
        });
        let request = ChatTurnRequest {
            messages: self.messages.clone(),
            body: Some(TurnOptions { mode: self.mode }),
        };

        let assistant_id = Uuid::new_v4().to_string();
        self.messages.push(ChatMessage {
            id: assistant_id.clone(),
            role: Role::Assistant,
            content: String::new(),
        });
        self.error = None;
        self.phase = Phase::AwaitingResponse;

        Some(PendingTurn {
            request,
            assistant_id,
        })
    }

    /// Replaces the placeholder's content with everything received so far.
    pub fn apply_delta(&mut self, assistant_id: &str, accumulated: &str) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == assistant_id) {
            message.content.clear();
            message.content.push_str(accumulated);
        }
        self.phase = Phase::Streaming;
    }

    /// Records an error reported inside the stream. Received text is kept.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn finish(&mut self) {
        self.phase = if self.error.is_some() {
            Phase::ErrorDisplayed
        } else {
            Phase::Idle
        };
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
        self.phase = Phase::ErrorDisplayed;
    }
}
