use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    TaskHelp,
    CodeAnalysis,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::TaskHelp => "task-help",
            Mode::CodeAnalysis => "code-analysis",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Mode::TaskHelp => Mode::CodeAnalysis,
            Mode::CodeAnalysis => Mode::TaskHelp,
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "task-help" | "task" => Ok(Mode::TaskHelp),
            "code-analysis" | "code" => Ok(Mode::CodeAnalysis),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOptions {
    #[serde(default)]
    pub mode: Mode,
}

/// Body of `POST /api/ai-chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurnRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub body: Option<TurnOptions>,
}

impl ChatTurnRequest {
    pub fn mode(&self) -> Mode {
        self.body.as_ref().map(|b| b.mode).unwrap_or_default()
    }
}
