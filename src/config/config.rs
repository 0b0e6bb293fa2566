use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Connection settings for an OpenAI-compatible chat completion API.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Either "together" (simulated streaming) or "openai" (native streaming).
    pub provider: String,
    pub together: UpstreamConfig,
    pub openai: UpstreamConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChatConfig {
    pub endpoint: String,
    pub temperature: f32,
    pub chunk_size: usize,
    pub chunk_delay_ms: u64,
    pub welcome_id: String,
}

impl ChatConfig {
    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/ai-chat".to_string(),
            temperature: 0.7,
            chunk_size: 4,
            chunk_delay_ms: 10,
            welcome_id: "welcome".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClientConfig {
    pub relay_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub chat: ChatConfig,
    pub client: ClientConfig,
}

impl AppConfig {
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let chat = ChatConfig::default();

        let settings = config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("llm.provider", "together")?
            .set_default("llm.together.api_base", "https://api.together.xyz/v1")?
            .set_default("llm.together.api_key", "${TOGETHER_API_KEY}")?
            .set_default("llm.together.model", "mistralai/Mistral-7B-Instruct-v0.3")?
            .set_default("llm.openai.api_base", "https://api.openai.com/v1")?
            .set_default("llm.openai.api_key", "${OPENAI_API_KEY}")?
            .set_default("llm.openai.model", "gpt-3.5-turbo")?
            .set_default("chat.endpoint", chat.endpoint.as_str())?
            .set_default("chat.temperature", chat.temperature as f64)?
            .set_default("chat.chunk_size", chat.chunk_size as i64)?
            .set_default("chat.chunk_delay_ms", chat.chunk_delay_ms as i64)?
            .set_default("chat.welcome_id", chat.welcome_id.as_str())?
            .set_default("client.relay_url", "http://127.0.0.1:3000/api/ai-chat")?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("EXAM_CHAT").separator("__"))
            .build()?;

        let mut app_config: AppConfig = settings.try_deserialize()?;

        // Expand environment variables if present like ${TOGETHER_API_KEY}
        app_config.server.host = expand_env(&app_config.server.host);
        app_config.llm.together.api_key = expand_env(&app_config.llm.together.api_key);
        app_config.llm.openai.api_key = expand_env(&app_config.llm.openai.api_key);
        app_config.client.relay_url = expand_env(&app_config.client.relay_url);

        if app_config.chat.chunk_size == 0 {
            return Err(config::ConfigError::Message(
                "chat.chunk_size must be greater than zero".to_string(),
            ));
        }

        Ok(app_config)
    }
}

pub fn expand_env(val: &str) -> String {
    if val.starts_with("${") && val.ends_with('}') {
        let var_name = &val[2..val.len() - 1];
        std::env::var(var_name).unwrap_or_default()
    } else {
        val.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_passes_through_plain_values() {
        assert_eq!(expand_env("127.0.0.1"), "127.0.0.1");
        assert_eq!(expand_env("${unterminated"), "${unterminated");
    }

    #[test]
    fn expand_env_missing_variable_is_empty() {
        assert_eq!(expand_env("${EXAM_CHAT_TEST_SURELY_UNSET_VAR}"), "");
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = AppConfig::load("does-not-exist.yaml").unwrap();
        assert_eq!(config.chat.chunk_size, 4);
        assert_eq!(config.chat.welcome_id, "welcome");
        assert_eq!(config.llm.together.model, "mistralai/Mistral-7B-Instruct-v0.3");
        assert!(config.chat.endpoint.starts_with("/api/"));
    }

    #[test]
    fn loaded_chat_defaults_match_struct_default() {
        let config = AppConfig::load("does-not-exist.yaml").unwrap();
        assert_eq!(config.chat, ChatConfig::default());
    }
}
