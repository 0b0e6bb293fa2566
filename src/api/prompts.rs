//! System prompts, one per chat mode. Both ask for answers in Russian with
//! language-tagged code fences so the client can highlight them.

use crate::api::models::{ChatMessage, Mode};
use crate::llm::models::Message;

pub const CODE_ANALYSIS_PROMPT: &str = "\
Ты эксперт-программист, который помогает анализировать код и находить в нем ошибки.
Объясняй решения шаг за шагом, указывай на возможные улучшения и оптимизации.
Пиши ответы на русском языке. Используй конкретные примеры, если это поможет пояснить материал.
Оформляй любой код блоками ``` с указанием языка, например ```python.";

pub const TASK_HELP_PROMPT: &str = "\
Ты эксперт по информатике, который помогает ученикам с подготовкой к ЕГЭ и ОГЭ.
Объясняй решения шаг за шагом, ссылайся на соответствующие разделы учебной программы.
Пиши ответы на русском языке. Используй конкретные примеры, если это поможет пояснить материал.
Оформляй любой код блоками ``` с указанием языка, например ```python.";

pub fn system_prompt(mode: Mode) -> &'static str {
    match mode {
        Mode::CodeAnalysis => CODE_ANALYSIS_PROMPT,
        Mode::TaskHelp => TASK_HELP_PROMPT,
    }
}

/// Prepends the mode's system prompt and drops the synthetic greeting.
pub fn build_provider_messages(
    messages: &[ChatMessage],
    mode: Mode,
    welcome_id: &str,
) -> Vec<Message> {
    std::iter::once(Message::new("system", system_prompt(mode)))
        .chain(
            messages
                .iter()
                .filter(|m| m.id != welcome_id)
                .map(|m| Message::new(m.role.as_str(), m.content.clone())),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::Role;

    fn msg(id: &str, role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            role,
            content: content.to_string(),
        }
    }

    #[test]
    fn welcome_message_is_filtered_and_prompt_prepended() {
        let transcript = vec![
            msg("welcome", Role::Assistant, "Привет!"),
            msg("1", Role::User, "Что такое цикл?"),
        ];
        let out = build_provider_messages(&transcript, Mode::TaskHelp, "welcome");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Message::new("system", TASK_HELP_PROMPT));
        assert_eq!(out[1], Message::new("user", "Что такое цикл?"));
    }

    #[test]
    fn mode_selects_prompt() {
        let out = build_provider_messages(&[], Mode::CodeAnalysis, "welcome");
        assert_eq!(out[0].content, CODE_ANALYSIS_PROMPT);
        assert_ne!(system_prompt(Mode::TaskHelp), system_prompt(Mode::CodeAnalysis));
    }
}
