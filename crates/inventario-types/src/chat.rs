use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// What the user asked the assistant to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum ChatAction {
    #[serde(rename = "crear")]
    #[strum(serialize = "crear")]
    Create,
    #[serde(rename = "editar")]
    #[strum(serialize = "editar")]
    Edit,
    #[serde(rename = "eliminar")]
    #[strum(serialize = "eliminar")]
    Delete,
    #[serde(rename = "consultar")]
    #[strum(serialize = "consultar")]
    Consult,
}

impl ChatAction {
    pub fn label(self) -> &'static str {
        match self {
            ChatAction::Create => "Crear activo",
            ChatAction::Edit => "Editar activo",
            ChatAction::Delete => "Eliminar activo",
            ChatAction::Consult => "Consultar inventario",
        }
    }

    /// System message shown once the action is selected.
    pub fn prompt_message(self) -> &'static str {
        match self {
            ChatAction::Create => "¿Qué activo quieres crear? Dime el nombre, tipo, proceso y dueño.",
            ChatAction::Edit => "¿Qué activo quieres editar? Dime el nombre del activo y qué cambios quieres hacer.",
            ChatAction::Delete => "¿Qué activo quieres eliminar? Dime el nombre del activo.",
            ChatAction::Consult => "¿Qué información necesitas? Puedes preguntarme por criticidad, procesos, dueños, etc.",
        }
    }

    /// Whether the model needs an inventory snapshot to answer.
    pub fn needs_inventory(self) -> bool {
        !matches!(self, ChatAction::Create)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChatAction>,
}

impl ChatMessage {
    pub const MAX_CONTENT_CHARS: usize = 1000;
    pub const TRUNCATION_SUFFIX: &'static str = "\n\n... [Respuesta truncada por ser muy larga]";

    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: truncate(content.into()),
            timestamp: Utc::now(),
            action: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn with_action(mut self, action: ChatAction) -> Self {
        self.action = Some(action);
        self
    }
}

fn truncate(content: String) -> String {
    if content.chars().count() <= ChatMessage::MAX_CONTENT_CHARS {
        return content;
    }
    let mut cut: String = content.chars().take(ChatMessage::MAX_CONTENT_CHARS).collect();
    cut.push_str(ChatMessage::TRUNCATION_SUFFIX);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_content_is_truncated_on_char_boundary() {
        let long = "ñ".repeat(1500);
        let msg = ChatMessage::user(long);
        assert!(msg.content.ends_with(ChatMessage::TRUNCATION_SUFFIX));
        let kept = msg.content.trim_end_matches(ChatMessage::TRUNCATION_SUFFIX);
        assert_eq!(kept.chars().count(), ChatMessage::MAX_CONTENT_CHARS);

        let short = ChatMessage::assistant("hola");
        assert_eq!(short.content, "hola");
    }

    #[test]
    fn action_wire_names() {
        let msg = ChatMessage::user("x").with_action(ChatAction::Delete);
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["action"], "eliminar");
        assert_eq!(v["role"], "user");
        assert_eq!("consultar".parse::<ChatAction>().unwrap(), ChatAction::Consult);

        let plain = serde_json::to_value(ChatMessage::system("x")).unwrap();
        assert!(plain.get("action").is_none());
    }
}
