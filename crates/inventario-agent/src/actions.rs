//! Mapping parsed model output onto inventory instructions, and carrying them out.

use async_trait::async_trait;
use inventario_client::InventoryClient;
use inventario_types::{Asset, AssetFields, ChatAction, Notice, NoticeLevel, Permission, Session};
use serde_json::{Map, Value};
use tracing::info;

use crate::error::AgentError;

/// A mutation the model proposed.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Create { fields: AssetFields, instructions: String },
    Edit { id: i64, changes: AssetFields, instructions: String },
    Delete { id: i64, name: Option<String>, instructions: String },
}

impl Instruction {
    pub fn action(&self) -> ChatAction {
        match self {
            Instruction::Create { .. } => ChatAction::Create,
            Instruction::Edit { .. } => ChatAction::Edit,
            Instruction::Delete { .. } => ChatAction::Delete,
        }
    }

    pub fn instructions(&self) -> &str {
        match self {
            Instruction::Create { instructions, .. }
            | Instruction::Edit { instructions, .. }
            | Instruction::Delete { instructions, .. } => instructions,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatbotReply {
    Instruction(Instruction),
    /// Free-text answer to a consult.
    Answer { message: String, level: NoticeLevel },
}

fn mismatch(msg: impl Into<String>) -> AgentError {
    AgentError::SchemaMismatch(msg.into())
}

fn object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>, AgentError> {
    value.as_object().ok_or_else(|| mismatch(format!("`{what}` is not an object")))
}

/// Ids arrive as numbers or as numeric strings.
fn parse_id(value: Option<&Value>) -> Result<i64, AgentError> {
    let id = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0).ok_or_else(|| mismatch("missing or invalid `id`"))
}

/// Asset fields from a JSON object, ignoring nulls and blank strings.
fn parse_fields(value: &Value, what: &str) -> Result<AssetFields, AgentError> {
    let cleaned: Map<String, Value> = object(value, what)?
        .iter()
        .filter(|(_, v)| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    serde_json::from_value(Value::Object(cleaned)).map_err(|e| mismatch(format!("`{what}`: {e}")))
}

fn instructions(root: &Map<String, Value>) -> String {
    root.get("instructions").and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Match parsed output against the shape expected for `action`.
pub fn interpret(action: ChatAction, value: &Value) -> Result<ChatbotReply, AgentError> {
    let root = object(value, "response")?;

    if action == ChatAction::Consult {
        let message = root
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| mismatch("consult answer without `message`"))?;
        let level = root
            .get("type")
            .and_then(|t| serde_json::from_value(t.clone()).ok())
            .unwrap_or(NoticeLevel::Info);
        return Ok(ChatbotReply::Answer { message: message.to_string(), level });
    }

    if let Some(named) = root.get("action").and_then(Value::as_str) {
        if named != action.to_string() {
            return Err(mismatch(format!("expected action `{action}`, got `{named}`")));
        }
    }
    let data = root.get("data").ok_or_else(|| mismatch("missing `data`"))?;
    let instructions = instructions(root);

    let instruction = match action {
        ChatAction::Create => Instruction::Create { fields: parse_fields(data, "data")?, instructions },
        ChatAction::Edit => {
            let data = object(data, "data")?;
            let changes = data.get("changes").ok_or_else(|| mismatch("missing `changes`"))?;
            Instruction::Edit {
                id: parse_id(data.get("id"))?,
                changes: parse_fields(changes, "changes")?,
                instructions,
            }
        }
        ChatAction::Delete => {
            let data = object(data, "data")?;
            Instruction::Delete {
                id: parse_id(data.get("id"))?,
                name: data.get("name").and_then(Value::as_str).map(str::to_string),
                instructions,
            }
        }
        ChatAction::Consult => unreachable!("consult handled above"),
    };
    Ok(ChatbotReply::Instruction(instruction))
}

/// Where chat instructions are applied.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn list_assets(&self) -> Result<Vec<Asset>, AgentError>;
    async fn create_asset(&self, fields: &AssetFields) -> Result<Asset, AgentError>;
    async fn update_asset(&self, id: i64, changes: &AssetFields) -> Result<Asset, AgentError>;
    async fn delete_asset(&self, id: i64) -> Result<(), AgentError>;
}

#[async_trait]
impl AssetStore for InventoryClient {
    async fn list_assets(&self) -> Result<Vec<Asset>, AgentError> {
        Ok(self.list_all().await?)
    }

    async fn create_asset(&self, fields: &AssetFields) -> Result<Asset, AgentError> {
        Ok(self.create_validated(fields).await?)
    }

    async fn update_asset(&self, id: i64, changes: &AssetFields) -> Result<Asset, AgentError> {
        inventario_client::validate_update(changes)?;
        Ok(self.patch(id, changes).await?)
    }

    async fn delete_asset(&self, id: i64) -> Result<(), AgentError> {
        self.delete_validated(id).await?;
        Ok(())
    }
}

/// Fill the fields a created asset must carry when the model left them out.
pub fn with_create_defaults(mut fields: AssetFields) -> AssetFields {
    fields.conservation_medium.get_or_insert_with(|| "Digital".into());
    fields.format.get_or_insert_with(|| "Digital".into());
    fields.language.get_or_insert_with(|| "Español".into());
    fields
}

fn require(session: &Session, permission: Permission) -> Result<(), AgentError> {
    if session.can(permission) {
        Ok(())
    } else {
        Err(AgentError::InvalidQuery(format!(
            "El rol {} no tiene permiso para esta acción",
            session.role
        )))
    }
}

/// Apply `instruction` to `store` on behalf of `session`.
pub async fn execute(
    instruction: &Instruction,
    store: &dyn AssetStore,
    session: &Session,
) -> Result<Notice, AgentError> {
    match instruction {
        Instruction::Create { fields, .. } => {
            require(session, Permission::Create)?;
            let created = store.create_asset(&with_create_defaults(fields.clone())).await?;
            info!(id = created.id, user = %session.username, "chat created asset");
            Ok(Notice::success(
                "Acción completada",
                format!("Activo \"{}\" creado exitosamente", created.display_name()),
            ))
        }
        Instruction::Edit { id, changes, .. } => {
            require(session, Permission::Edit)?;
            store.update_asset(*id, changes).await?;
            info!(id, user = %session.username, "chat updated asset");
            Ok(Notice::success("Acción completada", "Activo actualizado correctamente"))
        }
        Instruction::Delete { id, name, .. } => {
            require(session, Permission::Delete)?;
            store.delete_asset(*id).await?;
            info!(id, user = %session.username, "chat deleted asset");
            let label = name.clone().unwrap_or_else(|| format!("#{id}"));
            Ok(Notice::success("Acción completada", format!("Activo \"{label}\" eliminado")))
        }
    }
}
