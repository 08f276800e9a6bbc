use std::sync::Arc;

use inventario_types::{Asset, ChatAction};
use tracing::{info, instrument};

use crate::actions::{ChatbotReply, interpret};
use crate::error::AgentError;
use crate::llm::{GenerationConfig, GenerativeModel};
use crate::prompts;
use crate::reconcile::{RepairHint, extract_json};

/// Turns a user request into a structured reply using a generative model.
#[derive(Clone)]
pub struct Chatbot {
    model: Arc<dyn GenerativeModel>,
}

impl Chatbot {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self { model }
    }

    pub fn prompt(action: ChatAction, query: &str, inventory: &[Asset]) -> String {
        match action {
            ChatAction::Create => prompts::create_prompt(query),
            ChatAction::Edit => prompts::edit_prompt(query, inventory),
            ChatAction::Delete => prompts::delete_prompt(query, inventory),
            ChatAction::Consult => prompts::consult_prompt(query, inventory),
        }
    }

    #[instrument(skip(self, inventory), fields(inventory = inventory.len()))]
    pub async fn ask(
        &self,
        action: ChatAction,
        query: &str,
        inventory: &[Asset],
    ) -> Result<ChatbotReply, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery("Escribe tu solicitud antes de enviarla".into()));
        }

        let prompt = Self::prompt(action, query, inventory);
        let text = self.model.generate(&prompt, &GenerationConfig::CHAT).await?;
        let value = extract_json(&text, &RepairHint::none())?;
        let reply = interpret(action, &value)?;
        info!(%action, "chatbot reply interpreted");
        Ok(reply)
    }
}
