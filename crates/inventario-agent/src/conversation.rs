//! The chat flow: action selection, the request/response turn, and the
//! persisted transcript.

use std::sync::Arc;

use inventario_types::{Asset, ChatAction, ChatMessage, Notice, Session};
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use crate::actions::{AssetStore, ChatbotReply, execute};
use crate::chatbot::Chatbot;
use crate::error::AgentError;
use crate::transcript::TranscriptStore;

pub const WELCOME: &str = "¡Hola! Soy tu asistente de inventario. ¿Qué quieres hacer?";
pub const RESTARTED: &str = "Chat reiniciado. ¡Hola! ¿Qué quieres hacer?";
pub const MENU: &str = "¿Qué quieres hacer? Selecciona una opción:";
pub const APOLOGY: &str = "❌ Lo siento, hubo un error procesando tu solicitud. ¿Puedes intentar de nuevo?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(tag = "state", content = "action", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatState {
    Idle,
    ActionSelected(ChatAction),
    AwaitingText(ChatAction),
    Sending(ChatAction),
    Succeeded,
    Failed(ChatAction),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChatEvent {
    Select(ChatAction),
    /// The action's prompt message was shown.
    Prompt,
    Submit,
    Complete,
    Fail,
    /// Leave a finished turn.
    Resume,
    Reset,
}

impl ChatState {
    pub fn next(self, event: ChatEvent) -> Result<ChatState, AgentError> {
        use ChatEvent::*;
        use ChatState::*;

        let next = match (self, event) {
            (_, Reset) => Idle,
            (Idle, Select(action)) => ActionSelected(action),
            (ActionSelected(action), Prompt) => AwaitingText(action),
            (AwaitingText(action), Submit) => Sending(action),
            (Sending(_), Complete) => Succeeded,
            (Sending(action), Fail) => Failed(action),
            (Succeeded, Resume) => Idle,
            (Failed(action), Resume) => AwaitingText(action),
            (state, event) => {
                return Err(AgentError::InvalidTransition {
                    state: state.to_string(),
                    event: event.to_string(),
                });
            }
        };
        Ok(next)
    }

    /// The action a turn would be sent with, if text is expected now.
    pub fn awaiting(self) -> Option<ChatAction> {
        match self {
            ChatState::AwaitingText(action) => Some(action),
            _ => None,
        }
    }
}

/// What one submitted turn produced.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub appended: Vec<ChatMessage>,
    pub notice: Option<Notice>,
    pub state: ChatState,
}

pub struct Conversation {
    state: ChatState,
    messages: Vec<ChatMessage>,
    transcript: Arc<dyn TranscriptStore>,
    snapshot: Option<Vec<Asset>>,
}

impl Conversation {
    /// Resume the stored transcript, greeting the user when it is empty.
    pub async fn open(transcript: Arc<dyn TranscriptStore>) -> Result<Self, AgentError> {
        let messages = transcript.load().await?;
        let mut conversation = Self { state: ChatState::Idle, messages, transcript, snapshot: None };
        if conversation.messages.is_empty() {
            conversation.push(ChatMessage::system(WELCOME)).await?;
        }
        Ok(conversation)
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    async fn push(&mut self, message: ChatMessage) -> Result<(), AgentError> {
        self.messages.push(message);
        self.transcript.save(&self.messages).await
    }

    fn advance(&mut self, event: ChatEvent) -> Result<(), AgentError> {
        self.state = self.state.next(event)?;
        Ok(())
    }

    pub async fn select_action(&mut self, action: ChatAction) -> Result<(), AgentError> {
        self.advance(ChatEvent::Select(action))?;
        self.push(ChatMessage::system(action.prompt_message()).with_action(action)).await?;
        self.advance(ChatEvent::Prompt)
    }

    /// Leave the current action and show the menu again.
    pub async fn back_to_menu(&mut self) -> Result<(), AgentError> {
        self.advance(ChatEvent::Reset)?;
        self.push(ChatMessage::system(MENU)).await
    }

    /// Wipe the transcript and start over.
    pub async fn reset(&mut self) -> Result<(), AgentError> {
        self.advance(ChatEvent::Reset)?;
        self.messages.clear();
        self.snapshot = None;
        self.transcript.clear().await?;
        self.push(ChatMessage::system(RESTARTED)).await
    }

    async fn inventory(&mut self, store: &dyn AssetStore, session: &Session) -> (Vec<Asset>, Option<Notice>) {
        if let Some(snapshot) = &self.snapshot {
            return (snapshot.clone(), None);
        }
        match store.list_assets().await {
            Ok(assets) => {
                let visible = session.visible(assets);
                info!(count = visible.len(), "chat inventory snapshot loaded");
                self.snapshot = Some(visible.clone());
                (visible, None)
            }
            Err(e) => {
                warn!(error = %e, "could not load inventory for chat");
                (Vec::new(), Some(Notice::error("Error", "No se pudieron cargar los datos del inventario")))
            }
        }
    }

    /// Run one turn while `Sending`.  Returns the notice and whether the turn
    /// failed; an `Err` means the transcript could not be saved.
    async fn turn(
        &mut self,
        action: ChatAction,
        text: &str,
        chatbot: &Chatbot,
        store: &dyn AssetStore,
        session: &Session,
    ) -> Result<(Option<Notice>, bool), AgentError> {
        self.push(ChatMessage::user(text).with_action(action)).await?;

        let (inventory, mut notice) = if action.needs_inventory() {
            self.inventory(store, session).await
        } else {
            (Vec::new(), None)
        };

        let failed = match chatbot.ask(action, text, &inventory).await {
            Ok(ChatbotReply::Answer { message, .. }) => {
                self.push(ChatMessage::assistant(message).with_action(action)).await?;
                false
            }
            Ok(ChatbotReply::Instruction(instruction)) => {
                let summary = match instruction.instructions().trim() {
                    "" => action.label(),
                    s => s,
                };
                self.push(ChatMessage::assistant(format!("✅ {summary}")).with_action(action)).await?;
                match execute(&instruction, store, session).await {
                    Ok(done) => {
                        self.snapshot = None;
                        notice = Some(done);
                        false
                    }
                    Err(e) => {
                        warn!(error = %e, %action, "chat instruction failed");
                        notice = Some(Notice::error("Error", format!("No se pudo completar la acción: {e}")));
                        true
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, %action, "chatbot request failed");
                self.push(ChatMessage::assistant(APOLOGY).with_action(action)).await?;
                notice = Some(e.to_notice());
                true
            }
        };
        Ok((notice, failed))
    }

    /// Send `text` for the selected action and apply the reply.
    ///
    /// Model and execution failures are reported in the transcript and the
    /// returned notice; the conversation goes back to awaiting text.  Only
    /// illegal transitions, blank input and transcript failures are errors;
    /// after a transcript failure the conversation also awaits text again.
    pub async fn submit(
        &mut self,
        text: &str,
        chatbot: &Chatbot,
        store: &dyn AssetStore,
        session: &Session,
    ) -> Result<TurnOutcome, AgentError> {
        let Some(action) = self.state.awaiting() else {
            return Err(AgentError::InvalidTransition {
                state: self.state.to_string(),
                event: ChatEvent::Submit.to_string(),
            });
        };
        if text.trim().is_empty() {
            return Err(AgentError::InvalidQuery("Escribe tu solicitud antes de enviarla".into()));
        }

        let first_new = self.messages.len();
        self.advance(ChatEvent::Submit)?;
        let (notice, failed) = match self.turn(action, text, chatbot, store, session).await {
            Ok(turn) => turn,
            Err(e) => {
                // back to awaiting text
                warn!(error = %e, %action, "chat turn aborted");
                self.advance(ChatEvent::Fail)?;
                self.advance(ChatEvent::Resume)?;
                return Err(e);
            }
        };

        if failed {
            self.advance(ChatEvent::Fail)?;
        } else {
            self.advance(ChatEvent::Complete)?;
        }
        let state = self.state;
        self.advance(ChatEvent::Resume)?;

        Ok(TurnOutcome {
            appended: self.messages[first_new..].to_vec(),
            notice,
            state,
        })
    }
}
