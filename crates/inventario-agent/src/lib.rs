//! Natural-language features backed by a generative model: the inventory
//! chatbot and the filtered report generator.
//!
//! Model output is free text.  [`reconcile`] turns it into JSON, repairing
//! truncated answers, and [`actions`] maps that JSON onto typed instructions
//! that are applied through an [`AssetStore`].

pub mod actions;
pub mod chatbot;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod reconcile;
pub mod report;
pub mod transcript;

pub use actions::{AssetStore, ChatbotReply, Instruction, execute, interpret};
pub use chatbot::Chatbot;
pub use conversation::{ChatEvent, ChatState, Conversation, TurnOutcome};
pub use error::AgentError;
pub use llm::{GeminiClient, GenerationConfig, GenerativeModel};
pub use reconcile::{RepairHint, extract_json};
pub use report::{Report, ReportGenerator, query_suggestions, validate_query};
pub use transcript::{FileTranscriptStore, MemoryTranscriptStore, TranscriptDir, TranscriptStore};
