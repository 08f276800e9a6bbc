//! Persistence for chat transcripts.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use inventario_types::ChatMessage;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::AgentError;

/// Key the transcript is stored under.
pub const TRANSCRIPT_KEY: &str = "chatbot-messages";

#[async_trait]
pub trait TranscriptStore: Send + Sync {
    async fn load(&self) -> Result<Vec<ChatMessage>, AgentError>;
    async fn save(&self, messages: &[ChatMessage]) -> Result<(), AgentError>;
    async fn clear(&self) -> Result<(), AgentError>;
}

#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    messages: Mutex<Vec<ChatMessage>>,
}

impl MemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> AgentError {
    AgentError::Store("transcript lock poisoned".into())
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, AgentError> {
        Ok(self.messages.lock().map_err(poisoned)?.clone())
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), AgentError> {
        *self.messages.lock().map_err(poisoned)? = messages.to_vec();
        Ok(())
    }

    async fn clear(&self) -> Result<(), AgentError> {
        self.messages.lock().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// A JSON file holding a key/value map, with the transcript under
/// [`TRANSCRIPT_KEY`].  Other keys in the file are preserved.
#[derive(Debug, Clone)]
pub struct FileTranscriptStore {
    path: PathBuf,
}

impl FileTranscriptStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn read_map(&self) -> Result<Map<String, Value>, AgentError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(Map::new()),
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AgentError::Store(format!("{}: {e}", self.path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_map(&self, map: &Map<String, Value>) -> Result<(), AgentError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let bytes = serde_json::to_vec_pretty(map).map_err(|e| AgentError::Store(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await?;
        debug!(path = %self.path.display(), "transcript written");
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn load(&self) -> Result<Vec<ChatMessage>, AgentError> {
        let mut map = self.read_map().await?;
        match map.remove(TRANSCRIPT_KEY) {
            Some(value) => serde_json::from_value(value).map_err(|e| AgentError::Store(e.to_string())),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, messages: &[ChatMessage]) -> Result<(), AgentError> {
        let mut map = self.read_map().await?;
        let value = serde_json::to_value(messages).map_err(|e| AgentError::Store(e.to_string()))?;
        map.insert(TRANSCRIPT_KEY.to_string(), value);
        self.write_map(&map).await
    }

    async fn clear(&self) -> Result<(), AgentError> {
        let mut map = self.read_map().await?;
        if map.remove(TRANSCRIPT_KEY).is_some() {
            self.write_map(&map).await?;
        }
        Ok(())
    }
}

/// One file store per conversation id, all under `dir`.
#[derive(Debug, Clone)]
pub struct TranscriptDir {
    dir: PathBuf,
}

impl TranscriptDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conversation: &str) -> PathBuf {
        let safe: String = conversation
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }

    /// Store for `conversation`; ids are reduced to filename-safe characters.
    pub fn store(&self, conversation: &str) -> FileTranscriptStore {
        FileTranscriptStore::new(self.path_for(conversation))
    }

    /// Whether a transcript was ever written for `conversation`.
    pub async fn contains(&self, conversation: &str) -> bool {
        tokio::fs::try_exists(self.path_for(conversation)).await.unwrap_or(false)
    }
}
