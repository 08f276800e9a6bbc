//! Shared application state injected into every Axum handler.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use inventario_agent::{
    AgentError, Chatbot, Conversation, GeminiClient, GenerativeModel, MemoryTranscriptStore, ReportGenerator,
    TranscriptDir, TranscriptStore,
};
use inventario_client::{ApiConfig, InventoryClient, RuntimeMode};
use inventario_types::{Accounts, Session};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::Config;

/// Logged-in sessions, keyed by bearer token.
pub struct Sessions {
    accounts: Accounts,
    ttl: Duration,
    active: RwLock<HashMap<String, (Session, Instant)>>,
}

impl Sessions {
    pub fn new(accounts: Accounts, ttl: Duration) -> Self {
        Self { accounts, ttl, active: RwLock::new(HashMap::new()) }
    }

    /// A new session for matching credentials.  Expired sessions are dropped
    /// on every login.
    pub async fn login(&self, username: &str, password: &str) -> Option<Session> {
        let session = self.accounts.authenticate(username, password)?;
        let mut active = self.active.write().await;
        let ttl = self.ttl;
        active.retain(|_, (_, issued)| issued.elapsed() < ttl);
        active.insert(session.token.clone(), (session.clone(), Instant::now()));
        Some(session)
    }

    pub async fn resolve(&self, token: &str) -> Option<Session> {
        let active = self.active.read().await;
        active
            .get(token)
            .filter(|(_, issued)| issued.elapsed() < self.ttl)
            .map(|(session, _)| session.clone())
    }

    /// Returns `false` when the token was not logged in.
    pub async fn logout(&self, token: &str) -> bool {
        self.active.write().await.remove(token).is_some()
    }

    pub async fn len(&self) -> usize {
        self.active.read().await.len()
    }
}

struct OpenConversation {
    conversation: Arc<Mutex<Conversation>>,
    last_used: Instant,
}

/// Open chat conversations, keyed by owner and conversation id.
///
/// The map lock is only held to look up or insert an entry; each
/// conversation has its own lock for the duration of a turn.  Conversations
/// idle for longer than `idle` are closed, and past `capacity` the least
/// recently used one is closed.  Closed conversations resume from their
/// transcript file when a transcript directory is configured.
pub struct Conversations {
    open: Mutex<HashMap<String, OpenConversation>>,
    dir: Option<TranscriptDir>,
    idle: Duration,
    capacity: usize,
}

fn conversation_key(owner: &str, id: &str) -> String {
    format!("{owner}-{id}")
}

impl Conversations {
    pub fn new(dir: Option<TranscriptDir>, idle: Duration, capacity: usize) -> Self {
        Self { open: Mutex::new(HashMap::new()), dir, idle, capacity: capacity.max(1) }
    }

    /// The conversation `id` of `owner`, resumed from its transcript or
    /// started on first use.
    pub async fn get_or_open(&self, owner: &str, id: &str) -> Result<Arc<Mutex<Conversation>>, AgentError> {
        let key = conversation_key(owner, id);
        let mut open = self.open.lock().await;
        if let Some(entry) = open.get_mut(&key) {
            entry.last_used = Instant::now();
            return Ok(entry.conversation.clone());
        }

        self.evict(&mut open);
        let conversation = Arc::new(Mutex::new(Conversation::open(self.store_for(&key)).await?));
        open.insert(key, OpenConversation { conversation: conversation.clone(), last_used: Instant::now() });
        info!(conversation = %id, owner = %owner, open = open.len(), "conversation opened");
        Ok(conversation)
    }

    /// The conversation `id` of `owner` if it is open or has a transcript.
    /// Never starts a new one.
    pub async fn get(&self, owner: &str, id: &str) -> Result<Option<Arc<Mutex<Conversation>>>, AgentError> {
        let key = conversation_key(owner, id);
        let mut open = self.open.lock().await;
        if let Some(entry) = open.get_mut(&key) {
            entry.last_used = Instant::now();
            return Ok(Some(entry.conversation.clone()));
        }
        let Some(dir) = &self.dir else {
            return Ok(None);
        };
        if !dir.contains(&key).await {
            return Ok(None);
        }
        self.evict(&mut open);
        let conversation = Arc::new(Mutex::new(Conversation::open(Arc::new(dir.store(&key))).await?));
        open.insert(key, OpenConversation { conversation: conversation.clone(), last_used: Instant::now() });
        info!(conversation = %id, owner = %owner, "conversation resumed");
        Ok(Some(conversation))
    }

    fn store_for(&self, key: &str) -> Arc<dyn TranscriptStore> {
        match &self.dir {
            Some(dir) => Arc::new(dir.store(key)),
            None => Arc::new(MemoryTranscriptStore::new()),
        }
    }

    /// Drops idle entries, then makes room for one more.
    fn evict(&self, open: &mut HashMap<String, OpenConversation>) {
        let before = open.len();
        open.retain(|_, entry| entry.last_used.elapsed() < self.idle);
        while open.len() >= self.capacity {
            let Some(oldest) = open.iter().min_by_key(|(_, e)| e.last_used).map(|(k, _)| k.clone()) else {
                break;
            };
            open.remove(&oldest);
        }
        if open.len() < before {
            debug!(closed = before - open.len(), "closed conversations");
        }
    }

    pub async fn len(&self) -> usize {
        self.open.lock().await.len()
    }
}

/// State shared across all HTTP handlers.
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Raw HTTP client used by the proxy.
    pub http: reqwest::Client,
    /// Direct client for the inventory backend.
    pub inventory: InventoryClient,
    /// `None` when no model key is configured.
    pub chatbot: Option<Chatbot>,
    pub reports: Option<ReportGenerator>,
    pub conversations: Conversations,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let model = config.gemini_api_key.as_ref().map(|key| {
            Arc::new(
                GeminiClient::new(key.as_str())
                    .set_model(config.gemini_model.as_str())
                    .set_endpoint(config.gemini_endpoint.as_str()),
            ) as Arc<dyn GenerativeModel>
        });
        Self::with_model(config, model)
    }

    pub fn with_model(config: Config, model: Option<Arc<dyn GenerativeModel>>) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("inventario-proxy/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();

        // The server is the proxy, so its own client always goes direct.
        let inventory = InventoryClient::new(
            ApiConfig::new()
                .set_base_url(config.api_base_url.as_str())
                .set_mode(RuntimeMode::Production)
                .set_list_timeout_ms(config.timeout_ms)
                .set_item_timeout_ms(config.timeout_ms),
        );

        let conversations = Conversations::new(
            config.transcript_dir.as_deref().map(TranscriptDir::new),
            Duration::from_secs(config.conversation_idle_secs),
            config.max_conversations,
        );
        let sessions = Sessions::new(Accounts::builtin(), Duration::from_secs(config.session_ttl_secs));

        Self {
            config: Arc::new(config),
            http,
            inventory,
            chatbot: model.clone().map(Chatbot::new),
            reports: model.map(ReportGenerator::new),
            conversations,
            sessions,
        }
    }

    /// Replace the built-in login accounts.
    pub fn set_accounts(mut self, accounts: Accounts) -> Self {
        self.sessions = Sessions::new(accounts, Duration::from_secs(self.config.session_ttl_secs));
        self
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
