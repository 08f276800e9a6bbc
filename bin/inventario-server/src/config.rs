//! Server configuration, loaded from environment variables at startup.

use inventario_agent::llm::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use inventario_client::RuntimeMode;
use inventario_client::config::DEFAULT_BASE_URL;

/// Runtime configuration for inventario-server.
///
/// Every field has a default so the server starts without any environment
/// variables set; the AI endpoints stay disabled until a key is provided.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:3000"`).
    pub bind_address: String,

    /// Root of the external inventory API that the proxy forwards to.
    pub api_base_url: String,

    /// In development, request and response bodies are logged.
    pub mode: RuntimeMode,

    /// Upstream request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Comma-separated list of allowed CORS origins; `None` allows any.
    pub cors_allowed_origins: Option<String>,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_endpoint: String,

    /// Directory for chat transcripts.  Kept in memory when unset.
    pub transcript_dir: Option<String>,

    /// Open conversations kept in memory.
    pub max_conversations: usize,

    /// Seconds without a command before a conversation is closed.
    pub conversation_idle_secs: u64,

    /// Login accounts as `user:password:role;...`.  `None` uses the
    /// built-in demonstration accounts.
    pub users: Option<String>,

    /// Seconds a login token stays valid.
    pub session_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_owned(),
            api_base_url: DEFAULT_BASE_URL.to_owned(),
            mode: RuntimeMode::Production,
            timeout_ms: 15_000,
            cors_allowed_origins: None,
            log_level: "info".to_owned(),
            log_json: false,
            gemini_api_key: None,
            gemini_model: DEFAULT_MODEL.to_owned(),
            gemini_endpoint: DEFAULT_ENDPOINT.to_owned(),
            transcript_dir: None,
            max_conversations: 256,
            conversation_idle_secs: 3_600,
            users: None,
            session_ttl_secs: 8 * 3_600,
        }
    }
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_address: env_or("INVENTARIO_BIND", &d.bind_address),
            api_base_url: env_or("INVENTARIO_API_BASE_URL", &d.api_base_url),
            mode: parse_env("INVENTARIO_MODE", d.mode),
            timeout_ms: parse_env("INVENTARIO_TIMEOUT_MS", d.timeout_ms),
            cors_allowed_origins: env_opt("INVENTARIO_CORS_ORIGINS"),
            log_level: env_or("INVENTARIO_LOG", &d.log_level),
            log_json: std::env::var("INVENTARIO_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            gemini_api_key: env_opt("GEMINI_API_KEY"),
            gemini_model: env_or("GEMINI_MODEL", &d.gemini_model),
            gemini_endpoint: env_or("GEMINI_ENDPOINT", &d.gemini_endpoint),
            transcript_dir: env_opt("INVENTARIO_TRANSCRIPT_DIR"),
            max_conversations: parse_env("INVENTARIO_MAX_CONVERSATIONS", d.max_conversations),
            conversation_idle_secs: parse_env("INVENTARIO_CONVERSATION_IDLE_SECS", d.conversation_idle_secs),
            users: env_opt("INVENTARIO_USERS"),
            session_ttl_secs: parse_env("INVENTARIO_SESSION_TTL_SECS", d.session_ttl_secs),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
