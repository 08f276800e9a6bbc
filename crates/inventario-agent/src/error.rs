use inventario_client::ClientError;
use inventario_types::Notice;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("could not reach the language model: {0}")]
    Network(#[from] reqwest::Error),

    #[error("language model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("language model returned no text")]
    EmptyResponse,

    #[error("invalid AI response: {0}")]
    InvalidAiResponse(String),

    #[error("AI response has an unexpected shape: {0}")]
    SchemaMismatch(String),

    #[error("{0}")]
    InvalidQuery(String),

    #[error("cannot {event} while {state}")]
    InvalidTransition { state: String, event: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("transcript store error: {0}")]
    Store(String),
}

impl AgentError {
    pub fn to_notice(&self) -> Notice {
        match self {
            AgentError::Network(_) => Notice::error("Error de conexión", "No se pudo contactar el servicio de IA"),
            AgentError::Status { status, .. } => {
                Notice::error("Error del servicio de IA", format!("El servicio respondió con estado {status}"))
            }
            AgentError::EmptyResponse | AgentError::InvalidAiResponse(_) | AgentError::SchemaMismatch(_) => {
                Notice::error("Respuesta inválida de la IA", "La IA devolvió una respuesta que no se pudo interpretar")
            }
            AgentError::InvalidQuery(msg) => Notice::warning("Consulta inválida", msg.clone()),
            AgentError::InvalidTransition { .. } => Notice::warning("Acción no disponible", self.to_string()),
            AgentError::Client(e) => e.to_notice(),
            AgentError::Store(_) => Notice::error("Error al guardar la conversación", self.to_string()),
        }
    }
}

impl From<std::io::Error> for AgentError {
    fn from(e: std::io::Error) -> Self {
        AgentError::Store(e.to_string())
    }
}
