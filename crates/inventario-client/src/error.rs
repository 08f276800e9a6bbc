use inventario_types::Notice;
use thiserror::Error;

/// Errors that can occur while talking to the inventory backend.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {url} timed out after {timeout_ms} ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("{0}")]
    Validation(String),

    #[error("all {attempts} request strategies failed: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: Box<ClientError>,
    },
}

impl ClientError {
    /// Whether the next dispatch strategy should be tried after this error.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(_) | ClientError::Timeout { .. })
    }

    /// HTTP status reported by the backend, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Exhausted { last, .. } => last.status(),
            _ => None,
        }
    }

    pub fn to_notice(&self) -> Notice {
        match self {
            ClientError::Validation(msg) => Notice::error("Datos inválidos", msg.clone()),
            ClientError::Status { status: 404, .. } => {
                Notice::error("Activo no encontrado", self.to_string())
            }
            ClientError::Status { .. } => Notice::error("Error del servidor", self.to_string()),
            ClientError::Timeout { .. } | ClientError::Http(_) | ClientError::Exhausted { .. } => {
                Notice::error(
                    "Error de conexión",
                    format!("No se pudo conectar con la API de inventario: {self}"),
                )
            }
            ClientError::Decode(_) | ClientError::InvalidUrl(_) => {
                Notice::error("Error inesperado", self.to_string())
            }
        }
    }
}
