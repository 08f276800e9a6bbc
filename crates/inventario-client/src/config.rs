use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use url::Url;

use crate::error::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://inventoryapp.usbtopia.usbbog.edu.co";
pub const DEFAULT_PROXY_ORIGIN: &str = "http://localhost:3000";
pub const PROXY_PATH: &str = "/api/proxy";
pub const INVENTORY_ENDPOINT: &str = "/inventario/";

/// Where requests are sent: through the same-origin proxy or straight to the
/// backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

/// Builder-style configuration for [`crate::InventoryClient`].
///
/// ```
/// use inventario_client::{ApiConfig, RuntimeMode};
/// let config = ApiConfig::new()
///     .set_mode(RuntimeMode::Development)
///     .set_proxy_origin("http://localhost:3000")
///     .set_list_timeout_ms(5_000);
/// assert_eq!(config.mode(), RuntimeMode::Development);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub(crate) base_url: String,
    pub(crate) proxy_origin: String,
    pub(crate) mode: RuntimeMode,
    pub(crate) list_timeout: Duration,
    pub(crate) item_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy_origin: DEFAULT_PROXY_ORIGIN.to_string(),
            mode: RuntimeMode::Production,
            list_timeout: Duration::from_millis(15_000),
            item_timeout: Duration::from_millis(10_000),
        }
    }

    /// External backend URL used in production mode and by the proxy itself.
    pub fn set_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Origin hosting `/api/proxy` in development mode.
    pub fn set_proxy_origin(mut self, origin: impl Into<String>) -> Self {
        self.proxy_origin = origin.into();
        self
    }

    pub fn set_mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Per-attempt timeout for list requests (default: 15 s).
    pub fn set_list_timeout_ms(mut self, ms: u64) -> Self {
        self.list_timeout = Duration::from_millis(ms);
        self
    }

    /// Per-attempt timeout for single-item requests and mutations (default: 10 s).
    pub fn set_item_timeout_ms(mut self, ms: u64) -> Self {
        self.item_timeout = Duration::from_millis(ms);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn list_timeout(&self) -> Duration {
        self.list_timeout
    }

    pub fn item_timeout(&self) -> Duration {
        self.item_timeout
    }

    /// Full URL for `endpoint` with `params` as query string.
    ///
    /// In development the endpoint travels as the `endpoint` parameter of the
    /// proxy URL; in production it is joined onto the base URL.  Only the
    /// parameters given are emitted.
    pub fn build_url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url, ClientError> {
        let mut url = match self.mode {
            RuntimeMode::Development => {
                let mut url = Url::parse(&join_path(&self.proxy_origin, PROXY_PATH))?;
                url.query_pairs_mut().append_pair("endpoint", endpoint);
                url
            }
            RuntimeMode::Production => Url::parse(&join_path(&self.base_url, endpoint))?,
        };
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Join `base` and `endpoint` with exactly one `/` between them.
pub fn join_path(base: &str, endpoint: &str) -> String {
    let base = base.trim_end_matches('/');
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}/{endpoint}")
}

/// Endpoint of a single asset; never produces a double slash.
pub fn item_endpoint(id: i64) -> String {
    join_path(INVENTORY_ENDPOINT, &id.to_string())
}
