//! Connectivity probe against the library server.
//!
//! Before the app lets the user past the configure-server step it verifies
//! the saved settings actually reach a server: one authenticated call to the
//! status endpoint. Like the image layer, the probe absorbs every failure —
//! callers get a [`ConnectionStatus`] with a human-readable explanation,
//! never an error.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, StatusCode, header::HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::settings::ConnectionSource;

/// Endpoint probed to verify the connection.
const STATUS_ENDPOINT: &str = "api/v1/system/status";

/// Header carrying the API key on non-image API requests.
///
/// Image fetches must stay header-free (preflight constraint); ordinary API
/// calls like this probe use the conventional key header instead.
const API_KEY_HEADER: &str = "X-Api-Key";

/// Connect timeout for the probe. Kept short so a wrong host fails fast.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Read timeout for the probe.
const READ_TIMEOUT_SECS: u64 = 15;

/// Subset of the server's system status the client reads.
///
/// The endpoint returns far more; unknown fields are ignored so the probe
/// keeps working across server versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemStatus {
    /// Server application name, e.g. `Chaptarr`.
    pub app_name: String,
    /// User-visible instance name.
    pub instance_name: String,
    /// Server version string.
    pub version: String,
    /// Release branch the server runs.
    pub branch: String,
    /// Operating system name reported by the server.
    pub os_name: String,
    /// Authentication mode the server enforces.
    pub authentication: String,
    /// URL base the server is mounted under, when not at the root.
    pub url_base: String,
}

/// Outcome of a connectivity probe.
#[derive(Debug, Clone)]
pub struct ConnectionStatus {
    /// Whether the server answered the authenticated status call.
    pub is_connected: bool,
    /// Human-readable explanation when not connected.
    pub error: Option<String>,
    /// The server's status payload when connected.
    pub system_info: Option<SystemStatus>,
}

impl ConnectionStatus {
    fn connected(info: SystemStatus) -> Self {
        Self {
            is_connected: true,
            error: None,
            system_info: Some(info),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            is_connected: false,
            error: Some(message.into()),
            system_info: None,
        }
    }
}

/// Probes the library server's status endpoint with the current settings.
#[derive(Clone)]
pub struct SystemClient {
    client: Client,
    connection: Arc<dyn ConnectionSource>,
}

impl SystemClient {
    /// Creates a probe client over the given connection source.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new(connection: Arc<dyn ConnectionSource>) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(concat!("covercache/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client, connection }
    }

    /// Creates a probe client around an existing reqwest client.
    #[must_use]
    pub fn with_client(client: Client, connection: Arc<dyn ConnectionSource>) -> Self {
        Self { client, connection }
    }

    /// Checks whether the configured server is reachable and the API key is
    /// accepted. All failures are absorbed into the returned status.
    pub async fn check_status(&self) -> ConnectionStatus {
        let Some(base) = self.connection.base_url() else {
            return ConnectionStatus::failed(
                "No server configured. Please set a server URL and API key.",
            );
        };
        let Some(api_key) = self.connection.api_key() else {
            return ConnectionStatus::failed(
                "No API key configured. Please set a server URL and API key.",
            );
        };
        let Ok(header_value) = HeaderValue::from_str(&api_key) else {
            return ConnectionStatus::failed("API key contains invalid characters");
        };

        let url = format!("{base}/{STATUS_ENDPOINT}");
        debug!(url = %url, "Probing server status");

        let response = match self
            .client
            .get(&url)
            .header(API_KEY_HEADER, header_value)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                warn!(url = %url, error = %error, "Server probe failed");
                let message = if error.is_connect() || error.is_timeout() {
                    "Server is unreachable. Please check your server URL."
                } else {
                    "Unable to connect to server"
                };
                return ConnectionStatus::failed(message);
            }
        };

        let status = response.status();
        if status.is_success() {
            match response.json::<SystemStatus>().await {
                Ok(info) => ConnectionStatus::connected(info),
                Err(error) => {
                    warn!(url = %url, error = %error, "Status payload was not valid");
                    ConnectionStatus::failed("Server returned an unexpected response")
                }
            }
        } else if status == StatusCode::UNAUTHORIZED {
            ConnectionStatus::failed("Invalid API key")
        } else if status == StatusCode::NOT_FOUND {
            ConnectionStatus::failed("Invalid server URL or API endpoint not found")
        } else {
            warn!(url = %url, status = status.as_u16(), "Server probe returned error status");
            ConnectionStatus::failed(format!(
                "Unable to connect to server (HTTP {})",
                status.as_u16()
            ))
        }
    }
}
