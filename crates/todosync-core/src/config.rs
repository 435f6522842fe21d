// ── Runtime session configuration ──
//
// Describes how to reach the service and where to keep the warm-start
// cache. Never touches disk itself: `todosync-config` (or the embedding
// application) builds a `SessionConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use todosync_api::{TlsMode, TransportConfig};

pub use todosync_api::client::DEFAULT_ENDPOINT;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification. Local test servers only.
    DangerAcceptInvalid,
}

/// Configuration for one sync session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Service root, e.g. `https://api.todoist.com`.
    pub endpoint: String,
    /// API token. Sent with every request, never logged.
    pub token: SecretString,
    /// Directory for the warm-start cache. `None` disables caching.
    pub cache_dir: Option<PathBuf>,
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Ask the service to include notification settings in sync responses.
    pub include_notification_settings: bool,
}

impl SessionConfig {
    pub fn new(token: impl Into<SecretString>) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            token: token.into(),
            cache_dir: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            include_notification_settings: true,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}
