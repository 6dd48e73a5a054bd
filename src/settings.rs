//! Settings / Configuration.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Names of environments for responder-server.
/// Overrides serialization to force lower case in settings and
/// environment variables
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    /// Local environment (local testing).
    Local,
    /// Official Develop environment.
    Dev,
    /// Official Staging environment.
    Staging,
    /// Official Production environment.
    Prod,
}

/// Implement display to force environment to lower case
impl std::fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

/// Server settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Server {
    /// Server [AppEnvironment].
    pub environment: AppEnvironment,
    /// Server port.
    pub port: u16,
    /// Server metrics port.
    pub metrics_port: u16,
    /// Server timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Document store settings.
#[derive(Clone, Debug, Deserialize)]
pub struct Store {
    /// Base URL of the document store API.
    pub api_url: String,
    /// Maximum number of values the store accepts per `in`-style query.
    pub batch_limit: usize,
}

/// Push channel settings.
#[derive(Clone, Deserialize)]
pub struct Push {
    /// URL of the multicast send endpoint.
    pub api_url: String,
    /// Server key, passed in the `Authorization` header.
    /// Supplied via `RESPONDER_SERVER_PUSH_KEY` in production.
    pub key: String,
}

impl std::fmt::Debug for Push {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Push")
            .field("api_url", &self.api_url)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// SMTP settings for the verification-code mailer.
#[derive(Clone, Deserialize)]
pub struct Smtp {
    /// SMTP relay hostname.
    pub host: String,
    /// SMTP relay port (STARTTLS).
    pub port: u16,
    /// Optional SMTP username.
    /// Supplied via `RESPONDER_SERVER_SMTP_USERNAME` in production.
    pub username: Option<String>,
    /// Optional SMTP password.
    /// Supplied via `RESPONDER_SERVER_SMTP_PASSWORD` in production.
    pub password: Option<String>,
    /// RFC 5322 "From" display name.
    pub from_name: String,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Subject line for verification emails.
    pub subject: String,
}

impl std::fmt::Debug for Smtp {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("Smtp")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Background healthcheck settings
#[derive(Clone, Debug, Deserialize)]
pub struct Healthcheck {
    /// Is background healthcheck enabled?
    #[serde(rename = "enabled")]
    pub is_enabled: bool,
    /// Healthcheck interval in milliseconds.
    pub interval_ms: u64,
    /// Healthcheck max retries.
    pub max_retries: u32,
}

#[derive(Clone, Debug, Deserialize)]
/// Application settings.
pub struct Settings {
    /// Server settings
    pub server: Server,
    /// Document store settings
    pub store: Store,
    /// Push channel settings
    pub push: Push,
    /// SMTP settings
    pub smtp: Smtp,
    /// Healthcheck settings
    pub healthcheck: Healthcheck,
}

impl Settings {
    /// Load settings.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = config_path
            .unwrap_or(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config/settings.toml"));
        // inject environment variables naming them properly on the settings
        // e.g. [smtp] password="foo"
        // would be injected with environment variable RESPONDER_SERVER_SMTP_PASSWORD="foo"
        let s = Config::builder()
            .add_source(File::with_name(&path.as_path().display().to_string()))
            .add_source(
                Environment::with_prefix("RESPONDER_SERVER")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;
        s.try_deserialize()
    }
}
