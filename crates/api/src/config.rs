use domain::services::{ApprovalSettings, ScanSerialization};
use serde::{Deserialize, Serialize};
use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub event: EventConfig,
    /// Email service configuration
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Where guest records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process memory; lost on restart.
    Memory,
    /// One JSON document on local disk.
    JsonFile,
    /// The `guests` table in PostgreSQL.
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,

    /// Path of the guest file (json_file backend)
    #[serde(default = "default_json_path")]
    pub json_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
        }
    }
}

impl From<&DatabaseConfig> for persistence::db::DatabaseConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            url: config.url.clone(),
            max_connections: config.max_connections,
            min_connections: config.min_connections,
            connect_timeout_secs: config.connect_timeout_secs,
            idle_timeout_secs: config.idle_timeout_secs,
        }
    }
}

/// The single event this deployment admits guests to.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    /// Event name and date shown in approval emails
    #[serde(default = "default_event_label")]
    pub label: String,

    /// Allow switching a decided guest between approved and rejected
    #[serde(default)]
    pub allow_status_override: bool,

    /// How concurrent scans of the same code are serialized
    #[serde(default)]
    pub scan_serialization: ScanSerialization,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            label: default_event_label(),
            allow_status_override: false,
            scan_serialization: ScanSerialization::default(),
        }
    }
}

impl EventConfig {
    pub fn approval_settings(&self) -> ApprovalSettings {
        ApprovalSettings {
            event_label: self.label.clone(),
            allow_status_override: self.allow_status_override,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Registrations accepted per minute across all clients (0 disables the limit)
    #[serde(default = "default_registration_rate_limit")]
    pub registration_rate_limit_per_minute: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_origins: Vec::new(),
            registration_rate_limit_per_minute: default_registration_rate_limit(),
        }
    }
}

/// Email service configuration for approval notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether email sending is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Email provider: sendgrid, or console (for development)
    #[serde(default = "default_email_provider")]
    pub provider: String,

    /// SendGrid API key (for sendgrid provider)
    #[serde(default)]
    pub sendgrid_api_key: String,

    /// Sender email address (From header)
    #[serde(default = "default_sender_email")]
    pub sender_email: String,

    /// Sender name (From header)
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Base URL of the attendee ticket page; the guest id is appended
    #[serde(default)]
    pub ticket_base_url: String,

    /// Email template style: html or plain
    #[serde(default = "default_template_style")]
    pub template_style: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_email_provider(),
            sendgrid_api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            ticket_base_url: String::new(),
            template_style: default_template_style(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    30
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::JsonFile
}
fn default_json_path() -> PathBuf {
    PathBuf::from("data/guests.json")
}
fn default_max_connections() -> u32 {
    10
}
fn default_min_connections() -> u32 {
    1
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_event_label() -> String {
    "Private event".to_string()
}
fn default_registration_rate_limit() -> u32 {
    30
}
fn default_email_provider() -> String {
    "console".to_string()
}
fn default_sender_email() -> String {
    "noreply@guestlist.local".to_string()
}
fn default_sender_name() -> String {
    "Guest List".to_string()
}
fn default_template_style() -> String {
    "html".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with GL__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("GL").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Defaults are embedded so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            request_timeout_secs = 30

            [logging]
            level = "info"
            format = "json"

            [storage]
            backend = "memory"
            json_path = "data/guests.json"

            [database]
            url = ""

            [event]
            label = "Test Party"
            allow_status_override = false
            scan_serialization = "per_guest_lock"

            [security]
            cors_origins = []
            registration_rate_limit_per_minute = 0

            [email]
            enabled = false
            provider = "console"
            sender_email = "test@example.com"
            sender_name = "Test"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        // Skip validation in tests to allow partial configs
        builder.build()?.try_deserialize()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.socket_addr().is_err() {
            return Err(ConfigValidationError::InvalidValue(format!(
                "Invalid server host: {}",
                self.server.host
            )));
        }

        match self.storage.backend {
            StorageBackend::Postgres => {
                if self.database.url.is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "GL__DATABASE__URL must be set for the postgres backend".to_string(),
                    ));
                }
                if self.database.min_connections > self.database.max_connections {
                    return Err(ConfigValidationError::InvalidValue(
                        "min_connections cannot exceed max_connections".to_string(),
                    ));
                }
            }
            StorageBackend::JsonFile => {
                if self.storage.json_path.as_os_str().is_empty() {
                    return Err(ConfigValidationError::MissingRequired(
                        "GL__STORAGE__JSON_PATH must be set for the json_file backend"
                            .to_string(),
                    ));
                }
            }
            StorageBackend::Memory => {}
        }

        if self.email.enabled {
            match self.email.provider.as_str() {
                "console" => {}
                "sendgrid" if self.email.sendgrid_api_key.is_empty() => {
                    return Err(ConfigValidationError::MissingRequired(
                        "GL__EMAIL__SENDGRID_API_KEY must be set for the sendgrid provider"
                            .to_string(),
                    ));
                }
                "sendgrid" => {}
                other => {
                    return Err(ConfigValidationError::InvalidValue(format!(
                        "Unknown email provider: {}",
                        other
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        format!("{}:{}", self.server.host, self.server.port).parse()
    }
}
