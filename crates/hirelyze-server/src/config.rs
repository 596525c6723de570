//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Session cookie settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Identity provider tunables.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Voice platform settings.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Per-client request limits.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Discovery feed settings.
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static assets (logo, avatars, covers) served at `/`.
    #[serde(default = "default_public_dir")]
    pub public_dir: String,

    /// Production mode marks the session cookie `Secure`.
    #[serde(default)]
    pub production: bool,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_pool_max_size")]
    pub pool_max_size: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "hirelyze_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

/// Session cookie configuration.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign ID tokens and session cookies. When unset a random
    /// secret is generated at startup and sessions do not survive restarts.
    #[serde(default)]
    pub secret: Option<String>,

    /// Session cookie lifetime in seconds. Default: one week.
    #[serde(default = "default_session_max_age_secs")]
    pub max_age_secs: u64,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}

/// Identity provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_id_token_ttl_secs")]
    pub id_token_ttl_secs: u64,

    /// Failed password attempts per email before sign-in is throttled.
    #[serde(default = "default_max_failed_sign_ins")]
    pub max_failed_sign_ins: u32,

    #[serde(default = "default_failed_sign_in_window_secs")]
    pub failed_sign_in_window_secs: u64,
}

/// Voice platform configuration.
#[derive(Clone, Default, Deserialize)]
pub struct VoiceConfig {
    /// Workflow that generates interviews.
    #[serde(default)]
    pub workflow_id: String,

    /// Public web token handed to the browser SDK.
    #[serde(default)]
    pub web_token: String,
}

impl fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("workflow_id", &self.workflow_id)
            .field("web_token", &"[REDACTED]")
            .finish()
    }
}

/// Requests per minute per client IP.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitConfig {
    /// Limit for sign-up, sign-in and identity endpoints.
    #[serde(default = "default_auth_limit")]
    pub auth_limit: u32,

    /// Limit for everything else.
    #[serde(default = "default_limit")]
    pub default_limit: u32,
}

/// Discovery feed configuration.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct FeedConfig {
    /// Number of interviews shown under "Take an Interview".
    #[serde(default = "default_latest_limit")]
    pub latest_limit: u32,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> String {
    "public".to_string()
}

fn default_db_path() -> String {
    "hirelyze.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

fn default_pool_max_size() -> u32 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_session_max_age_secs() -> u64 {
    60 * 60 * 24 * 7
}

fn default_id_token_ttl_secs() -> u64 {
    3600
}

fn default_max_failed_sign_ins() -> u32 {
    5
}

fn default_failed_sign_in_window_secs() -> u64 {
    60
}

fn default_auth_limit() -> u32 {
    20
}

fn default_limit() -> u32 {
    300
}

fn default_latest_limit() -> u32 {
    hirelyze_records::DEFAULT_LATEST_LIMIT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            production: false,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            pool_max_size: default_pool_max_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: None,
            max_age_secs: default_session_max_age_secs(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            id_token_ttl_secs: default_id_token_ttl_secs(),
            max_failed_sign_ins: default_max_failed_sign_ins(),
            failed_sign_in_window_secs: default_failed_sign_in_window_secs(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            auth_limit: default_auth_limit(),
            default_limit: default_limit(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latest_limit: default_latest_limit(),
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies environment overrides (see [`apply_env_overrides`]).
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

/// Applies `HIRELYZE_*` overrides read through `lookup`:
///
/// - `HIRELYZE_HOST`, `HIRELYZE_PORT`, `HIRELYZE_PUBLIC_DIR`, `HIRELYZE_PRODUCTION`
/// - `HIRELYZE_DB_PATH`
/// - `HIRELYZE_LOG_LEVEL`, `HIRELYZE_LOG_JSON`
/// - `HIRELYZE_SESSION_SECRET`
/// - `HIRELYZE_VOICE_WORKFLOW_ID`, `HIRELYZE_VOICE_WEB_TOKEN`
///
/// Unparseable values are ignored.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let flag = |value: String| value == "true" || value == "1";

    if let Some(host) = lookup("HIRELYZE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("HIRELYZE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(dir) = lookup("HIRELYZE_PUBLIC_DIR") {
        config.server.public_dir = dir;
    }
    if let Some(production) = lookup("HIRELYZE_PRODUCTION") {
        config.server.production = flag(production);
    }
    if let Some(db_path) = lookup("HIRELYZE_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = lookup("HIRELYZE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("HIRELYZE_LOG_JSON") {
        config.logging.json = flag(json);
    }
    if let Some(secret) = lookup("HIRELYZE_SESSION_SECRET").filter(|s| !s.is_empty()) {
        config.session.secret = Some(secret);
    }
    if let Some(workflow_id) = lookup("HIRELYZE_VOICE_WORKFLOW_ID") {
        config.voice.workflow_id = workflow_id;
    }
    if let Some(token) = lookup("HIRELYZE_VOICE_WEB_TOKEN") {
        config.voice.web_token = token;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let mut config = toml::from_str::<Config>("").unwrap();
        apply_env_overrides(&mut config, |_| None);

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session.max_age_secs, 604_800);
        assert_eq!(config.feed.latest_limit, 10);
        assert!(config.session.secret.is_none());

        let loaded = load_config(path.to_str()).expect("missing file falls back to defaults");
        assert_eq!(loaded.database.pool_max_size, 8);
    }

    #[test]
    fn parses_file_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080
production = true

[session]
secret = "s3cret"

[voice]
workflow_id = "wf-1"

[rate_limit]
auth_limit = 3
"#,
        )
        .unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let config: Config = toml::from_str(&contents).unwrap();
        assert_eq!(config.server.port, 8080);
        assert!(config.server.production);
        assert_eq!(config.session.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.voice.workflow_id, "wf-1");
        assert_eq!(config.rate_limit.auth_limit, 3);
        assert_eq!(config.rate_limit.default_limit, 300);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(path.to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("HIRELYZE_PORT", "9000"),
            ("HIRELYZE_HOST", "not-an-ip"),
            ("HIRELYZE_LOG_JSON", "1"),
            ("HIRELYZE_SESSION_SECRET", "from-env"),
            ("HIRELYZE_PRODUCTION", "true"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, default_host());
        assert!(config.logging.json);
        assert!(config.server.production);
        assert_eq!(config.session.secret.as_deref(), Some("from-env"));
    }

    #[test]
    fn debug_redacts_secrets() {
        let mut config = Config::default();
        config.session.secret = Some("hunter2".to_string());
        config.voice.web_token = "pk_live".to_string();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("pk_live"));
    }
}
