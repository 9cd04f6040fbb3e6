//! Application configuration, read from a JSON file.
//!
//! ```json
//! {
//!   "AuthenticationSettings": { "CookieName": "session", "HashKey": "…", "BlockKey": "…" },
//!   "StaticRoot": "./static",
//!   "TemplateRoot": "./templates",
//!   "UserStoreFilename": "./users.json",
//!   "LogLevel": "debug"
//! }
//! ```
//!
//! Every field is optional and falls back to its default.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AuthenticationSettings {
    pub cookie_name: String,
    pub login_path: String,
    /// Key authenticating the session cookie, interpreted by the cookie codec.
    pub hash_key: String,
    /// Key encrypting the session cookie, interpreted by the cookie codec.
    pub block_key: String,
}

impl Default for AuthenticationSettings {
    fn default() -> Self {
        Self {
            cookie_name: "session".to_owned(),
            login_path: "/login/".to_owned(),
            hash_key: String::new(),
            block_key: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Config {
    #[serde(rename = "AuthenticationSettings")]
    pub authentication: AuthenticationSettings,
    pub static_root: PathBuf,
    pub static_prefix: String,
    pub template_root: PathBuf,
    pub user_store_filename: PathBuf,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            authentication: AuthenticationSettings::default(),
            static_root: PathBuf::from("static"),
            static_prefix: "/static/".to_owned(),
            template_root: PathBuf::from("templates"),
            user_store_filename: PathBuf::from("users.json"),
            log_level: "info".to_owned(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {source}")]
    Parse {
        #[from]
        source: serde_json::Error,
    },

    #[error("invalid log level: {level}")]
    InvalidLogLevel { level: String },

    #[error("failed to install tracing subscriber: {reason}")]
    Tracing { reason: String },
}

impl ConfigError {
    pub fn invalid_log_level<S: ToString>(level: S) -> Self {
        Self::InvalidLogLevel { level: level.to_string() }
    }

    pub fn tracing<S: ToString>(reason: S) -> Self {
        Self::Tracing { reason: reason.to_string() }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json =
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// The configured log level.
    pub fn level(&self) -> Result<Level, ConfigError> {
        Level::from_str(self.log_level.trim()).map_err(|_parse| ConfigError::invalid_log_level(&self.log_level))
    }
}

/// Installs a global `fmt` subscriber printing events up to `level`.
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(level: Level) -> Result<(), ConfigError> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).map_err(ConfigError::tracing)
}

#[cfg(test)]
mod tests {
    use super::{AuthenticationSettings, Config, ConfigError};
    use std::path::PathBuf;
    use tracing::Level;

    #[test]
    fn empty_json_is_default() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.authentication.login_path, "/login/");
    }

    #[test]
    fn parses_pascal_case_fields() {
        let config = Config::from_json(
            r#"{
                "AuthenticationSettings": { "CookieName": "sid", "HashKey": "hash", "BlockKey": "block" },
                "StaticRoot": "/srv/static",
                "UserStoreFilename": "/srv/users.json",
                "TemplateRoot": "/srv/templates",
                "LogLevel": "DEBUG"
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.authentication,
            AuthenticationSettings {
                cookie_name: "sid".to_owned(),
                login_path: "/login/".to_owned(),
                hash_key: "hash".to_owned(),
                block_key: "block".to_owned(),
            }
        );
        assert_eq!(config.static_root, PathBuf::from("/srv/static"));
        assert_eq!(config.static_prefix, "/static/");
        assert_eq!(config.level().unwrap(), Level::DEBUG);
    }

    #[test]
    fn bad_inputs_are_errors() {
        assert!(matches!(Config::from_json("{"), Err(ConfigError::Parse { .. })));
        assert!(matches!(Config::from_file("/definitely/not/here.json"), Err(ConfigError::Io { .. })));

        let config = Config { log_level: "loud".to_owned(), ..Config::default() };
        assert!(matches!(config.level(), Err(ConfigError::InvalidLogLevel { .. })));
    }
}
