//! Server configuration for dispatcher-server
//!
//! Loads the dispatcher's runtime settings from a TOML file
//! (`dispatcher-server.toml`) with `DISPATCH_*` environment variable
//! overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(std::io::Error),
    #[error("failed to parse TOML: {0}")]
    ParseError(toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Which backend the dispatcher reads its pool/render-node/licence
/// definitions from. `Db` means the dispatch tree's own SQLite persistence
/// is authoritative; `File`/`Ws` are alternate sources for farms that manage
/// pool membership outside the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PoolsBackendType {
    Db,
    File,
    Ws,
}

impl Default for PoolsBackendType {
    fn default() -> Self {
        PoolsBackendType::Db
    }
}

fn default_port() -> u16 {
    8004
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}

fn default_db_url() -> String {
    "sqlite://dispatcher.db".to_string()
}

fn default_render_node_timeout() -> u64 {
    60
}

/// Complete dispatcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub run_as: Option<String>,
    #[serde(default = "default_logdir")]
    pub logdir: PathBuf,
    #[serde(default = "default_confdir")]
    pub confdir: PathBuf,
    #[serde(default)]
    pub pidfile: Option<PathBuf>,
    #[serde(default)]
    pub pools_backend_type: PoolsBackendType,
    #[serde(default = "default_db_url")]
    pub db_url: String,
    #[serde(default)]
    pub db_clean_data: bool,
    #[serde(default)]
    pub file_backend_rn_path: Option<PathBuf>,
    #[serde(default)]
    pub file_backend_licences_path: Option<PathBuf>,
    #[serde(default)]
    pub file_backend_pool_path: Option<PathBuf>,
    #[serde(default)]
    pub limit_open_files: Option<u64>,
    /// Seconds of heartbeat silence before a render node is treated as lost.
    /// Kept configurable rather than a hard-wired constant; see DESIGN.md.
    #[serde(default = "default_render_node_timeout")]
    pub render_node_timeout_secs: u64,
}

fn default_logdir() -> PathBuf {
    PathBuf::from("/var/log/dispatcher")
}

fn default_confdir() -> PathBuf {
    PathBuf::from("/etc/dispatcher")
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            address: default_address(),
            run_as: None,
            logdir: default_logdir(),
            confdir: default_confdir(),
            pidfile: None,
            pools_backend_type: PoolsBackendType::default(),
            db_url: default_db_url(),
            db_clean_data: false,
            file_backend_rn_path: None,
            file_backend_licences_path: None,
            file_backend_pool_path: None,
            limit_open_files: None,
            render_node_timeout_secs: default_render_node_timeout(),
        }
    }
}

impl DispatcherConfig {
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ServerConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ServerConfigError::ReadError)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self, ServerConfigError> {
        toml::from_str(content).map_err(ServerConfigError::ParseError)
    }

    /// Loads from `CONFIG_PATH`, `./config/dispatcher-server.toml`, or
    /// `./dispatcher-server.toml` if present, falling back to defaults
    /// overridden by environment variables. The `DISPATCH_`-prefixed
    /// variables always win over whatever the file says.
    pub fn load() -> Result<Self, ServerConfigError> {
        let mut config = if let Ok(path) = std::env::var("CONFIG_PATH") {
            Self::from_file(path)?
        } else {
            let candidates = [
                PathBuf::from("config/dispatcher-server.toml"),
                PathBuf::from("./dispatcher-server.toml"),
            ];
            match candidates.iter().find(|p| p.exists()) {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DISPATCH_PORT") {
            if let Ok(port) = v.parse() {
                self.port = port;
            }
        }
        if let Ok(v) = std::env::var("DISPATCH_ADDRESS") {
            self.address = v;
        }
        if let Ok(v) = std::env::var("DISPATCH_DB_URL") {
            self.db_url = v;
        }
        if let Ok(v) = std::env::var("DISPATCH_DB_CLEAN_DATA") {
            self.db_clean_data = v == "true" || v == "1";
        }
        if let Ok(v) = std::env::var("DISPATCH_RN_TIMEOUT") {
            if let Ok(secs) = v.parse() {
                self.render_node_timeout_secs = secs;
            }
        }
    }

    pub fn render_node_timeout(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.render_node_timeout_secs as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_toml_document_with_defaults() {
        let config = DispatcherConfig::from_str("port = 9000\n").unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.pools_backend_type, PoolsBackendType::Db);
        assert_eq!(config.render_node_timeout_secs, 60);
    }

    #[test]
    fn env_override_wins_over_file_value() {
        let mut config = DispatcherConfig::from_str("port = 9000\n").unwrap();
        std::env::set_var("DISPATCH_PORT", "8123");
        config.apply_env_overrides();
        std::env::remove_var("DISPATCH_PORT");
        assert_eq!(config.port, 8123);
    }

    #[test]
    fn file_backend_pool_type_round_trips() {
        let toml = "pools_backend_type = \"file\"\nfile_backend_pool_path = \"/etc/dispatcher/pools.xml\"\n";
        let config = DispatcherConfig::from_str(toml).unwrap();
        assert_eq!(config.pools_backend_type, PoolsBackendType::File);
        assert_eq!(config.file_backend_pool_path.unwrap().to_str().unwrap(), "/etc/dispatcher/pools.xml");
    }
}
