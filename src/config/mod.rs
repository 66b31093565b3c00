//! Configuration module
//!
//! Provides the dispatcher's server configuration and the YAML loader used
//! for file-backend pool/licence definitions: `$include` composition and
//! `${ENV:default}` expansion.

pub mod loader;
pub mod server;

pub use loader::{deep_merge, load_yaml_config, load_yaml_file};
pub use server::{DispatcherConfig, PoolsBackendType, ServerConfigError};
