//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Build the handler registry
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::path::Path;

use thiserror::Error;

use crate::config::validation::validate_config;
use crate::config::{load_config, ConfigError, SockJsConfig};
use crate::error::RegistryError;
use crate::protocol::version::protocol_version;
use crate::routing::HandlerRegistry;

#[derive(Error, Debug)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Everything the server needs before it binds.
#[derive(Debug)]
pub struct Prepared {
    pub config: SockJsConfig,
    pub registry: HandlerRegistry,
}

/// Load the config at `path` (defaults when absent) and build the registry.
pub fn prepare(path: Option<&Path>) -> Result<Prepared, StartupError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => {
            let config = SockJsConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };
    let registry = HandlerRegistry::standard()?;
    Ok(Prepared { config, registry })
}

impl Prepared {
    /// Log what is about to be served. Call once logging is installed.
    pub fn announce(&self) {
        tracing::info!(
            protocol = %protocol_version(),
            prefix = %self.config.prefix,
            websocket = self.config.transports.websocket,
            handlers = self.registry.registrations().len(),
            "Startup prepared"
        );
    }
}
