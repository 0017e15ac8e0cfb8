//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delays > 0, bounds > 0, address parses)
//! - Validate the mount prefix shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SockJsConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SockJsConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("prefix {0:?} must start with '/' and must not end with '/'")]
    InvalidPrefix(String),

    #[error("bind address {0:?} is not a socket address")]
    InvalidBindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &SockJsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let prefix = config.prefix.as_str();
    if !prefix.starts_with('/') || (prefix.len() > 1 && prefix.ends_with('/')) {
        errors.push(ValidationError::InvalidPrefix(config.prefix.clone()));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.listener.max_connections == 0 {
        errors.push(ValidationError::Zero("listener.max_connections"));
    }
    if config.transports.heartbeat_delay_ms == 0 {
        errors.push(ValidationError::Zero("transports.heartbeat_delay_ms"));
    }
    if config.transports.disconnect_delay_ms == 0 {
        errors.push(ValidationError::Zero("transports.disconnect_delay_ms"));
    }
    if config.transports.max_pending_messages == 0 {
        errors.push(ValidationError::Zero("transports.max_pending_messages"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&SockJsConfig::default()), Ok(()));
    }

    #[test]
    fn root_prefix_is_valid() {
        let mut config = SockJsConfig::default();
        config.prefix = "/".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn reports_every_problem() {
        let mut config = SockJsConfig::default();
        config.prefix = "echo/".into();
        config.listener.bind_address = "nowhere".into();
        config.transports.heartbeat_delay_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidPrefix("echo/".into()),
                ValidationError::InvalidBindAddress("nowhere".into()),
                ValidationError::Zero("transports.heartbeat_delay_ms"),
            ]
        );
    }
}
