//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, the mount prefix, and the name pattern
//! - Enforce the one-capture-group invariant before the first request
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system; an invalid config never
//!   enters service

use std::net::SocketAddr;
use std::str::FromStr;

use axum::http::uri::Authority;
use thiserror::Error;

use crate::config::schema::GateConfig;
use crate::filter::name::NamePattern;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a valid socket address")]
    ListenerAddress(String),

    #[error("upstream.address {0:?} is not a valid host:port authority")]
    UpstreamAddress(String),

    #[error("filter.mount_prefix {0:?} must be empty or start with '/' and not end with '/'")]
    MountPrefix(String),

    #[error("filter.name_pattern: {0}")]
    NamePattern(String),

    #[error("filter.session_cookie must not be empty")]
    SessionCookie,

    #[error("compiler.command must not be empty")]
    CompilerCommand,

    #[error("observability.metrics_address {0:?} is not a valid socket address")]
    MetricsAddress(String),

    #[error("admin.bind_address {0:?} is not a valid socket address")]
    AdminAddress(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    AdminApiKey,
}

/// Check every semantic rule, collecting all violations.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SocketAddr::from_str(&config.listener.bind_address).is_err() {
        errors.push(ValidationError::ListenerAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if Authority::from_str(&config.upstream.address).is_err() {
        errors.push(ValidationError::UpstreamAddress(
            config.upstream.address.clone(),
        ));
    }

    let prefix = &config.filter.mount_prefix;
    if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
        errors.push(ValidationError::MountPrefix(prefix.clone()));
    }

    if let Err(e) = NamePattern::new(&config.filter.name_pattern) {
        errors.push(ValidationError::NamePattern(e.to_string()));
    }

    if config.filter.session_cookie.is_empty() {
        errors.push(ValidationError::SessionCookie);
    }

    if config.compiler.command.is_empty() {
        errors.push(ValidationError::CompilerCommand);
    }

    if config.observability.metrics_enabled
        && SocketAddr::from_str(&config.observability.metrics_address).is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.admin.enabled {
        if SocketAddr::from_str(&config.admin.bind_address).is_err() {
            errors.push(ValidationError::AdminAddress(config.admin.bind_address.clone()));
        }
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::AdminApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
