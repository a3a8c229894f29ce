//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every filter pattern and parse every method token
//! - Check addresses and the base URL
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DispatchConfig → Result<(), Vec<ValidationError>>
//! - Checks needing the hierarchy (filter destinations) run at router construction

use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;
use url::Url;

use crate::config::schema::DispatchConfig;
use crate::routing::filter::parse_method;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("filter #{index}: invalid pattern {pattern:?}: {message}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        message: String,
    },

    #[error("filter #{index}: destination must not be empty")]
    EmptyDestination { index: usize },

    #[error("filter #{index}: invalid method {method:?}")]
    InvalidMethod { index: usize, method: String },

    #[error("filter #{index}: method list is empty")]
    EmptyMethods { index: usize },

    #[error("invalid introspection method {0:?}")]
    InvalidIntrospectionMethod(String),

    #[error("invalid base URL {0:?}")]
    InvalidBaseUrl(String),

    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &DispatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let routing = &config.routing;
    if let Some(base) = &routing.base_url {
        if Url::parse(base).is_err() {
            errors.push(ValidationError::InvalidBaseUrl(base.clone()));
        }
    }
    if routing.expose_introspection && parse_method(&routing.introspection_method).is_err() {
        errors.push(ValidationError::InvalidIntrospectionMethod(
            routing.introspection_method.clone(),
        ));
    }

    for (index, filter) in routing.filters.iter().enumerate() {
        if let Err(e) = Regex::new(&filter.pattern) {
            errors.push(ValidationError::InvalidPattern {
                index,
                pattern: filter.pattern.clone(),
                message: e.to_string(),
            });
        }
        if filter.destination.trim().is_empty() {
            errors.push(ValidationError::EmptyDestination { index });
        }
        match &filter.methods {
            Some(methods) if methods.is_empty() => {
                errors.push(ValidationError::EmptyMethods { index });
            }
            Some(methods) => {
                for method in methods {
                    if parse_method(method).is_err() {
                        errors.push(ValidationError::InvalidMethod {
                            index,
                            method: method.clone(),
                        });
                    }
                }
            }
            None => {}
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
