//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dispatch service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::hierarchy::Params;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DispatchConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Router construction: root, base URL, filters.
    pub routing: RoutingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Router configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Identifier of the type the tree walk starts from (default: hierarchy root).
    pub root: Option<String>,

    /// Absolute URL prefixed to canonical paths by `uri_for`.
    pub base_url: Option<String>,

    /// Let the introspection method through filter method whitelists.
    pub expose_introspection: bool,

    /// The introspection method.
    pub introspection_method: String,

    /// Filters, evaluated in the order listed.
    pub filters: Vec<FilterConfig>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            root: None,
            base_url: None,
            expose_introspection: false,
            introspection_method: "OPTIONS".to_string(),
            filters: Vec::new(),
        }
    }
}

/// One explicit pattern → destination rule.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Regular expression; named groups become params, unnamed groups positional args.
    pub pattern: String,

    /// Canonical path of the target operation (e.g. "/level2/show_user").
    pub destination: String,

    /// Methods the filter applies to; all methods when absent.
    #[serde(default)]
    pub methods: Option<Vec<String>>,

    /// Static params merged before captures.
    #[serde(default)]
    pub params: Params,

    /// Match against the full URL instead of the path.
    #[serde(default)]
    pub match_full_url: bool,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
