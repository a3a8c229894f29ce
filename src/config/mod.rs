//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DispatchConfig (validated, immutable)
//!     → Router::from_config (filters checked against the hierarchy)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; the hierarchy it refers to never changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, LoadError};
pub use schema::{DispatchConfig, FilterConfig, ListenerConfig, ObservabilityConfig, RoutingConfig, TimeoutConfig};
pub use validation::ValidationError;
