//! URL-to-operation dispatch library.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod http;
pub mod invoke;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::DispatchConfig;
pub use error::{ConfigError, DispatchError, DispatchResult, InvocationError, NotFound, NotFoundKind, NotFoundReason};
pub use hierarchy::{Hierarchy, OperationSpec, Signature, TypeSpec};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Route, RouteSource, Router};
