//! Error taxonomy for the dispatch engine.
//!
//! # Design Decisions
//! - Resolution failures are data (`NotFound`), returned rather than raised
//! - Configuration failures are raised eagerly at construction and abort startup
//! - Invocation failures are reported by the invocation layer, never by the resolver

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which lookup produced a not-found result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundKind {
    /// A controller type has no place in the dispatch tree.
    ControllerNotFound,
    /// No callable leaf operation matches the path.
    MethodNotFound,
    /// No template path can be derived for the operation.
    TemplateNotFound,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundKind::ControllerNotFound => "controller not found",
            NotFoundKind::MethodNotFound => "method not found",
            NotFoundKind::TemplateNotFound => "template not found",
        };
        f.write_str(s)
    }
}

/// Why a lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    /// A path segment matched neither a child type nor a leaf.
    NoSuchSegment,
    /// A leaf with that name exists but is not callable from here.
    NotCallable,
    /// The type reached at the end of the path has no visible default operation.
    NoDefault,
    /// The node is hidden or lies outside the router's root.
    Unreachable,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundReason::NoSuchSegment => "no such segment",
            NotFoundReason::NotCallable => "not callable",
            NotFoundReason::NoDefault => "no default operation",
            NotFoundReason::Unreachable => "not reachable from root",
        };
        f.write_str(s)
    }
}

/// A typed not-found result carrying the originally requested path.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind}: {path} ({reason})")]
pub struct NotFound {
    pub kind: NotFoundKind,
    pub reason: NotFoundReason,
    pub path: String,
}

impl NotFound {
    pub fn method(path: impl Into<String>, reason: NotFoundReason) -> Self {
        Self {
            kind: NotFoundKind::MethodNotFound,
            reason,
            path: path.into(),
        }
    }

    pub fn controller(path: impl Into<String>) -> Self {
        Self {
            kind: NotFoundKind::ControllerNotFound,
            reason: NotFoundReason::Unreachable,
            path: path.into(),
        }
    }

    pub fn template(path: impl Into<String>) -> Self {
        Self {
            kind: NotFoundKind::TemplateNotFound,
            reason: NotFoundReason::Unreachable,
            path: path.into(),
        }
    }
}

/// Errors detected while building the hierarchy or the router.
///
/// Any of these aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid filter pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("filter {pattern:?} points at {destination:?}, which does not resolve ({reason})")]
    UnresolvedDestination {
        pattern: String,
        destination: String,
        reason: NotFoundReason,
    },

    #[error("invalid HTTP method {0:?}")]
    InvalidMethod(String),

    #[error("name collision under {parent:?}: {name:?} is declared more than once")]
    NameCollision { parent: String, name: String },

    #[error("type {0:?} is registered more than once")]
    DuplicateType(String),

    #[error("hierarchy already has root {existing:?}, cannot add root {rejected:?}")]
    MultipleRoots { existing: String, rejected: String },

    #[error("hierarchy has no root type")]
    MissingRoot,

    #[error("type {child:?} names unknown parent {parent:?}")]
    UnknownParent { child: String, parent: String },

    #[error("router root {0:?} is not part of the hierarchy")]
    UnknownRoot(String),

    #[error("invalid base URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors raised by the invocation layer after a destination was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// Arguments do not fit the operation's signature.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The handler itself failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

/// Top-level error type for callers that want a single error channel.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
