//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, url, args, params)
//!     → router.rs (entry point)
//!     → filter.rs (explicit patterns, first match wins)
//!         match    → destination path → cache.rs
//!         no match → path.rs (normalize + tokenize) → cache.rs
//!     → cache.rs miss → resolver.rs (walk the hierarchy)
//!     → Return: Destination + merged args/params, or NotFound
//!
//! Inverse (operation → path / uri / template):
//!     cache.rs → walk owner type up to the router root → reverse names
//! ```
//!
//! # Design Decisions
//! - Hierarchy frozen before the router exists; every lookup is cacheable forever
//! - Negative results cached like positive ones
//! - Deterministic: same input always resolves to the same `Arc<Destination>`
//! - Filters are validated against the hierarchy at registration, never at request time

pub mod cache;
pub mod destination;
pub mod filter;
pub mod path;
pub mod resolver;
pub mod router;

pub use cache::{DestinationCache, Resolution};
pub use destination::Destination;
pub use filter::{Filter, FilterChain, FilterSpec};
pub use resolver::TreeResolver;
pub use router::{Node, Route, RouteSource, Router, RouterOptions};
