//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build hierarchy → Build router (validate filters) → Bind listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server stops accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl+C) → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then router, then listener
//! - Fail fast: an unresolvable filter aborts startup before the port is bound

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::StartupError;
