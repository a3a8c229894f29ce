//! Controller hierarchy subsystem.
//!
//! # Data Flow
//! ```text
//! Discovery records (type, parent, operations[])
//!     → registry.rs (HierarchyBuilder: register, check collisions)
//!     → naming.rs (canonical segment names, computed once per node)
//!     → Hierarchy (frozen, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Registration is explicit; nothing is discovered by reflection at runtime
//! - The tree is immutable after `build()`, so every derived value is cacheable

pub mod naming;
pub mod operation;
pub mod registry;

pub use naming::CanonicalName;
pub use operation::{Call, Handler, LeafOperation, OperationSpec, Params, Parameter, Signature, CALL_OPERATION};
pub use registry::{ControllerId, ControllerType, Hierarchy, HierarchyBuilder, OperationId, TypeRecord, TypeSpec};
