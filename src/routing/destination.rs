//! Resolved destinations.

use std::fmt;
use std::sync::Arc;

use crate::hierarchy::{ControllerId, Hierarchy, LeafOperation, OperationId};

/// A request bound to a leaf operation.
///
/// One `Destination` exists per operation for the lifetime of a router, so two lookups that
/// land on the same operation return the same `Arc`.
pub struct Destination {
    operation: OperationId,
    hierarchy: Arc<Hierarchy>,
}

impl Destination {
    pub(crate) fn new(hierarchy: Arc<Hierarchy>, operation: OperationId) -> Self {
        Self {
            operation,
            hierarchy,
        }
    }

    pub fn operation_id(&self) -> OperationId {
        self.operation
    }

    pub fn operation(&self) -> &LeafOperation {
        self.hierarchy.operation(self.operation)
    }

    /// The type that declares the operation (not necessarily the one the path walked through).
    pub fn owner(&self) -> ControllerId {
        self.operation().owner()
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("operation", &self.operation)
            .field("name", &self.operation().name())
            .finish()
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.operation == other.operation && Arc::ptr_eq(&self.hierarchy, &other.hierarchy)
    }
}

impl Eq for Destination {}
