//! Tree resolver.
//!
//! # Responsibilities
//! - Walk the hierarchy from the router root, one segment at a time
//! - Prefer child types over leaf operations at every step
//! - Apply visibility: hidden nodes never match, inherited leaves need `delegate`
//!
//! # Design Decisions
//! - Pure function of (hierarchy, segments); safe to call from any thread
//! - Leaf lookup follows inheritance nearest-first, so a redeclared leaf shadows its ancestor's
//! - A hidden leaf is skipped, letting an ancestor's declaration of the same name answer instead
//! - Segments left over after a leaf match fail the whole walk

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::NotFoundReason;
use crate::hierarchy::naming::segment_eq;
use crate::hierarchy::{ControllerId, Hierarchy, LeafOperation, OperationId};
use crate::observability::metrics;

/// Outcome of looking up a leaf by name while standing at a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafLookup {
    Visible(OperationId),
    /// Found on an ancestor that does not delegate it.
    Blocked,
    Missing,
}

/// Segment-by-segment resolver over a frozen hierarchy.
#[derive(Debug)]
pub struct TreeResolver {
    hierarchy: Arc<Hierarchy>,
    root: ControllerId,
    walks: AtomicU64,
}

impl TreeResolver {
    pub fn new(hierarchy: Arc<Hierarchy>, root: ControllerId) -> Self {
        Self {
            hierarchy,
            root,
            walks: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> ControllerId {
        self.root
    }

    /// Number of walks performed so far.
    pub fn walks(&self) -> u64 {
        self.walks.load(Ordering::Relaxed)
    }

    /// Resolve tokenized segments to a leaf operation.
    pub fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Result<OperationId, NotFoundReason> {
        self.walks.fetch_add(1, Ordering::Relaxed);
        metrics::record_tree_walk();

        let mut current = self.root;
        for (index, segment) in segments.iter().enumerate() {
            let segment = segment.as_ref();

            if let Some(child) = self.child_named(current, segment) {
                current = child;
                continue;
            }

            let remaining = segments.len() - index - 1;
            return match self.leaf_named(current, segment) {
                LeafLookup::Visible(op) if remaining == 0 => Ok(op),
                LeafLookup::Visible(_) => Err(NotFoundReason::NoSuchSegment),
                LeafLookup::Blocked => Err(NotFoundReason::NotCallable),
                LeafLookup::Missing => Err(NotFoundReason::NoSuchSegment),
            };
        }

        self.default_operation(current)
    }

    fn child_named(&self, at: ControllerId, segment: &str) -> Option<ControllerId> {
        self.hierarchy
            .controller(at)
            .children()
            .iter()
            .copied()
            .find(|&child| {
                let ty = self.hierarchy.controller(child);
                !ty.is_hidden() && segment_eq(ty.name(), segment)
            })
    }

    fn leaf_named(&self, at: ControllerId, segment: &str) -> LeafLookup {
        self.find_inherited(at, |op| !op.is_call() && segment_eq(op.name(), segment))
    }

    /// The default operation of `at`, inherited only when delegated.
    fn default_operation(&self, at: ControllerId) -> Result<OperationId, NotFoundReason> {
        match self.find_inherited(at, LeafOperation::is_call) {
            LeafLookup::Visible(op) => Ok(op),
            LeafLookup::Blocked | LeafLookup::Missing => Err(NotFoundReason::NoDefault),
        }
    }

    fn find_inherited<F>(&self, at: ControllerId, matches: F) -> LeafLookup
    where
        F: Fn(&LeafOperation) -> bool,
    {
        for owner in self.hierarchy.lineage(at) {
            let declared = self
                .hierarchy
                .controller(owner)
                .operations()
                .iter()
                .map(|&id| self.hierarchy.operation(id))
                .find(|op| !op.is_hidden() && matches(op));

            if let Some(op) = declared {
                return if owner == at || op.is_delegate() {
                    LeafLookup::Visible(op.id())
                } else {
                    LeafLookup::Blocked
                };
            }
        }
        LeafLookup::Missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{OperationSpec, TypeSpec};

    struct Fixture {
        hierarchy: Arc<Hierarchy>,
        resolver: TreeResolver,
    }

    impl Fixture {
        fn op(&self, owner: &str, ident: &str) -> OperationId {
            let ty = self.hierarchy.find_controller(owner).unwrap();
            self.hierarchy.find_operation(ty, ident).unwrap()
        }
    }

    fn fixture() -> Fixture {
        let mut b = Hierarchy::builder();
        let root = b
            .root(
                TypeSpec::new("Root")
                    .operation(OperationSpec::call())
                    .operation(OperationSpec::new("about"))
                    .operation(OperationSpec::new("help").delegate())
                    .operation(OperationSpec::new("secret").hidden()),
            )
            .unwrap();
        let level2 = b
            .child(
                root,
                TypeSpec::new("Level2Controller")
                    .operation(OperationSpec::new("show_user"))
                    .operation(OperationSpec::new("help").hidden()),
            )
            .unwrap();
        b.child(
            level2,
            TypeSpec::new("Level3Controller").operation(OperationSpec::new("func_on_level3")),
        )
        .unwrap();
        b.child(root, TypeSpec::new("Hidden").hidden().operation(OperationSpec::call()))
            .unwrap();
        let hierarchy = Arc::new(b.build().unwrap());
        let resolver = TreeResolver::new(hierarchy.clone(), hierarchy.root());
        Fixture { hierarchy, resolver }
    }

    #[test]
    fn test_empty_path_uses_root_call() {
        let f = fixture();
        assert_eq!(f.resolver.resolve::<&str>(&[]), Ok(f.op("Root", "__call__")));
    }

    #[test]
    fn test_nested_leaf() {
        let f = fixture();
        assert_eq!(
            f.resolver.resolve(&["level2", "level3", "func_on_level3"]),
            Ok(f.op("Level3Controller", "func_on_level3"))
        );
        assert_eq!(
            f.resolver.resolve(&["LEVEL2", "Show_User"]),
            Ok(f.op("Level2Controller", "show_user"))
        );
    }

    #[test]
    fn test_call_is_not_segment_matchable() {
        let f = fixture();
        assert_eq!(
            f.resolver.resolve(&["level2", "level3", "__call__"]),
            Err(NotFoundReason::NoSuchSegment)
        );
    }

    #[test]
    fn test_type_without_default() {
        let f = fixture();
        // Root's call is not delegated, so level2 has no default of its own.
        assert_eq!(f.resolver.resolve(&["level2"]), Err(NotFoundReason::NoDefault));
    }

    #[test]
    fn test_inherited_leaf_requires_delegate() {
        let f = fixture();
        assert_eq!(
            f.resolver.resolve(&["level2", "level3", "about"]),
            Err(NotFoundReason::NotCallable)
        );
        assert_eq!(f.resolver.resolve(&["about"]), Ok(f.op("Root", "about")));
    }

    #[test]
    fn test_hidden_leaf_falls_back_to_ancestor() {
        let f = fixture();
        // Level2 hides its own `help`; Root's delegated one answers instead.
        assert_eq!(f.resolver.resolve(&["level2", "help"]), Ok(f.op("Root", "help")));
        assert_eq!(f.resolver.resolve(&["secret"]), Err(NotFoundReason::NoSuchSegment));
    }

    #[test]
    fn test_hidden_type_never_matches() {
        let f = fixture();
        assert_eq!(f.resolver.resolve(&["hidden"]), Err(NotFoundReason::NoSuchSegment));
    }

    #[test]
    fn test_segments_after_leaf_fail() {
        let f = fixture();
        assert_eq!(
            f.resolver.resolve(&["level2", "show_user", "extra"]),
            Err(NotFoundReason::NoSuchSegment)
        );
    }

    #[test]
    fn test_walks_counted() {
        let f = fixture();
        f.resolver.resolve(&["about"]).unwrap();
        let _ = f.resolver.resolve(&["nope"]);
        assert_eq!(f.resolver.walks(), 2);
    }
}
