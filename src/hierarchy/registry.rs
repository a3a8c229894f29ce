//! Hierarchy registry.
//!
//! # Responsibilities
//! - Hold the live set of controller types and their parent/child links
//! - Hold the leaf operations declared on each type
//! - Reject sibling name collisions and malformed trees at build time
//!
//! # Design Decisions
//! - Write-once: built single-threaded at startup, read-only afterwards (no locks on reads)
//! - Types and operations live in flat arenas and are addressed by index ids
//! - A type is attached to its parent when registered and never re-parented, so cycles
//!   cannot be expressed

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::error::ConfigError;
use crate::hierarchy::naming::{self, CanonicalName};
use crate::hierarchy::operation::{LeafOperation, OperationSpec, CALL_OPERATION};

/// Identity of a controller type within one hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ControllerId(pub(crate) usize);

/// Identity of a leaf operation within one hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct OperationId(pub(crate) usize);

/// Registration-time description of a controller type.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    ident: String,
    slug: Option<String>,
    hidden: bool,
    operations: Vec<OperationSpec>,
}

impl TypeSpec {
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            slug: None,
            hidden: false,
            operations: Vec::new(),
        }
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn operation(mut self, operation: OperationSpec) -> Self {
        self.operations.push(operation);
        self
    }
}

/// One `(type, parent, operations[])` record from a discovery source.
///
/// `parent` is the identifier of an earlier record, or `None` for the root.
#[derive(Debug, Clone)]
pub struct TypeRecord {
    pub spec: TypeSpec,
    pub parent: Option<String>,
}

impl TypeRecord {
    pub fn root(spec: TypeSpec) -> Self {
        Self { spec, parent: None }
    }

    pub fn child(spec: TypeSpec, parent: impl Into<String>) -> Self {
        Self {
            spec,
            parent: Some(parent.into()),
        }
    }
}

/// A node in the dispatch hierarchy.
#[derive(Debug)]
pub struct ControllerType {
    id: ControllerId,
    ident: String,
    slug: Option<String>,
    name: String,
    parent: Option<ControllerId>,
    children: Vec<ControllerId>,
    operations: Vec<OperationId>,
    hidden: bool,
}

impl ControllerType {
    pub fn id(&self) -> ControllerId {
        self.id
    }

    pub fn parent(&self) -> Option<ControllerId> {
        self.parent
    }

    /// Direct child types in registration order.
    pub fn children(&self) -> &[ControllerId] {
        &self.children
    }

    /// Operations declared directly on this type, in registration order.
    pub fn operations(&self) -> &[OperationId] {
        &self.operations
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Canonical name without allocating.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CanonicalName for ControllerType {
    fn ident(&self) -> &str {
        &self.ident
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    fn canonical_name(&self) -> String {
        self.name.clone()
    }
}

/// The frozen controller tree.
pub struct Hierarchy {
    types: Vec<ControllerType>,
    operations: Vec<LeafOperation>,
    by_ident: HashMap<String, ControllerId>,
    root: ControllerId,
}

impl Hierarchy {
    pub fn builder() -> HierarchyBuilder {
        HierarchyBuilder::default()
    }

    /// Build a hierarchy from discovery records.
    ///
    /// Records must be ordered so that every parent precedes its children.
    pub fn from_records<I>(records: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = TypeRecord>,
    {
        let mut builder = HierarchyBuilder::default();
        for record in records {
            match record.parent {
                None => {
                    builder.root(record.spec)?;
                }
                Some(parent_ident) => {
                    let parent = builder.by_ident.get(&parent_ident).copied().ok_or_else(|| {
                        ConfigError::UnknownParent {
                            child: record.spec.ident.clone(),
                            parent: parent_ident.clone(),
                        }
                    })?;
                    builder.child(parent, record.spec)?;
                }
            }
        }
        builder.build()
    }

    pub fn root(&self) -> ControllerId {
        self.root
    }

    pub fn controller(&self, id: ControllerId) -> &ControllerType {
        &self.types[id.0]
    }

    pub fn operation(&self, id: OperationId) -> &LeafOperation {
        &self.operations[id.0]
    }

    pub fn controllers(&self) -> impl Iterator<Item = &ControllerType> {
        self.types.iter()
    }

    pub fn operations(&self) -> impl Iterator<Item = &LeafOperation> {
        self.operations.iter()
    }

    /// Look up a type by its declared identifier.
    pub fn find_controller(&self, ident: &str) -> Option<ControllerId> {
        self.by_ident.get(ident).copied()
    }

    /// Look up an operation declared directly on `owner` by its identifier.
    pub fn find_operation(&self, owner: ControllerId, ident: &str) -> Option<OperationId> {
        self.controller(owner)
            .operations
            .iter()
            .copied()
            .find(|&op| self.operation(op).ident() == ident)
    }

    /// `id` itself, then each ancestor up to the root.
    pub fn lineage(&self, id: ControllerId) -> Lineage<'_> {
        Lineage {
            hierarchy: self,
            next: Some(id),
        }
    }

    /// Whether `id` is `ancestor` or lies below it.
    pub fn is_within(&self, id: ControllerId, ancestor: ControllerId) -> bool {
        self.lineage(id).any(|t| t == ancestor)
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hierarchy")
            .field("root", &self.root)
            .field("types", &self.types.len())
            .field("operations", &self.operations.len())
            .finish()
    }
}

/// Iterator over a type and its ancestors.
pub struct Lineage<'a> {
    hierarchy: &'a Hierarchy,
    next: Option<ControllerId>,
}

impl Iterator for Lineage<'_> {
    type Item = ControllerId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.hierarchy.controller(current).parent;
        Some(current)
    }
}

/// Single-threaded registration phase.
#[derive(Default)]
pub struct HierarchyBuilder {
    types: Vec<ControllerType>,
    operations: Vec<LeafOperation>,
    by_ident: HashMap<String, ControllerId>,
    root: Option<ControllerId>,
}

impl HierarchyBuilder {
    /// Register the root type.
    pub fn root(&mut self, spec: TypeSpec) -> Result<ControllerId, ConfigError> {
        if let Some(existing) = self.root {
            return Err(ConfigError::MultipleRoots {
                existing: self.types[existing.0].ident.clone(),
                rejected: spec.ident,
            });
        }
        let id = self.insert(spec, None)?;
        self.root = Some(id);
        Ok(id)
    }

    /// Register a type under an already registered parent.
    pub fn child(&mut self, parent: ControllerId, spec: TypeSpec) -> Result<ControllerId, ConfigError> {
        let id = self.insert(spec, Some(parent))?;
        self.types[parent.0].children.push(id);
        Ok(id)
    }

    fn insert(&mut self, spec: TypeSpec, parent: Option<ControllerId>) -> Result<ControllerId, ConfigError> {
        if self.by_ident.contains_key(&spec.ident) {
            return Err(ConfigError::DuplicateType(spec.ident));
        }

        let id = ControllerId(self.types.len());
        let mut operations = Vec::with_capacity(spec.operations.len());
        for op_spec in spec.operations {
            let op_id = OperationId(self.operations.len());
            self.operations.push(LeafOperation::new(op_id, id, op_spec));
            operations.push(op_id);
        }

        let name = naming::type_name(&spec.ident, spec.slug.as_deref());
        self.by_ident.insert(spec.ident.clone(), id);
        self.types.push(ControllerType {
            id,
            ident: spec.ident,
            slug: spec.slug,
            name,
            parent,
            children: Vec::new(),
            operations,
            hidden: spec.hidden,
        });
        Ok(id)
    }

    /// Freeze the tree, checking every type for colliding segment names.
    pub fn build(self) -> Result<Hierarchy, ConfigError> {
        let root = self.root.ok_or(ConfigError::MissingRoot)?;

        for ty in &self.types {
            let mut seen = HashSet::new();
            let child_names = ty.children.iter().map(|c| self.types[c.0].name.as_str());
            let op_names = ty
                .operations
                .iter()
                .map(|o| &self.operations[o.0])
                .filter(|op| !op.is_call())
                .map(|op| op.name());

            for name in child_names.chain(op_names) {
                if !seen.insert(name.to_lowercase()) {
                    return Err(ConfigError::NameCollision {
                        parent: ty.ident.clone(),
                        name: name.to_string(),
                    });
                }
            }
            if ty.operations.iter().filter(|o| self.operations[o.0].is_call()).count() > 1 {
                return Err(ConfigError::NameCollision {
                    parent: ty.ident.clone(),
                    name: CALL_OPERATION.to_string(),
                });
            }
        }

        tracing::debug!(
            types = self.types.len(),
            operations = self.operations.len(),
            "Hierarchy frozen"
        );

        Ok(Hierarchy {
            types: self.types,
            operations: self.operations,
            by_ident: self.by_ident,
            root,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Hierarchy {
        Hierarchy::from_records([
            TypeRecord::root(TypeSpec::new("Root").operation(OperationSpec::call())),
            TypeRecord::child(TypeSpec::new("Level2Controller"), "Root"),
            TypeRecord::child(
                TypeSpec::new("Level3Controller").operation(OperationSpec::new("func_on_level3")),
                "Level2Controller",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_records_build_tree() {
        let h = sample();
        let root = h.root();
        let level2 = h.find_controller("Level2Controller").unwrap();
        let level3 = h.find_controller("Level3Controller").unwrap();

        assert_eq!(h.controller(root).children(), &[level2]);
        assert_eq!(h.controller(level3).parent(), Some(level2));
        assert_eq!(h.controller(level3).name(), "level3");
        assert!(h.find_operation(level3, "func_on_level3").is_some());
        assert!(h.find_operation(level2, "func_on_level3").is_none());
    }

    #[test]
    fn test_lineage_walks_to_root() {
        let h = sample();
        let level3 = h.find_controller("Level3Controller").unwrap();
        let chain: Vec<_> = h.lineage(level3).map(|t| h.controller(t).name().to_string()).collect();
        assert_eq!(chain, ["level3", "level2", "root"]);
        assert!(h.is_within(level3, h.root()));
    }

    #[test]
    fn test_unknown_parent_rejected() {
        let err = Hierarchy::from_records([
            TypeRecord::root(TypeSpec::new("Root")),
            TypeRecord::child(TypeSpec::new("Orphan"), "Missing"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownParent { .. }));
    }

    #[test]
    fn test_multiple_roots_rejected() {
        let err = Hierarchy::from_records([
            TypeRecord::root(TypeSpec::new("Root")),
            TypeRecord::root(TypeSpec::new("Other")),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::MultipleRoots { .. }));
    }

    #[test]
    fn test_missing_root_rejected() {
        let err = Hierarchy::builder().build().unwrap_err();
        assert!(matches!(err, ConfigError::MissingRoot));
    }

    #[test]
    fn test_sibling_collision_rejected() {
        let mut builder = Hierarchy::builder();
        let root = builder.root(TypeSpec::new("Root")).unwrap();
        builder.child(root, TypeSpec::new("BlogController")).unwrap();
        builder.child(root, TypeSpec::new("Other").slug("Blog")).unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, ConfigError::NameCollision { ref name, .. } if name == "Blog"));
    }

    #[test]
    fn test_type_and_leaf_collision_rejected() {
        let mut builder = Hierarchy::builder();
        let root = builder
            .root(TypeSpec::new("Root").operation(OperationSpec::new("posts")))
            .unwrap();
        builder.child(root, TypeSpec::new("PostsController")).unwrap();
        assert!(builder.build().is_err());
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut builder = Hierarchy::builder();
        let root = builder.root(TypeSpec::new("Root")).unwrap();
        builder.child(root, TypeSpec::new("A")).unwrap();
        let err = builder.child(root, TypeSpec::new("A")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateType(_)));
    }
}
