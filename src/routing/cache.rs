//! Destination cache.
//!
//! # Responsibilities
//! - Memoize normalized raw path → destination or not-found
//! - Memoize operation → canonical path, canonical URI and template path
//! - Intern one `Destination` per operation
//!
//! # Design Decisions
//! - Entries are never invalidated: the hierarchy is frozen before the cache exists
//! - No lock around computation. Racing misses compute identical values and the first
//!   insert wins (`entry().or_insert`), so readers never observe divergent results
//! - Negative results are cached like positive ones. Only the reason is stored; each hit
//!   reports the raw path it was asked for
//! - Unbounded: memory grows with the number of distinct request paths, 404s included

use std::sync::Arc;

use dashmap::DashMap;
use url::Url;

use crate::error::{NotFound, NotFoundReason};
use crate::hierarchy::{ControllerId, Hierarchy, OperationId};
use crate::observability::metrics;
use crate::routing::destination::Destination;
use crate::routing::path;

/// Template name used for the default operation of a type.
pub const INDEX_TEMPLATE: &str = "index";

/// Cached outcome of a path lookup.
pub type Resolution = Result<Arc<Destination>, NotFound>;

/// Read-through caches for both directions of the mapping.
///
/// Entries are never evicted. The path cache holds one entry per distinct normalized
/// request path, found or not.
#[derive(Debug)]
pub struct DestinationCache {
    hierarchy: Arc<Hierarchy>,
    root: ControllerId,
    base_url: Option<Url>,
    by_path: DashMap<String, Result<Arc<Destination>, NotFoundReason>>,
    destinations: DashMap<OperationId, Arc<Destination>>,
    paths: DashMap<OperationId, Option<String>>,
    uris: DashMap<OperationId, Option<String>>,
    templates: DashMap<OperationId, Option<String>>,
    type_paths: DashMap<ControllerId, Option<String>>,
}

impl DestinationCache {
    pub fn new(hierarchy: Arc<Hierarchy>, root: ControllerId, base_url: Option<Url>) -> Self {
        Self {
            hierarchy,
            root,
            base_url,
            by_path: DashMap::new(),
            destinations: DashMap::new(),
            paths: DashMap::new(),
            uris: DashMap::new(),
            templates: DashMap::new(),
            type_paths: DashMap::new(),
        }
    }

    /// Look up `key`, running `resolve` on a miss and storing whatever it returns.
    ///
    /// `raw_path` is only used to label a not-found result.
    pub fn resolve_cached<F>(&self, key: &str, raw_path: &str, resolve: F) -> Resolution
    where
        F: FnOnce() -> Result<OperationId, NotFoundReason>,
    {
        if let Some(hit) = self.by_path.get(key) {
            metrics::record_cache_lookup("path", true);
            return label(hit.value().clone(), raw_path);
        }
        metrics::record_cache_lookup("path", false);

        let resolution = resolve().map(|op| self.destination(op));
        tracing::debug!(key = %key, found = resolution.is_ok(), "Path resolution cached");

        let stored = self
            .by_path
            .entry(key.to_string())
            .or_insert(resolution)
            .value()
            .clone();
        label(stored, raw_path)
    }

    /// The interned destination for an operation.
    pub fn destination(&self, op: OperationId) -> Arc<Destination> {
        if let Some(existing) = self.destinations.get(&op) {
            return existing.value().clone();
        }
        self.destinations
            .entry(op)
            .or_insert_with(|| Arc::new(Destination::new(self.hierarchy.clone(), op)))
            .value()
            .clone()
    }

    /// Canonical path of an operation, `None` when it is hidden or outside the root.
    pub fn path_for(&self, op: OperationId) -> Option<String> {
        memoized(&self.paths, op, "operation_path", || {
            let segments = self.operation_segments(op)?;
            let mut path = String::from("/");
            path.push_str(&segments.join("/"));
            if self.hierarchy.operation(op).is_call() && !segments.is_empty() {
                path.push('/');
            }
            Some(path)
        })
    }

    /// Canonical URI of an operation: the base URL followed by its canonical path.
    pub fn uri_for(&self, op: OperationId) -> Option<String> {
        memoized(&self.uris, op, "operation_uri", || {
            let path = self.path_for(op)?;
            Some(self.join_base(&path))
        })
    }

    /// Template path of an operation.
    pub fn template_for(&self, op: OperationId) -> Option<String> {
        memoized(&self.templates, op, "template_path", || {
            let mut segments = self.operation_segments(op)?;
            let operation = self.hierarchy.operation(op);
            if let Some(template) = operation.template_override() {
                return Some(template.to_string());
            }
            if operation.is_call() {
                segments.push(INDEX_TEMPLATE.to_string());
            }
            Some(segments.join("/"))
        })
    }

    /// Canonical path of a type (with a trailing `/`).
    pub fn type_path_for(&self, ty: ControllerId) -> Option<String> {
        memoized(&self.type_paths, ty, "type_path", || {
            let segments = self.type_segments(ty)?;
            if segments.is_empty() {
                return Some("/".to_string());
            }
            Some(format!("/{}/", segments.join("/")))
        })
    }

    /// Canonical URI of a type.
    pub fn type_uri_for(&self, ty: ControllerId) -> Option<String> {
        self.type_path_for(ty).map(|path| self.join_base(&path))
    }

    /// Number of cached path lookups (positive and negative).
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    fn join_base(&self, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base.as_str().trim_end_matches('/'), path),
            None => path.to_string(),
        }
    }

    /// Encoded segments from the root down to the operation. The default operation adds none.
    fn operation_segments(&self, op: OperationId) -> Option<Vec<String>> {
        let operation = self.hierarchy.operation(op);
        if operation.is_hidden() {
            return None;
        }
        let mut segments = self.type_segments(operation.owner())?;
        if !operation.is_call() {
            segments.push(path::encode_final_segment(operation.name()));
        }
        Some(segments)
    }

    /// Walk up from `ty` collecting names until the root; `None` if the root is never reached
    /// or a type on the way is hidden.
    fn type_segments(&self, ty: ControllerId) -> Option<Vec<String>> {
        let mut collected = Vec::new();
        for current in self.hierarchy.lineage(ty) {
            if current == self.root {
                collected.reverse();
                return Some(collected);
            }
            let controller = self.hierarchy.controller(current);
            if controller.is_hidden() {
                return None;
            }
            collected.push(path::encode_segment(controller.name()));
        }
        None
    }
}

fn label(cached: Result<Arc<Destination>, NotFoundReason>, raw_path: &str) -> Resolution {
    cached.map_err(|reason| NotFound::method(raw_path, reason))
}

fn memoized<K, F>(map: &DashMap<K, Option<String>>, key: K, cache: &'static str, compute: F) -> Option<String>
where
    K: std::hash::Hash + Eq + Copy,
    F: FnOnce() -> Option<String>,
{
    if let Some(hit) = map.get(&key) {
        metrics::record_cache_lookup(cache, true);
        return hit.value().clone();
    }
    metrics::record_cache_lookup(cache, false);
    let value = compute();
    map.entry(key).or_insert(value).value().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{OperationSpec, TypeSpec};

    fn hierarchy() -> Arc<Hierarchy> {
        let mut b = Hierarchy::builder();
        let root = b.root(TypeSpec::new("Root").operation(OperationSpec::call())).unwrap();
        let level2 = b
            .child(
                root,
                TypeSpec::new("Level2Controller")
                    .operation(OperationSpec::call())
                    .operation(OperationSpec::new("show_user").template("users/show"))
                    .operation(OperationSpec::new("draft").hidden()),
            )
            .unwrap();
        b.child(
            level2,
            TypeSpec::new("Level3Controller")
                .slug("Level 3")
                .operation(OperationSpec::new("func_on_level3")),
        )
        .unwrap();
        b.child(root, TypeSpec::new("Secret").hidden().operation(OperationSpec::new("peek")))
            .unwrap();
        Arc::new(b.build().unwrap())
    }

    fn op(h: &Hierarchy, owner: &str, ident: &str) -> OperationId {
        h.find_operation(h.find_controller(owner).unwrap(), ident).unwrap()
    }

    #[test]
    fn test_paths() {
        let h = hierarchy();
        let cache = DestinationCache::new(h.clone(), h.root(), None);

        assert_eq!(cache.path_for(op(&h, "Root", "__call__")).as_deref(), Some("/"));
        assert_eq!(cache.path_for(op(&h, "Level2Controller", "__call__")).as_deref(), Some("/level2/"));
        assert_eq!(
            cache.path_for(op(&h, "Level3Controller", "func_on_level3")).as_deref(),
            Some("/level2/Level%203/func_on_level3")
        );
    }

    #[test]
    fn test_hidden_has_no_path() {
        let h = hierarchy();
        let cache = DestinationCache::new(h.clone(), h.root(), None);
        assert_eq!(cache.path_for(op(&h, "Level2Controller", "draft")), None);
        assert_eq!(cache.path_for(op(&h, "Secret", "peek")), None);
        assert_eq!(cache.template_for(op(&h, "Secret", "peek")), None);
    }

    #[test]
    fn test_outside_root_has_no_path() {
        let h = hierarchy();
        let level2 = h.find_controller("Level2Controller").unwrap();
        let cache = DestinationCache::new(h.clone(), level2, None);

        assert_eq!(cache.path_for(op(&h, "Root", "__call__")), None);
        assert_eq!(cache.path_for(op(&h, "Level2Controller", "show_user")).as_deref(), Some("/show_user"));
        assert_eq!(cache.type_path_for(level2).as_deref(), Some("/"));
    }

    #[test]
    fn test_uris_and_templates() {
        let h = hierarchy();
        let base = Url::parse("https://example.com/app/").unwrap();
        let cache = DestinationCache::new(h.clone(), h.root(), Some(base));

        assert_eq!(
            cache.uri_for(op(&h, "Level2Controller", "__call__")).as_deref(),
            Some("https://example.com/app/level2/")
        );
        assert_eq!(cache.template_for(op(&h, "Level2Controller", "show_user")).as_deref(), Some("users/show"));
        assert_eq!(cache.template_for(op(&h, "Level2Controller", "__call__")).as_deref(), Some("level2/index"));
        assert_eq!(cache.template_for(op(&h, "Root", "__call__")).as_deref(), Some("index"));
    }

    #[test]
    fn test_resolve_cached_runs_once() {
        let h = hierarchy();
        let cache = DestinationCache::new(h.clone(), h.root(), None);
        let mut calls = 0;

        let first = cache.resolve_cached("/missing", "/missing", || {
            calls += 1;
            Err(NotFoundReason::NoSuchSegment)
        });
        let second = cache.resolve_cached("/missing", "/MISSING", || {
            calls += 1;
            Err(NotFoundReason::NoSuchSegment)
        });

        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        let (first, second) = (first.unwrap_err(), second.unwrap_err());
        assert_eq!(first.reason, second.reason);
        assert_eq!(first.path, "/missing");
        assert_eq!(second.path, "/MISSING");
    }

    #[test]
    fn test_destination_interned() {
        let h = hierarchy();
        let cache = DestinationCache::new(h.clone(), h.root(), None);
        let target = op(&h, "Level2Controller", "show_user");

        let a = cache.resolve_cached("/level2/show_user", "/level2/show_user", || Ok(target)).unwrap();
        let b = cache.resolve_cached("/level2/show_user.json", "/level2/show_user.json", || Ok(target)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_dotted_leaf_path_escapes_dot() {
        let mut b = Hierarchy::builder();
        let root = b
            .root(TypeSpec::new("Root").operation(OperationSpec::new("feed").slug("feed.rss")))
            .unwrap();
        b.child(root, TypeSpec::new("V1").slug("v1.2").operation(OperationSpec::call()))
            .unwrap();
        let h = Arc::new(b.build().unwrap());
        let cache = DestinationCache::new(h.clone(), h.root(), None);

        assert_eq!(cache.path_for(op(&h, "Root", "feed")).as_deref(), Some("/feed%2Erss"));
        assert_eq!(cache.path_for(op(&h, "V1", "__call__")).as_deref(), Some("/v1.2/"));
    }
}
