//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compose filter chain, tree resolver and destination cache behind one entry point
//! - Validate filters against the hierarchy as they are registered
//! - Answer inverse lookups: canonical path, URI and template path of any node
//!
//! # Design Decisions
//! - Construction takes `&mut self`, so filter registration is serialized by the borrow checker
//! - After construction the router is shared via `Arc` and only read
//! - Explicit `NotFound` rather than silent default

use std::sync::Arc;

use axum::http::Method;
use url::Url;

use crate::config::schema::{FilterConfig, RoutingConfig};
use crate::error::{ConfigError, NotFound, NotFoundReason};
use crate::hierarchy::naming::CanonicalName;
use crate::hierarchy::{ControllerId, Hierarchy, OperationId, Params};
use crate::observability::metrics;
use crate::routing::cache::{DestinationCache, Resolution};
use crate::routing::filter::{self, Filter, FilterChain, FilterSpec};
use crate::routing::path;
use crate::routing::resolver::TreeResolver;

/// Which stage produced a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteSource {
    Filter,
    Tree,
}

impl RouteSource {
    fn as_str(self) -> &'static str {
        match self {
            RouteSource::Filter => "filter",
            RouteSource::Tree => "tree",
        }
    }
}

/// Result of routing one request.
#[derive(Debug)]
pub struct Route {
    pub destination: Resolution,
    /// Request args followed by positional captures.
    pub args: Vec<String>,
    /// Request params, overlaid by filter static params, overlaid by named captures.
    pub params: Params,
    /// Extension stripped from the final path segment, e.g. `json`.
    pub format: Option<String>,
    pub source: RouteSource,
}

/// A node of the hierarchy, for inverse lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Node {
    Controller(ControllerId),
    Operation(OperationId),
}

impl From<ControllerId> for Node {
    fn from(id: ControllerId) -> Self {
        Node::Controller(id)
    }
}

impl From<OperationId> for Node {
    fn from(id: OperationId) -> Self {
        Node::Operation(id)
    }
}

/// Construction options.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Type the tree walk starts from; defaults to the hierarchy root.
    pub root: Option<ControllerId>,
    /// Prefix for canonical URIs.
    pub base_url: Option<Url>,
    /// Method let through filter method whitelists.
    pub introspection: Option<Method>,
}

/// The dispatch router.
#[derive(Debug)]
pub struct Router {
    hierarchy: Arc<Hierarchy>,
    filters: FilterChain,
    resolver: TreeResolver,
    cache: DestinationCache,
}

impl Router {
    /// Router over the whole hierarchy, without filters.
    pub fn new(hierarchy: Arc<Hierarchy>) -> Self {
        let root = hierarchy.root();
        Self::assemble(hierarchy, root, RouterOptions::default())
    }

    pub fn with_options(hierarchy: Arc<Hierarchy>, options: RouterOptions) -> Result<Self, ConfigError> {
        let root = match options.root {
            Some(root) if hierarchy.controllers().any(|t| t.id() == root) => root,
            Some(root) => return Err(ConfigError::UnknownRoot(format!("{root:?}"))),
            None => hierarchy.root(),
        };
        Ok(Self::assemble(hierarchy, root, options))
    }

    /// Build a router from the `[routing]` config section, registering its filters in order.
    pub fn from_config(hierarchy: Arc<Hierarchy>, config: &RoutingConfig) -> Result<Self, ConfigError> {
        let root = config
            .root
            .as_deref()
            .map(|ident| {
                hierarchy
                    .find_controller(ident)
                    .ok_or_else(|| ConfigError::UnknownRoot(ident.to_string()))
            })
            .transpose()?;

        let base_url = config
            .base_url
            .as_deref()
            .map(|url| {
                Url::parse(url).map_err(|source| ConfigError::InvalidBaseUrl {
                    url: url.to_string(),
                    source,
                })
            })
            .transpose()?;

        let introspection = if config.expose_introspection {
            Some(filter::parse_method(&config.introspection_method)?)
        } else {
            None
        };

        let mut router = Self::with_options(
            hierarchy,
            RouterOptions {
                root,
                base_url,
                introspection,
            },
        )?;
        for filter in &config.filters {
            router.add_filter(FilterSpec::from(filter))?;
        }

        tracing::info!(
            filters = router.filters.len(),
            introspection = config.expose_introspection,
            "Router constructed"
        );
        Ok(router)
    }

    fn assemble(hierarchy: Arc<Hierarchy>, root: ControllerId, options: RouterOptions) -> Self {
        Self {
            filters: FilterChain::new(options.introspection),
            resolver: TreeResolver::new(hierarchy.clone(), root),
            cache: DestinationCache::new(hierarchy.clone(), root, options.base_url),
            hierarchy,
        }
    }

    /// Register a filter after all previously registered ones.
    ///
    /// Fails if the pattern does not compile or the destination does not resolve.
    pub fn add_filter(&mut self, spec: FilterSpec) -> Result<(), ConfigError> {
        let filter = Filter::compile(spec)?;

        if let Err(not_found) = self.resolve_path(filter.destination()) {
            tracing::warn!(
                pattern = %filter.pattern(),
                destination = %filter.destination(),
                reason = %not_found.reason,
                "Filter destination does not resolve"
            );
            return Err(ConfigError::UnresolvedDestination {
                pattern: filter.pattern().to_string(),
                destination: filter.destination().to_string(),
                reason: not_found.reason,
            });
        }

        tracing::info!(
            pattern = %filter.pattern(),
            destination = %filter.destination(),
            position = self.filters.len(),
            "Filter registered"
        );
        self.filters.push(filter);
        Ok(())
    }

    /// Route a request: filters first, then the tree walk.
    pub fn route(&self, method: &Method, url: &Url, mut args: Vec<String>, mut params: Params) -> Route {
        let format = path::split_extension(url.path()).1.map(str::to_string);

        let (destination, source) = match self.filters.find_match(method, url) {
            Some(matched) => {
                let filter = matched.filter;
                let destination = self.cache.resolve_cached(filter.destination_key(), filter.destination(), || {
                    self.resolver.resolve(&path::tokenize(filter.destination()))
                });
                args.extend(matched.args);
                params.extend(matched.params);
                (destination, RouteSource::Filter)
            }
            None => (self.resolve_path(url.path()), RouteSource::Tree),
        };

        metrics::record_route(source.as_str(), destination.is_ok());
        tracing::debug!(
            method = %method,
            path = %url.path(),
            source = source.as_str(),
            found = destination.is_ok(),
            "Request routed"
        );

        Route {
            destination,
            args,
            params,
            format,
            source,
        }
    }

    /// Resolve a raw path through the cache, skipping filters.
    pub fn resolve_path(&self, raw_path: &str) -> Resolution {
        let segments = path::tokenize(raw_path);
        let key = path::cache_key(&segments);
        self.cache
            .resolve_cached(&key, raw_path, || self.resolver.resolve(&segments))
    }

    /// Canonical path of a node.
    pub fn path_to(&self, node: impl Into<Node>) -> Result<String, NotFound> {
        match node.into() {
            Node::Controller(id) => self
                .cache
                .type_path_for(id)
                .ok_or_else(|| NotFound::controller(self.hierarchy.controller(id).ident())),
            Node::Operation(id) => self
                .cache
                .path_for(id)
                .ok_or_else(|| self.unreachable_operation(id)),
        }
    }

    /// Canonical URI of a node.
    pub fn uri_for(&self, node: impl Into<Node>) -> Result<String, NotFound> {
        match node.into() {
            Node::Controller(id) => self
                .cache
                .type_uri_for(id)
                .ok_or_else(|| NotFound::controller(self.hierarchy.controller(id).ident())),
            Node::Operation(id) => self
                .cache
                .uri_for(id)
                .ok_or_else(|| self.unreachable_operation(id)),
        }
    }

    /// Canonical path of a type, with a trailing `/`.
    pub fn path_to_type(&self, ty: ControllerId) -> Result<String, NotFound> {
        self.path_to(Node::Controller(ty))
    }

    pub fn uri_for_type(&self, ty: ControllerId) -> Result<String, NotFound> {
        self.uri_for(Node::Controller(ty))
    }

    /// Template path of an operation.
    pub fn template_path_for(&self, op: OperationId) -> Result<String, NotFound> {
        self.cache
            .template_for(op)
            .ok_or_else(|| NotFound::template(self.operation_label(op)))
    }

    pub fn hierarchy(&self) -> &Arc<Hierarchy> {
        &self.hierarchy
    }

    /// The introspection method, when the router exposes one.
    pub fn introspection_method(&self) -> Option<&Method> {
        self.filters.introspection()
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn resolver(&self) -> &TreeResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &DestinationCache {
        &self.cache
    }

    fn unreachable_operation(&self, op: OperationId) -> NotFound {
        NotFound::method(self.operation_label(op), NotFoundReason::Unreachable)
    }

    /// `Owner.operation`, for diagnostics.
    fn operation_label(&self, op: OperationId) -> String {
        let operation = self.hierarchy.operation(op);
        let owner = self.hierarchy.controller(operation.owner());
        format!("{}.{}", owner.ident(), operation.ident())
    }
}

impl From<&FilterConfig> for FilterSpec {
    fn from(config: &FilterConfig) -> Self {
        Self {
            pattern: config.pattern.clone(),
            destination: config.destination.clone(),
            methods: config.methods.clone(),
            params: config.params.clone(),
            match_full_url: config.match_full_url,
        }
    }
}
