//! Filter chain.
//!
//! # Responsibilities
//! - Hold explicit pattern → canonical destination rules in registration order
//! - Match a request method and URL against them, first match wins
//! - Turn captures into keyword params (named) and positional args (unnamed)
//!
//! # Design Decisions
//! - Patterns are compiled once, at registration
//! - A method whitelist rejects other methods, except the introspection method when the
//!   router exposes it
//! - Static params are applied first and captures overwrite them
//! - Captured values are percent-decoded, like tree segments and query params

use axum::http::Method;
use regex::Regex;
use url::Url;

use crate::error::ConfigError;
use crate::hierarchy::Params;
use crate::routing::path;

/// Declarative form of a filter, as registered by code or loaded from config.
#[derive(Debug, Clone, Default)]
pub struct FilterSpec {
    pub pattern: String,
    pub destination: String,
    pub methods: Option<Vec<String>>,
    pub params: Params,
    pub match_full_url: bool,
}

impl FilterSpec {
    pub fn new(pattern: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            destination: destination.into(),
            ..Self::default()
        }
    }

    pub fn methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Match against the whole URL (scheme, host, path, query) instead of the path alone.
    pub fn match_full_url(mut self, full: bool) -> Self {
        self.match_full_url = full;
        self
    }
}

/// A compiled filter.
#[derive(Debug)]
pub struct Filter {
    pattern: Regex,
    destination: String,
    key: String,
    methods: Option<Vec<Method>>,
    params: Params,
    match_full_url: bool,
}

impl Filter {
    pub fn compile(spec: FilterSpec) -> Result<Self, ConfigError> {
        let pattern = Regex::new(&spec.pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: spec.pattern.clone(),
            source,
        })?;

        let methods = spec
            .methods
            .map(|methods| methods.iter().map(|m| parse_method(m)).collect::<Result<Vec<_>, _>>())
            .transpose()?;

        Ok(Self {
            pattern,
            key: path::normalize(&spec.destination),
            destination: spec.destination,
            methods,
            params: spec.params,
            match_full_url: spec.match_full_url,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Canonical destination path as declared.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Cache key of the destination path.
    pub fn destination_key(&self) -> &str {
        &self.key
    }

    fn accepts(&self, method: &Method, introspection: Option<&Method>) -> bool {
        match &self.methods {
            None => true,
            Some(allowed) => allowed.contains(method) || introspection == Some(method),
        }
    }

    /// Run the pattern; on a match return positional args and params (static, then captured).
    fn capture(&self, url: &Url) -> Option<(Vec<String>, Params)> {
        let subject = if self.match_full_url {
            url.as_str()
        } else {
            url.path()
        };
        let captures = self.pattern.captures(subject)?;

        let mut args = Vec::new();
        let mut params = self.params.clone();
        for (index, name) in self.pattern.capture_names().enumerate().skip(1) {
            let Some(group) = captures.get(index) else {
                continue;
            };
            let value = path::decode(group.as_str());
            match name {
                Some(name) => {
                    params.insert(name.to_string(), value);
                }
                None => args.push(value),
            }
        }
        Some((args, params))
    }
}

/// Parse a method token, accepting any case.
pub fn parse_method(token: &str) -> Result<Method, ConfigError> {
    Method::from_bytes(token.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| ConfigError::InvalidMethod(token.to_string()))
}

/// A successful filter match.
#[derive(Debug)]
pub struct FilterMatch<'a> {
    pub filter: &'a Filter,
    pub args: Vec<String>,
    pub params: Params,
}

/// Ordered list of filters.
#[derive(Debug, Default)]
pub struct FilterChain {
    filters: Vec<Filter>,
    introspection: Option<Method>,
}

impl FilterChain {
    /// `introspection` is the method allowed past method whitelists, if exposed.
    pub fn new(introspection: Option<Method>) -> Self {
        Self {
            filters: Vec::new(),
            introspection,
        }
    }

    /// The method let through method whitelists, if exposed.
    pub fn introspection(&self) -> Option<&Method> {
        self.introspection.as_ref()
    }

    pub(crate) fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    /// First filter, in registration order, that accepts the method and matches the URL.
    pub fn find_match(&self, method: &Method, url: &Url) -> Option<FilterMatch<'_>> {
        self.filters
            .iter()
            .filter(|f| f.accepts(method, self.introspection.as_ref()))
            .find_map(|filter| {
                filter
                    .capture(url)
                    .map(|(args, params)| FilterMatch { filter, args, params })
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
