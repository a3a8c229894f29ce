//! Canonical segment names.
//!
//! # Responsibilities
//! - Derive the path segment a type or operation answers to
//! - Compare a request segment against a canonical name
//!
//! # Design Decisions
//! - An explicit slug is used verbatim (hyphens, casing preserved in generated paths)
//! - Otherwise the identifier is lowercased; type identifiers lose a `Controller` suffix first
//! - Matching is case-insensitive for slugs and derived names alike, so that the
//!   lowercased cache key always maps to a single resolution

/// Suffix stripped from type identifiers before lowering.
pub const CONTROLLER_SUFFIX: &str = "Controller";

/// Anything that answers to a path segment.
pub trait CanonicalName {
    /// Declared identifier (type or function name).
    fn ident(&self) -> &str;

    /// Explicit rename, if any.
    fn slug(&self) -> Option<&str>;

    /// The segment name this node answers to.
    fn canonical_name(&self) -> String;
}

/// Canonical name of a controller type.
pub fn type_name(ident: &str, slug: Option<&str>) -> String {
    if let Some(slug) = slug {
        return slug.to_string();
    }
    let base = match ident.strip_suffix(CONTROLLER_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => ident,
    };
    base.to_lowercase()
}

/// Canonical name of a leaf operation.
pub fn operation_name(ident: &str, slug: Option<&str>) -> String {
    match slug {
        Some(slug) => slug.to_string(),
        None => ident.to_lowercase(),
    }
}

/// Case-insensitive segment comparison.
pub fn segment_eq(canonical: &str, segment: &str) -> bool {
    if canonical.len() == segment.len() && canonical.eq_ignore_ascii_case(segment) {
        return true;
    }
    canonical.to_lowercase() == segment.to_lowercase()
}
