//! Path codec.
//!
//! # Responsibilities
//! - Split a raw URL path into decoded segments for tree traversal
//! - Strip a single filename extension from the final segment
//! - Produce the cache key for a raw path
//!
//! # Design Decisions
//! - Split before decoding, so an encoded `%2F` stays inside its segment
//! - Empty segments are dropped (`//`, leading and trailing `/` collapse)
//! - Segments keep their case; comparison against names is case-insensitive instead
//! - The cache key is built from the tokenized segments, so two paths share a key only
//!   when they walk the tree identically

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped when a name is written into a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Final segments also escape `.`, which would otherwise read as an extension.
const FINAL_SEGMENT: &AsciiSet = &SEGMENT.add(b'.');

/// Split off the extension of the final segment, if it has one.
///
/// A dot at the start of the segment does not count (`/.well-known` keeps its name).
pub fn split_extension(raw_path: &str) -> (&str, Option<&str>) {
    let last_start = raw_path.rfind('/').map(|i| i + 1).unwrap_or(0);
    let last = &raw_path[last_start..];
    match last.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < last.len() => {
            let cut = last_start + dot;
            (&raw_path[..cut], Some(&raw_path[cut + 1..]))
        }
        _ => (raw_path, None),
    }
}

/// Tokenize a raw path into decoded, non-empty segments.
pub fn tokenize(raw_path: &str) -> Vec<String> {
    let (path, _) = split_extension(raw_path);
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(decode)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Cache key for a raw path: its tokenized segments, lowercased and re-encoded.
pub fn normalize(raw_path: &str) -> String {
    cache_key(&tokenize(raw_path))
}

/// Cache key for already tokenized segments.
pub fn cache_key<S: AsRef<str>>(segments: &[S]) -> String {
    let mut key = String::from("/");
    let encoded: Vec<String> = segments
        .iter()
        .map(|s| encode_segment(&s.as_ref().to_lowercase()))
        .collect();
    key.push_str(&encoded.join("/"));
    key
}

/// Percent-encode a name for use as an inner path segment.
pub fn encode_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}

/// Percent-encode a name for use as the last segment of a path.
pub fn encode_final_segment(name: &str) -> String {
    utf8_percent_encode(name, FINAL_SEGMENT).to_string()
}

/// Percent-decode one segment or captured value.
pub fn decode(value: &str) -> String {
    match percent_decode_str(value).decode_utf8_lossy() {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}
