//! Request identification and URL reconstruction.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) when the client sent none
//! - Rebuild the absolute request URL that filters may match against
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing, echoed on the response

use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use url::Url;
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::x_request_id(UuidRequestId)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

/// Request ID from the headers, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Absolute URL of the request, using the `Host` header when the URI is origin-form.
pub fn request_url(uri: &Uri, headers: &HeaderMap) -> Result<Url, url::ParseError> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Url::parse(&uri.to_string());
    }
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
    Url::parse(&format!("http://{host}{path_and_query}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_url_from_host_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("api.example.com"));
        let uri: Uri = "/user/rasmus?tab=posts".parse().unwrap();

        let url = request_url(&uri, &headers).unwrap();
        assert_eq!(url.as_str(), "http://api.example.com/user/rasmus?tab=posts");
    }

    #[test]
    fn test_request_url_absolute_form() {
        let uri: Uri = "https://example.com/a/b".parse().unwrap();
        let url = request_url(&uri, &HeaderMap::new()).unwrap();
        assert_eq!(url.as_str(), "https://example.com/a/b");
    }

    #[test]
    fn test_request_id_fallback() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }

    #[test]
    fn test_make_request_id() {
        let request = Request::builder().body(()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        assert_eq!(id.header_value().len(), 36);
    }
}
