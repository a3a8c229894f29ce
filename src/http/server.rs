//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all handler
//! - Wire up middleware (request ID, tracing, timeout)
//! - Route each request and invoke, describe or reject the destination
//! - Serve until the shutdown channel fires
//!
//! # Design Decisions
//! - Query string pairs become keyword params, request args start empty
//! - The introspection method describes a destination instead of invoking it, and only
//!   when the router exposes it

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Method, Request, Uri},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::DispatchConfig;
use crate::hierarchy::Params;
use crate::http::request::{self, propagate_request_id_layer, set_request_id_layer};
use crate::http::response;
use crate::invoke;
use crate::observability::metrics;
use crate::routing::Router as DispatchRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<DispatchRouter>,
}

/// HTTP front end of a dispatch router.
pub struct HttpServer {
    app: Router,
}

impl HttpServer {
    pub fn new(config: &DispatchConfig, router: Arc<DispatchRouter>) -> Self {
        let app = Self::build_app(config, AppState { router });
        Self { app }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &DispatchConfig, state: AppState) -> Router {
        let middleware = ServiceBuilder::new()
            .layer(set_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request::request_id(req.headers()),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(middleware)
    }

    /// The service, for driving requests without a listener.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Route the request and answer from the destination.
async fn dispatch_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let request_id = request::request_id(&headers).to_string();

    let url = match request::request_url(&uri, &headers) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(request_id = %request_id, uri = %uri, error = %e, "Unparseable request URL");
            return finish(&method, start, response::bad_request("invalid request URL"));
        }
    };
    let params: Params = url.query_pairs().into_owned().collect();

    let route = state.router.route(&method, &url, Vec::new(), params);
    let destination = match &route.destination {
        Ok(destination) => destination,
        Err(not_found) => {
            tracing::debug!(request_id = %request_id, path = %url.path(), reason = %not_found.reason, "No destination");
            return finish(&method, start, response::not_found(not_found));
        }
    };

    if state.router.introspection_method() == Some(&method) {
        let described = response::introspection(&state.router, destination, route.format.as_deref());
        return finish(&method, start, described);
    }

    let answer = match invoke::invoke(destination, &route.args, &route.params) {
        Ok(value) => response::ok(value),
        Err(err) => {
            tracing::warn!(
                request_id = %request_id,
                operation = %destination.operation().name(),
                error = %err,
                "Invocation failed"
            );
            response::invocation_error(&err)
        }
    };
    finish(&method, start, answer)
}

fn finish(method: &Method, start: Instant, response: Response) -> Response {
    metrics::record_request(method.as_str(), response.status().as_u16(), start);
    response
}
