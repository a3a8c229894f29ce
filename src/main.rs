//! Dispatch router service.
//!
//! Serves a controller tree over HTTP: each request is matched against the configured
//! filters, then walked down the tree, and the resolved operation answers as JSON.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ router ──▶ filter chain ──┐
//!                                       │                       │ no match
//!                                       │        tree resolver ◀┘
//!                                       │             │
//!                                       ▼             ▼
//!                              destination cache ◀── resolution
//!                                       │
//!     Client Response                   ▼
//!     ◀────────────── response ◀──── invoke (signature check, handler)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde_json::json;

use dispatch_router::config::DispatchConfig;
use dispatch_router::error::{ConfigError, InvocationError};
use dispatch_router::hierarchy::{Call, Hierarchy, OperationSpec, Signature, TypeSpec};
use dispatch_router::http::HttpServer;
use dispatch_router::lifecycle::{signals, startup, Shutdown};
use dispatch_router::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "dispatch-router")]
#[command(about = "Serve a controller tree over HTTP", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match startup::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dispatch-router: {e}");
            std::process::exit(1);
        }
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dispatch-router starting");
    log_config(&config);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let hierarchy = Arc::new(sample_hierarchy()?);
    let router = startup::build_router(hierarchy, &config)?;
    let listener = startup::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let stop = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    HttpServer::new(&config, router).run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn log_config(config: &DispatchConfig) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        filters = config.routing.filters.len(),
        base_url = config.routing.base_url.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );
}

/// The bundled controller tree.
///
/// ```text
/// Root                 /            __call__
/// ├── Level2Controller /level2/     __call__ (delegate), show_user(user)
/// │   └── Level3       /level2/level3/  func_on_level3(*args)
/// └── BlogController   /blog/       index(page=), archive(year, month), post(**kw), drafts (hidden)
/// ```
fn sample_hierarchy() -> Result<Hierarchy, ConfigError> {
    let mut b = Hierarchy::builder();

    let root = b.root(
        TypeSpec::new("Root").operation(
            OperationSpec::call()
                .signature(Signature::new())
                .handler(|_| Ok(json!({ "message": "dispatch-router" }))),
        ),
    )?;

    let level2 = b.child(
        root,
        TypeSpec::new("Level2Controller")
            .operation(
                OperationSpec::call()
                    .delegate()
                    .signature(Signature::new())
                    .handler(|call| Ok(json!({ "type": "level2", "operation": call.operation.name() }))),
            )
            .operation(
                OperationSpec::new("show_user")
                    .signature(Signature::new().required("user").optional("tab"))
                    .handler(show_user),
            ),
    )?;

    b.child(
        level2,
        TypeSpec::new("Level3").operation(
            OperationSpec::new("func_on_level3")
                .signature(Signature::new().with_varargs())
                .handler(|call| Ok(json!({ "args": call.args }))),
        ),
    )?;

    b.child(
        root,
        TypeSpec::new("BlogController")
            .operation(
                OperationSpec::new("index")
                    .signature(Signature::new().optional("page"))
                    .handler(|call| Ok(json!({ "page": call.params.get("page").map_or("1", String::as_str) }))),
            )
            .operation(
                OperationSpec::new("archive")
                    .signature(Signature::new().required("year").required("month"))
                    .handler(|call| Ok(json!({ "args": call.args, "params": call.params }))),
            )
            .operation(
                OperationSpec::new("post")
                    .template("blog/entry")
                    .signature(Signature::new().with_varkw())
                    .handler(|call| Ok(json!({ "params": call.params }))),
            )
            .operation(OperationSpec::new("drafts").hidden()),
    )?;

    b.build()
}

fn show_user(call: &Call<'_>) -> Result<serde_json::Value, InvocationError> {
    let user = call
        .args
        .first()
        .or_else(|| call.params.get("user"))
        .ok_or_else(|| InvocationError::BadRequest("user is required".into()))?;
    Ok(json!({
        "user": user,
        "tab": call.params.get("tab"),
    }))
}
