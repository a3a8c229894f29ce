//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde_json::json;
use url::Url;

use dispatch_router::config::DispatchConfig;
use dispatch_router::error::InvocationError;
use dispatch_router::hierarchy::{ControllerId, Hierarchy, OperationId, OperationSpec, Signature, TypeSpec};
use dispatch_router::routing::{FilterSpec, Router};

/// Controller tree used across the integration tests.
///
/// ```text
/// Root                        __call__, help (delegate), about, internal (hidden)
/// ├── Level2Controller        __call__ (delegate), show_user(user, tab=), help (hidden)
/// │   └── Level3              func_on_level3(*args)
/// ├── BlogController          index(page=), archive(year, month), post(**kw) [template blog/entry],
/// │                           drafts (hidden), "feed.rss" (slug), fail
/// ├── Admin (hidden)          purge
/// └── Docs (slug "api-docs")  __call__, "Getting Started" (slug)
/// ```
pub fn hierarchy() -> Arc<Hierarchy> {
    let mut b = Hierarchy::builder();
    let root = b
        .root(
            TypeSpec::new("Root")
                .operation(OperationSpec::call().signature(Signature::new()).handler(|_| Ok(json!("root"))))
                .operation(OperationSpec::new("help").delegate())
                .operation(OperationSpec::new("about"))
                .operation(OperationSpec::new("internal").hidden()),
        )
        .unwrap();

    let level2 = b
        .child(
            root,
            TypeSpec::new("Level2Controller")
                .operation(OperationSpec::call().delegate())
                .operation(
                    OperationSpec::new("show_user")
                        .signature(Signature::new().required("user").optional("tab"))
                        .handler(|call| Ok(json!({ "user": call.params.get("user"), "tab": call.params.get("tab") }))),
                )
                .operation(OperationSpec::new("help").hidden()),
        )
        .unwrap();

    b.child(
        level2,
        TypeSpec::new("Level3").operation(
            OperationSpec::new("func_on_level3")
                .signature(Signature::new().with_varargs())
                .handler(|call| Ok(json!({ "args": call.args }))),
        ),
    )
    .unwrap();

    b.child(
        root,
        TypeSpec::new("BlogController")
            .operation(OperationSpec::new("index").signature(Signature::new().optional("page")))
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
            .operation(OperationSpec::new("drafts").hidden())
            .operation(OperationSpec::new("feed").slug("feed.rss"))
            .operation(
                OperationSpec::new("fail")
                    .handler(|_| Err(InvocationError::Handler("storage offline".into()))),
            ),
    )
    .unwrap();

    b.child(root, TypeSpec::new("Admin").hidden().operation(OperationSpec::new("purge")))
        .unwrap();

    b.child(
        root,
        TypeSpec::new("DocsController")
            .slug("api-docs")
            .operation(OperationSpec::call())
            .operation(OperationSpec::new("getting_started").slug("Getting Started")),
    )
    .unwrap();

    Arc::new(b.build().unwrap())
}

/// Router over [`hierarchy`] with the `/user/<name>` filter registered.
pub fn router() -> Router {
    let mut router = Router::new(hierarchy());
    router
        .add_filter(FilterSpec::new(r"^/user/(?P<user>[^/]+)", "/level2/show_user"))
        .unwrap();
    router
}

/// Config with the same filter, for the HTTP surface.
pub fn config() -> DispatchConfig {
    let mut config = DispatchConfig::default();
    config.routing.base_url = Some("https://example.com/app/".into());
    config.routing.filters.push(dispatch_router::config::FilterConfig {
        pattern: r"^/user/(?P<user>[^/]+)".into(),
        destination: "/level2/show_user".into(),
        methods: None,
        params: Default::default(),
        match_full_url: false,
    });
    config
}

pub fn url(path: &str) -> Url {
    Url::parse(&format!("http://localhost{path}")).unwrap()
}

pub fn controller(hierarchy: &Hierarchy, ident: &str) -> ControllerId {
    hierarchy.find_controller(ident).unwrap()
}

pub fn operation(hierarchy: &Hierarchy, owner: &str, ident: &str) -> OperationId {
    hierarchy
        .find_operation(controller(hierarchy, owner), ident)
        .unwrap()
}
