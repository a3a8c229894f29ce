//! Invocation layer.
//!
//! # Responsibilities
//! - Check merged args/params against the operation's signature
//! - Call the handler behind a resolved destination
//!
//! # Design Decisions
//! - Argument mismatches are `BadRequest`, never a not-found: the path did resolve
//! - Positional args bind to declared parameters in order; a parameter bound both
//!   positionally and by keyword is a mismatch
//! - An operation registered without a handler answers `null`

use axum::http::Method;
use serde_json::Value;
use url::Url;

use crate::error::{DispatchResult, InvocationError};
use crate::hierarchy::{Call, Params, Signature};
use crate::routing::{Destination, Router};

/// Check that `args` and `params` can be bound to `signature`.
pub fn check_arguments(signature: &Signature, args: &[String], params: &Params) -> Result<(), InvocationError> {
    let declared = signature.params.len();
    if args.len() > declared && !signature.varargs {
        return Err(InvocationError::BadRequest(format!(
            "takes at most {declared} positional arguments ({} given)",
            args.len()
        )));
    }

    for key in params.keys() {
        match signature.params.iter().position(|p| &p.name == key) {
            Some(index) if index < args.len() => {
                return Err(InvocationError::BadRequest(format!(
                    "got multiple values for argument {key:?}"
                )));
            }
            Some(_) => {}
            None if signature.varkw => {}
            None => {
                return Err(InvocationError::BadRequest(format!(
                    "unexpected keyword argument {key:?}"
                )));
            }
        }
    }

    let missing: Vec<&str> = signature
        .params
        .iter()
        .skip(args.len())
        .filter(|p| !p.has_default && !params.contains_key(&p.name))
        .map(|p| p.name.as_str())
        .collect();
    if !missing.is_empty() {
        return Err(InvocationError::BadRequest(format!(
            "missing required arguments: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Invoke the operation behind `destination`.
pub fn invoke(destination: &Destination, args: &[String], params: &Params) -> Result<Value, InvocationError> {
    let operation = destination.operation();

    if let Err(err) = check_arguments(operation.signature(), args, params) {
        tracing::warn!(operation = %operation.name(), error = %err, "Argument mismatch");
        return Err(err);
    }

    tracing::debug!(operation = %operation.name(), args = args.len(), params = params.len(), "Invoking operation");
    match operation.handler() {
        Some(handler) => (**handler)(&Call {
            operation,
            args,
            params,
        }),
        None => Ok(Value::Null),
    }
}

/// Route a request and invoke whatever it resolves to.
pub fn dispatch(router: &Router, method: &Method, url: &Url, args: Vec<String>, params: Params) -> DispatchResult<Value> {
    let route = router.route(method, url, args, params);
    let destination = route.destination?;
    Ok(invoke(&destination, &route.args, &route.params)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::error::DispatchError;
    use crate::hierarchy::{Hierarchy, OperationSpec, TypeSpec};

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_required_by_keyword_or_position() {
        let sig = Signature::new().required("user").optional("page");
        assert!(check_arguments(&sig, &[], &params(&[("user", "rasmus")])).is_ok());
        assert!(check_arguments(&sig, &args(&["rasmus"]), &Params::new()).is_ok());
        assert!(check_arguments(&sig, &args(&["rasmus", "2"]), &Params::new()).is_ok());
    }

    #[test]
    fn test_missing_required() {
        let sig = Signature::new().required("user").required("id");
        let err = check_arguments(&sig, &[], &params(&[("id", "1")])).unwrap_err();
        assert_eq!(err, InvocationError::BadRequest("missing required arguments: user".into()));
    }

    #[test]
    fn test_too_many_positional() {
        let sig = Signature::new().required("user");
        assert!(check_arguments(&sig, &args(&["a", "b"]), &Params::new()).is_err());
        assert!(check_arguments(&sig.with_varargs(), &args(&["a", "b"]), &Params::new()).is_ok());
    }

    #[test]
    fn test_unexpected_and_duplicate_keywords() {
        let sig = Signature::new().required("user");
        assert!(check_arguments(&sig, &[], &params(&[("user", "a"), ("extra", "b")])).is_err());
        assert!(check_arguments(&sig, &args(&["a"]), &params(&[("user", "a")])).is_err());

        let open = Signature::new().required("user").with_varkw();
        assert!(check_arguments(&open, &[], &params(&[("user", "a"), ("extra", "b")])).is_ok());
    }

    #[test]
    fn test_variadic_accepts_anything() {
        let sig = Signature::variadic();
        assert!(check_arguments(&sig, &args(&["a", "b"]), &params(&[("k", "v")])).is_ok());
    }

    #[test]
    fn test_dispatch_end_to_end() {
        let mut b = Hierarchy::builder();
        b.root(
            TypeSpec::new("Root").operation(
                OperationSpec::new("greet")
                    .signature(Signature::new().required("name"))
                    .handler(|call| Ok(json!(format!("hello {}", call.params["name"])))),
            ),
        )
        .unwrap();
        let router = Router::new(Arc::new(b.build().unwrap()));
        let url = |s: &str| Url::parse(&format!("http://localhost{s}")).unwrap();

        let value = dispatch(&router, &Method::GET, &url("/greet"), Vec::new(), params(&[("name", "ana")])).unwrap();
        assert_eq!(value, json!("hello ana"));

        let err = dispatch(&router, &Method::GET, &url("/greet"), Vec::new(), Params::new()).unwrap_err();
        assert!(matches!(err, DispatchError::Invocation(InvocationError::BadRequest(_))));

        let err = dispatch(&router, &Method::GET, &url("/wave"), Vec::new(), Params::new()).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound(_)));
    }
}
