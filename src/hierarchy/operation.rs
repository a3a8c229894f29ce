//! Leaf operation descriptors.
//!
//! An operation is declared with an [`OperationSpec`] at registration time and frozen into a
//! [`LeafOperation`] owned by the hierarchy.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::InvocationError;
use crate::hierarchy::naming::{self, CanonicalName};
use crate::hierarchy::registry::{ControllerId, OperationId};

/// Identifier of the default operation, invoked when a path ends on a type.
pub const CALL_OPERATION: &str = "__call__";

/// Keyword parameters passed to an operation.
pub type Params = BTreeMap<String, String>;

/// Arguments handed to a handler.
#[derive(Debug)]
pub struct Call<'a> {
    pub operation: &'a LeafOperation,
    pub args: &'a [String],
    pub params: &'a Params,
}

/// Handler behind a leaf operation.
pub type Handler = Arc<dyn Fn(&Call<'_>) -> Result<Value, InvocationError> + Send + Sync>;

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub has_default: bool,
}

/// Parameter signature of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub params: Vec<Parameter>,
    /// Accepts extra positional arguments.
    pub varargs: bool,
    /// Accepts extra keyword arguments.
    pub varkw: bool,
}

impl Signature {
    /// A signature with no parameters that rejects any argument.
    pub fn new() -> Self {
        Self::default()
    }

    /// A signature that accepts any positional and keyword arguments.
    pub fn variadic() -> Self {
        Self {
            params: Vec::new(),
            varargs: true,
            varkw: true,
        }
    }

    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            has_default: false,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.params.push(Parameter {
            name: name.into(),
            has_default: true,
        });
        self
    }

    pub fn with_varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn with_varkw(mut self) -> Self {
        self.varkw = true;
        self
    }
}

/// Registration-time description of an operation.
#[derive(Clone)]
pub struct OperationSpec {
    pub(crate) ident: String,
    pub(crate) slug: Option<String>,
    pub(crate) hidden: bool,
    pub(crate) delegate: bool,
    pub(crate) template: Option<String>,
    pub(crate) signature: Signature,
    pub(crate) handler: Option<Handler>,
}

impl OperationSpec {
    /// Declare an operation. The signature defaults to [`Signature::variadic`].
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            slug: None,
            hidden: false,
            delegate: false,
            template: None,
            signature: Signature::variadic(),
            handler: None,
        }
    }

    /// Declare the default operation of a type.
    pub fn call() -> Self {
        Self::new(CALL_OPERATION)
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Make the operation reachable through descendant types that do not redeclare it.
    pub fn delegate(mut self) -> Self {
        self.delegate = true;
        self
    }

    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Call<'_>) -> Result<Value, InvocationError> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationSpec")
            .field("ident", &self.ident)
            .field("slug", &self.slug)
            .field("hidden", &self.hidden)
            .field("delegate", &self.delegate)
            .finish_non_exhaustive()
    }
}

/// A named, callable unit of work attached to exactly one controller type.
pub struct LeafOperation {
    id: OperationId,
    owner: ControllerId,
    name: String,
    spec: OperationSpec,
}

impl LeafOperation {
    pub(crate) fn new(id: OperationId, owner: ControllerId, spec: OperationSpec) -> Self {
        let name = naming::operation_name(&spec.ident, spec.slug.as_deref());
        Self {
            id,
            owner,
            name,
            spec,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn owner(&self) -> ControllerId {
        self.owner
    }

    /// Canonical name without allocating.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_hidden(&self) -> bool {
        self.spec.hidden
    }

    pub fn is_delegate(&self) -> bool {
        self.spec.delegate
    }

    /// Whether this is the default operation of its type.
    pub fn is_call(&self) -> bool {
        self.spec.ident == CALL_OPERATION
    }

    pub fn template_override(&self) -> Option<&str> {
        self.spec.template.as_deref()
    }

    pub fn signature(&self) -> &Signature {
        &self.spec.signature
    }

    pub fn handler(&self) -> Option<&Handler> {
        self.spec.handler.as_ref()
    }
}

impl CanonicalName for LeafOperation {
    fn ident(&self) -> &str {
        &self.spec.ident
    }

    fn slug(&self) -> Option<&str> {
        self.spec.slug.as_deref()
    }

    fn canonical_name(&self) -> String {
        self.name.clone()
    }
}

impl fmt::Debug for LeafOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeafOperation")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish()
    }
}
