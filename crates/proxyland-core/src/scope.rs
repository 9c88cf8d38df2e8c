#![forbid(unsafe_code)]

//! The view-side capability the binding engine consumes.
//!
//! The engine never owns view targets. It resolves a [`TargetDescriptor`]
//! against a [`Scope`] on every pass and pushes values into the resulting
//! [`Target`] handles.
//!
//! A descriptor is one of:
//!
//! - a query string, resolved through the scope (all matches, in order);
//! - a single handle, treated as a one-element list;
//! - a list of handles, passed through.

use std::fmt;
use std::rc::Rc;

use crate::error::ScopeError;

/// A live view target.
pub trait Target {
    /// Replace the displayed text. `None` displays nothing.
    fn set_text_content(&self, text: Option<&str>);

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);
}

/// Shared handle to a view target.
pub type TargetRef = Rc<dyn Target>;

/// The root that query descriptors are resolved against.
///
/// A whole document, a subtree, or an isolated fragment all qualify; the
/// engine treats the scope opaquely.
pub trait Scope {
    /// Every target matching `query`, in document order.
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError>;
}

impl<S: Scope + ?Sized> Scope for Rc<S> {
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        (**self).query_all(query)
    }
}

/// Scope used when none is configured: every query matches nothing.
///
/// Handle descriptors still resolve, since they bypass the scope.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedScope;

impl Scope for DetachedScope {
    fn query_all(&self, _query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        Ok(Vec::new())
    }
}

/// Identifies the target(s) of a binding.
#[derive(Clone)]
pub enum TargetDescriptor {
    Query(String),
    Handle(TargetRef),
    Handles(Vec<TargetRef>),
}

impl fmt::Debug for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => f.debug_tuple("Query").field(query).finish(),
            Self::Handle(_) => f.write_str("Handle"),
            Self::Handles(handles) => write!(f, "Handles({})", handles.len()),
        }
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query(query) => write!(f, "'{query}'"),
            Self::Handle(_) => f.write_str("<handle>"),
            Self::Handles(handles) => write!(f, "<{} handles>", handles.len()),
        }
    }
}

impl From<&str> for TargetDescriptor {
    fn from(query: &str) -> Self {
        Self::Query(query.to_owned())
    }
}

impl From<String> for TargetDescriptor {
    fn from(query: String) -> Self {
        Self::Query(query)
    }
}

impl From<TargetRef> for TargetDescriptor {
    fn from(handle: TargetRef) -> Self {
        Self::Handle(handle)
    }
}

impl From<Vec<TargetRef>> for TargetDescriptor {
    fn from(handles: Vec<TargetRef>) -> Self {
        Self::Handles(handles)
    }
}

/// Resolve `descriptor` to concrete targets.
pub fn resolve_targets(
    scope: &dyn Scope,
    descriptor: &TargetDescriptor,
) -> Result<Vec<TargetRef>, ScopeError> {
    match descriptor {
        TargetDescriptor::Query(query) => scope.query_all(query),
        TargetDescriptor::Handle(handle) => Ok(vec![Rc::clone(handle)]),
        TargetDescriptor::Handles(handles) => Ok(handles.clone()),
    }
}

/// Where a derived value lands on its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Textual content.
    Text,
    /// The named attribute; absence removes it.
    Attribute(String),
}

/// A target descriptor plus an optional attribute name.
///
/// A bare descriptor converts into text placement; use
/// [`BindTarget::attribute`] for attribute placement.
#[derive(Clone, Debug)]
pub struct BindTarget {
    descriptor: TargetDescriptor,
    placement: Placement,
}

impl BindTarget {
    /// Bind the textual content of `descriptor`.
    pub fn text(descriptor: impl Into<TargetDescriptor>) -> Self {
        Self {
            descriptor: descriptor.into(),
            placement: Placement::Text,
        }
    }

    /// Bind attribute `name` of `descriptor`.
    pub fn attribute(descriptor: impl Into<TargetDescriptor>, name: impl Into<String>) -> Self {
        Self {
            descriptor: descriptor.into(),
            placement: Placement::Attribute(name.into()),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> &TargetDescriptor {
        &self.descriptor
    }

    #[must_use]
    pub fn placement(&self) -> &Placement {
        &self.placement
    }
}

impl From<TargetDescriptor> for BindTarget {
    fn from(descriptor: TargetDescriptor) -> Self {
        Self::text(descriptor)
    }
}

impl From<&str> for BindTarget {
    fn from(query: &str) -> Self {
        Self::text(query)
    }
}

impl From<String> for BindTarget {
    fn from(query: String) -> Self {
        Self::text(query)
    }
}

impl From<TargetRef> for BindTarget {
    fn from(handle: TargetRef) -> Self {
        Self::text(handle)
    }
}

impl From<Vec<TargetRef>> for BindTarget {
    fn from(handles: Vec<TargetRef>) -> Self {
        Self::text(handles)
    }
}
