#![forbid(unsafe_code)]

//! Error types for target resolution and binding registration.
//!
//! Derivation failures are not errors here: a derivation that panics unwinds
//! through whichever call triggered the update pass.

use std::fmt;

/// Errors reported by a [`Scope`](crate::scope::Scope) while resolving a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    /// The query string is not understood by the scope.
    InvalidQuery { query: String, reason: String },
    /// The scope's backing document cannot be queried.
    Unavailable(String),
}

impl fmt::Display for ScopeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidQuery { query, reason } => {
                write!(f, "invalid query '{query}': {reason}")
            }
            Self::Unavailable(msg) => write!(f, "scope unavailable: {msg}"),
        }
    }
}

impl std::error::Error for ScopeError {}

/// Errors from registering or updating bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// A binding's target descriptor could not be resolved.
    Resolve {
        descriptor: String,
        source: ScopeError,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve { descriptor, .. } => {
                write!(f, "cannot resolve binding target {descriptor}")
            }
        }
    }
}

impl std::error::Error for BindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resolve { source, .. } => Some(source),
        }
    }
}
