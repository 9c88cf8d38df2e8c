#![forbid(unsafe_code)]

//! Reactive data trees and the binding engine for proxyland.
//!
//! - [`tree`]: observable containers ([`ObservableList`], [`ObservableMap`])
//!   and [`wrap`], which makes any value deeply observable.
//! - [`value`]: the dynamic [`Value`] type stored in a tree.
//! - [`engine`]: the [`Engine`], which owns a wrapped tree and pushes derived
//!   values into view targets on every change.
//! - [`scope`]: the [`Scope`] / [`Target`] capability the engine consumes.
//!
//! # Architecture
//!
//! Single-threaded: containers and the engine use `Rc<RefCell<..>>`. A tree
//! signals through one shared [`Notifier`]; the engine's notifier holds a
//! `Weak` link back to the engine, so the tree never keeps the engine alive.
//!
//! Every write synchronously runs one full update pass before returning.
//! There is no batching and no dependency tracking: each pass re-evaluates
//! every binding.

pub mod config;
pub mod engine;
pub mod error;
pub mod scope;
pub mod tree;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{EngineConfig, ReentryPolicy};
pub use engine::{BindingId, Derivation, Engine};
pub use error::{BindError, ScopeError};
pub use scope::{
    BindTarget, DetachedScope, Placement, Scope, Target, TargetDescriptor, TargetRef,
    resolve_targets,
};
pub use tree::{Notifier, ObservableList, ObservableMap, wrap};
pub use value::Value;
