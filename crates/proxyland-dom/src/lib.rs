#![forbid(unsafe_code)]

//! In-memory document model for proxyland.
//!
//! A small, strict document tree that implements the binding engine's
//! [`Target`](proxyland_core::Target) and [`Scope`](proxyland_core::Scope)
//! capabilities. It is enough to drive bindings in tests and headless tools:
//!
//! - [`Document`], [`Element`], [`ShadowRoot`] and text nodes
//! - CSS selector subset ([`selector`]) for `query_selector(_all)`
//! - fragment markup ([`markup`]) for `set_inner_html`
//!
//! # Example
//!
//! ```
//! use proxyland_core::{Engine, EngineConfig};
//! use proxyland_dom::Document;
//! use serde_json::json;
//!
//! let doc = Document::from_body_markup(r#"<span class="count"></span>"#).unwrap();
//! let engine = Engine::with_config(json!({"count": 3}), EngineConfig::default().with_scope(doc.clone()));
//! engine.bind_field(".count", "count").unwrap();
//! assert_eq!(doc.body().inner_html(), r#"<span class="count">3</span>"#);
//! ```

mod binding;
pub mod document;
pub mod error;
pub mod markup;
pub mod node;
pub mod selector;

pub use document::Document;
pub use error::{DomError, MarkupError, MarkupErrorKind, SelectorError, SelectorErrorKind};
pub use node::{Element, Node, NodeList, ShadowRoot, Text};
pub use selector::SelectorList;
