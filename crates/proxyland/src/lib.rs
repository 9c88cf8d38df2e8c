#![forbid(unsafe_code)]

//! proxyland public facade crate.
//!
//! Wrap a JSON-like data tree, bind view targets to values derived from it,
//! and every write through the tree updates the view before it returns.
//!
//! ```
//! use proxyland::prelude::*;
//! use serde_json::json;
//!
//! let doc = Document::from_body_markup(r#"<ul><li id="total"></li></ul>"#).unwrap();
//! let engine = Engine::with_config(
//!     json!({"items": [2, 3]}),
//!     EngineConfig::default().with_scope(doc.clone()),
//! );
//! engine
//!     .bind_map("#total", |data| {
//!         data.get("items")
//!             .and_then(|items| items.as_list().map(|l| l.iter().filter_map(|v| v.as_i64()).sum::<i64>()))
//!     })
//!     .unwrap();
//!
//! let items = engine.data().get("items").unwrap();
//! items.as_list().unwrap().push(5);
//! assert_eq!(doc.get_element_by_id("total").unwrap().text_content(), "10");
//! ```

pub use proxyland_core as core;
#[cfg(feature = "dom")]
pub use proxyland_dom as dom;

pub use proxyland_core::{
    BindError, BindTarget, Derivation, Engine, EngineConfig, ObservableList, ObservableMap,
    ReentryPolicy, Scope, ScopeError, Target, TargetDescriptor, Value, wrap,
};

pub mod prelude {
    pub use proxyland_core::{
        BindTarget, Derivation, Engine, EngineConfig, ObservableList, ObservableMap, Scope,
        Target, TargetRef, Value,
    };
    #[cfg(feature = "dom")]
    pub use proxyland_dom::{Document, Element, NodeList, ShadowRoot};
}
