#![forbid(unsafe_code)]

//! Plugs the document model into the binding engine.
//!
//! [`Element`] is a [`Target`]; [`Document`], [`Element`] and [`ShadowRoot`]
//! are [`Scope`]s. Elements and node lists convert directly into target
//! descriptors, so they can be handed to `Engine::register` as-is.

use std::rc::Rc;

use proxyland_core::{BindTarget, Scope, ScopeError, Target, TargetDescriptor, TargetRef};

use crate::document::Document;
use crate::error::SelectorError;
use crate::node::{Element, NodeList, ShadowRoot};

impl Target for Element {
    fn set_text_content(&self, text: Option<&str>) {
        Element::set_text_content(self, text);
    }

    fn set_attribute(&self, name: &str, value: &str) {
        Element::set_attribute(self, name, value);
    }

    fn remove_attribute(&self, name: &str) {
        Element::remove_attribute(self, name);
    }
}

fn to_targets(
    query: &str,
    found: Result<NodeList, SelectorError>,
) -> Result<Vec<TargetRef>, ScopeError> {
    let found = found.map_err(|err| ScopeError::InvalidQuery {
        query: query.to_owned(),
        reason: err.to_string(),
    })?;
    #[cfg(feature = "tracing")]
    tracing::trace!(message = "scope.query", query, matches = found.len());
    Ok(found
        .into_iter()
        .map(|element| Rc::new(element) as TargetRef)
        .collect())
}

impl Scope for Document {
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        to_targets(query, self.query_selector_all(query))
    }
}

/// Queries run over the element's descendants.
impl Scope for Element {
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        to_targets(query, self.query_selector_all(query))
    }
}

impl Scope for ShadowRoot {
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        to_targets(query, self.query_selector_all(query))
    }
}

impl From<Element> for TargetDescriptor {
    fn from(element: Element) -> Self {
        Self::Handle(Rc::new(element))
    }
}

impl From<&Element> for TargetDescriptor {
    fn from(element: &Element) -> Self {
        Self::from(element.clone())
    }
}

impl From<NodeList> for TargetDescriptor {
    fn from(list: NodeList) -> Self {
        Self::Handles(
            list.into_iter()
                .map(|element| Rc::new(element) as TargetRef)
                .collect(),
        )
    }
}

impl From<Element> for BindTarget {
    fn from(element: Element) -> Self {
        Self::text(element)
    }
}

impl From<&Element> for BindTarget {
    fn from(element: &Element) -> Self {
        Self::text(element)
    }
}

impl From<NodeList> for BindTarget {
    fn from(list: NodeList) -> Self {
        Self::text(list)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxyland_core::{Engine, EngineConfig, resolve_targets};
    use serde_json::json;

    #[test]
    fn element_as_target() {
        let el = Element::new("span");
        let target: TargetRef = Rc::new(el.clone());
        target.set_text_content(Some("hi"));
        target.set_attribute("Title", "t");
        assert_eq!(el.text_content(), "hi");
        assert_eq!(el.get_attribute("title").as_deref(), Some("t"));
        target.remove_attribute("title");
        assert!(!el.has_attribute("title"));
    }

    #[test]
    fn invalid_selector_becomes_scope_error() {
        let doc = Document::new();
        let err = doc.query_all("[").err().unwrap();
        assert!(matches!(err, ScopeError::InvalidQuery { ref query, .. } if query == "["));
    }

    #[test]
    fn node_list_resolves_to_every_element() {
        let doc = Document::from_body_markup("<i></i><i></i><b></b>").unwrap();
        let list = doc.query_selector_all("i").unwrap();
        let descriptor = TargetDescriptor::from(list);
        let resolved = resolve_targets(&proxyland_core::DetachedScope, &descriptor).unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn engine_writes_into_document() {
        let doc = Document::from_body_markup(r#"<p id="out"></p>"#).unwrap();
        let engine = Engine::with_config(
            json!({"n": 1}),
            EngineConfig::default().with_scope(doc.clone()),
        );
        engine.bind_field("#out", "n").unwrap();
        let out = doc.get_element_by_id("out").unwrap();
        assert_eq!(out.text_content(), "1");

        let data = engine.data();
        data.as_map().unwrap().set("n", 2);
        assert_eq!(out.text_content(), "2");
    }

    #[test]
    fn element_scope_is_limited_to_descendants() {
        let doc = Document::from_body_markup(
            r#"<div id="a"><p class="x"></p></div><div id="b"><p class="x"></p></div>"#,
        )
        .unwrap();
        let a = doc.get_element_by_id("a").unwrap();
        assert_eq!(a.query_all(".x").unwrap().len(), 1);
        assert_eq!(doc.query_all(".x").unwrap().len(), 2);
    }
}
