#![forbid(unsafe_code)]

//! The document root.

use crate::error::{DomError, SelectorError};
use crate::node::{Element, Node, NodeList, collect_matches};
use crate::selector::SelectorList;

/// A document: `<html>` holding `<head>` and `<body>`.
///
/// Clones share the same tree.
#[derive(Clone, Debug)]
pub struct Document {
    root: Element,
    head: Element,
    body: Element,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        let root = Element::new("html");
        let head = Element::new("head");
        let body = Element::new("body");
        root.push_node(Node::Element(head.clone()));
        root.push_node(Node::Element(body.clone()));
        Self { root, head, body }
    }

    /// A document whose body holds the parsed `markup`.
    pub fn from_body_markup(markup: &str) -> Result<Self, DomError> {
        let document = Self::new();
        document.body.set_inner_html(markup)?;
        Ok(document)
    }

    /// The `<html>` element.
    #[must_use]
    pub fn document_element(&self) -> &Element {
        &self.root
    }

    #[must_use]
    pub fn head(&self) -> &Element {
        &self.head
    }

    #[must_use]
    pub fn body(&self) -> &Element {
        &self.body
    }

    /// A detached element owned by no one until appended.
    #[must_use]
    pub fn create_element(&self, tag: &str) -> Element {
        Element::new(tag)
    }

    /// First element whose `id` attribute equals `id`, outside shadow trees.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<Element> {
        fn walk(element: &Element, id: &str) -> Option<Element> {
            if element.get_attribute("id").as_deref() == Some(id) {
                return Some(element.clone());
            }
            element.children().iter().find_map(|child| walk(child, id))
        }
        walk(&self.root, id)
    }

    pub fn query_selector(&self, selectors: &str) -> Result<Option<Element>, SelectorError> {
        Ok(self.query_selector_all(selectors)?.into_iter().next())
    }

    /// Every element matching `selectors`, including `<html>` itself.
    pub fn query_selector_all(&self, selectors: &str) -> Result<NodeList, SelectorError> {
        let list = SelectorList::parse(selectors)?;
        let mut out = Vec::new();
        collect_matches(&[Node::Element(self.root.clone())], &list, &mut out);
        Ok(NodeList(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton() {
        let doc = Document::new();
        assert_eq!(doc.document_element().tag_name(), "html");
        assert_eq!(doc.body().parent().as_ref(), Some(doc.document_element()));
        assert_eq!(doc.document_element().children().len(), 2);
    }

    #[test]
    fn query_includes_document_element() {
        let doc = Document::new();
        assert_eq!(doc.query_selector_all("*").unwrap().len(), 3);
        assert_eq!(doc.query_selector_all("html > body").unwrap().len(), 1);
    }

    #[test]
    fn get_element_by_id_skips_shadow_trees() {
        let doc = Document::from_body_markup(r#"<div id="host"></div><p id="x">light</p>"#)
            .unwrap();
        let host = doc.get_element_by_id("host").unwrap();
        host.attach_shadow()
            .set_inner_html(r#"<p id="y">dark</p>"#)
            .unwrap();
        assert_eq!(doc.get_element_by_id("x").unwrap().text_content(), "light");
        assert!(doc.get_element_by_id("y").is_none());
        assert!(doc.query_selector("#y").unwrap().is_none());
    }

    #[test]
    fn created_elements_are_detached_until_appended() {
        let doc = Document::new();
        let el = doc.create_element("span");
        el.set_attribute("id", "late");
        assert!(doc.get_element_by_id("late").is_none());
        doc.body().append_child(&el).unwrap();
        assert_eq!(doc.get_element_by_id("late"), Some(el));
    }

    #[test]
    fn bad_markup_is_reported() {
        assert!(matches!(
            Document::from_body_markup("<div>"),
            Err(DomError::Markup(_))
        ));
    }
}
