#![forbid(unsafe_code)]

//! Elements, text nodes and shadow roots.
//!
//! Nodes are `Rc` handles; clones refer to the same node. Children are owned
//! by their parent, and the parent link is `Weak`, so dropping a detached
//! subtree frees it.
//!
//! A [`ShadowRoot`] is an isolated fragment hanging off its host element. It
//! is not one of the host's children: queries from the host's side never see
//! into it, and selectors matched inside it stop at the shadow boundary.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{DomError, SelectorError};
use crate::markup;
use crate::selector::SelectorList;

/// Elements that never have children or a closing tag.
pub(crate) const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

pub(crate) fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Clone, Default)]
enum ParentLink {
    #[default]
    None,
    Element(Weak<ElementData>),
    Shadow(Weak<ShadowData>),
}

pub(crate) struct ElementData {
    tag: String,
    attributes: RefCell<BTreeMap<String, String>>,
    children: RefCell<Vec<Node>>,
    parent: RefCell<ParentLink>,
    shadow: RefCell<Option<ShadowRoot>>,
}

pub(crate) struct ShadowData {
    children: RefCell<Vec<Node>>,
    host: Weak<ElementData>,
}

/// A child of an element or shadow root.
#[derive(Clone)]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    fn is_element(&self, other: &Element) -> bool {
        self.as_element().is_some_and(|el| el.ptr_eq(other))
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Element(element) => {
                for child in element.data.children.borrow().iter() {
                    child.collect_text(out);
                }
            }
            Self::Text(text) => out.push_str(&text.content.borrow()),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(element) => element.fmt(f),
            Self::Text(text) => text.fmt(f),
        }
    }
}

/// A text node.
#[derive(Clone)]
pub struct Text {
    content: Rc<RefCell<String>>,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: Rc::new(RefCell::new(content.into())),
        }
    }

    #[must_use]
    pub fn content(&self) -> String {
        self.content.borrow().clone()
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Text").field(&*self.content.borrow()).finish()
    }
}

/// An element node.
#[derive(Clone)]
pub struct Element {
    data: Rc<ElementData>,
}

impl Element {
    /// A detached element. The tag name is lowercased.
    pub fn new(tag: &str) -> Self {
        Self {
            data: Rc::new(ElementData {
                tag: tag.to_ascii_lowercase(),
                attributes: RefCell::new(BTreeMap::new()),
                children: RefCell::new(Vec::new()),
                parent: RefCell::new(ParentLink::None),
                shadow: RefCell::new(None),
            }),
        }
    }

    /// Whether both handles refer to the same element.
    #[must_use]
    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.data.tag
    }

    #[must_use]
    pub fn id(&self) -> Option<String> {
        self.get_attribute("id")
    }

    /// The whitespace-separated entries of the `class` attribute.
    #[must_use]
    pub fn class_list(&self) -> Vec<String> {
        self.data
            .attributes
            .borrow()
            .get("class")
            .map(|classes| classes.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.data
            .attributes
            .borrow()
            .get("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Attribute names are case-insensitive.
    #[must_use]
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.data
            .attributes
            .borrow()
            .get(&name.to_ascii_lowercase())
            .cloned()
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.data
            .attributes
            .borrow()
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.data
            .attributes
            .borrow_mut()
            .insert(name.to_ascii_lowercase(), value.to_owned());
    }

    pub fn remove_attribute(&self, name: &str) {
        self.data
            .attributes
            .borrow_mut()
            .remove(&name.to_ascii_lowercase());
    }

    /// Attributes in name order.
    #[must_use]
    pub fn attributes(&self) -> Vec<(String, String)> {
        self.data
            .attributes
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Concatenated text of all descendant text nodes. Shadow trees are not
    /// included.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in self.data.children.borrow().iter() {
            child.collect_text(&mut out);
        }
        out
    }

    /// Replace all children with a single text node. `None` or an empty
    /// string leaves the element empty.
    pub fn set_text_content(&self, text: Option<&str>) {
        let nodes = match text {
            Some(text) if !text.is_empty() => vec![Node::Text(Text::new(text))],
            _ => Vec::new(),
        };
        self.replace_children(nodes);
    }

    #[must_use]
    pub fn child_nodes(&self) -> Vec<Node> {
        self.data.children.borrow().clone()
    }

    /// Element children only.
    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.data
            .children
            .borrow()
            .iter()
            .filter_map(|node| node.as_element().cloned())
            .collect()
    }

    /// The parent element. `None` for a detached element, a document root,
    /// or a top-level child of a shadow root.
    #[must_use]
    pub fn parent(&self) -> Option<Element> {
        match &*self.data.parent.borrow() {
            ParentLink::Element(weak) => weak.upgrade().map(|data| Element { data }),
            ParentLink::None | ParentLink::Shadow(_) => None,
        }
    }

    /// The shadow root containing this element, if any.
    #[must_use]
    pub fn containing_shadow_root(&self) -> Option<ShadowRoot> {
        let mut current = self.clone();
        loop {
            let link = current.data.parent.borrow().clone();
            match link {
                ParentLink::Element(weak) => match weak.upgrade() {
                    Some(data) => current = Element { data },
                    None => return None,
                },
                ParentLink::Shadow(weak) => return weak.upgrade().map(|data| ShadowRoot { data }),
                ParentLink::None => return None,
            }
        }
    }

    /// Move `child` to the end of this element's children, detaching it from
    /// wherever it was.
    pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
        if child.is_inclusive_ancestor_of(self) {
            return Err(DomError::HierarchyRequest);
        }
        child.remove();
        *child.data.parent.borrow_mut() = ParentLink::Element(Rc::downgrade(&self.data));
        self.data
            .children
            .borrow_mut()
            .push(Node::Element(child.clone()));
        Ok(())
    }

    pub fn append_text(&self, text: &str) {
        self.data
            .children
            .borrow_mut()
            .push(Node::Text(Text::new(text)));
    }

    /// Append a freshly built node. The node must not have a parent yet.
    pub(crate) fn push_node(&self, node: Node) {
        if let Node::Element(element) = &node {
            *element.data.parent.borrow_mut() = ParentLink::Element(Rc::downgrade(&self.data));
        }
        self.data.children.borrow_mut().push(node);
    }

    /// Detach this element from its parent. No-op when already detached.
    pub fn remove(&self) {
        let link = std::mem::take(&mut *self.data.parent.borrow_mut());
        let parent: Option<Rc<dyn HasChildren>> = match &link {
            ParentLink::Element(weak) => weak.upgrade().map(|p| p as Rc<dyn HasChildren>),
            ParentLink::Shadow(weak) => weak.upgrade().map(|s| s as Rc<dyn HasChildren>),
            ParentLink::None => None,
        };
        if let Some(parent) = parent {
            parent.children().borrow_mut().retain(|node| !node.is_element(self));
        }
    }

    /// Replace the children with the parsed `markup`.
    pub fn set_inner_html(&self, markup: &str) -> Result<(), DomError> {
        let nodes = markup::parse_fragment(markup)?;
        self.replace_children(nodes);
        Ok(())
    }

    /// Serialized children.
    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.data.children.borrow().iter() {
            markup::serialize(child, &mut out);
        }
        out
    }

    #[must_use]
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        markup::serialize(&Node::Element(self.clone()), &mut out);
        out
    }

    /// Attach an empty shadow root, or return the existing one.
    pub fn attach_shadow(&self) -> ShadowRoot {
        if let Some(existing) = self.shadow_root() {
            return existing;
        }
        let root = ShadowRoot {
            data: Rc::new(ShadowData {
                children: RefCell::new(Vec::new()),
                host: Rc::downgrade(&self.data),
            }),
        };
        *self.data.shadow.borrow_mut() = Some(root.clone());
        root
    }

    #[must_use]
    pub fn shadow_root(&self) -> Option<ShadowRoot> {
        self.data.shadow.borrow().clone()
    }

    /// First descendant matching `selectors`, in document order.
    pub fn query_selector(&self, selectors: &str) -> Result<Option<Element>, SelectorError> {
        Ok(self.query_selector_all(selectors)?.into_iter().next())
    }

    /// Every descendant matching `selectors`, in document order.
    pub fn query_selector_all(&self, selectors: &str) -> Result<NodeList, SelectorError> {
        let list = SelectorList::parse(selectors)?;
        let mut out = Vec::new();
        collect_matches(&self.data.children.borrow(), &list, &mut out);
        Ok(NodeList(out))
    }

    /// Whether this element matches `selectors`.
    pub fn matches(&self, selectors: &str) -> Result<bool, SelectorError> {
        Ok(SelectorList::parse(selectors)?.matches(self))
    }

    /// The parent element or, at the top of a shadow tree, its host.
    fn composed_parent(&self) -> Option<Element> {
        match &*self.data.parent.borrow() {
            ParentLink::Element(weak) => weak.upgrade().map(|data| Element { data }),
            ParentLink::Shadow(weak) => weak
                .upgrade()
                .and_then(|shadow| shadow.host.upgrade())
                .map(|data| Element { data }),
            ParentLink::None => None,
        }
    }

    fn is_inclusive_ancestor_of(&self, other: &Element) -> bool {
        let mut current = Some(other.clone());
        while let Some(node) = current {
            if node.ptr_eq(self) {
                return true;
            }
            current = node.composed_parent();
        }
        false
    }

    fn replace_children(&self, nodes: Vec<Node>) {
        let old = std::mem::take(&mut *self.data.children.borrow_mut());
        for node in &old {
            if let Node::Element(element) = node {
                *element.data.parent.borrow_mut() = ParentLink::None;
            }
        }
        for node in &nodes {
            if let Node::Element(element) = node {
                *element.data.parent.borrow_mut() = ParentLink::Element(Rc::downgrade(&self.data));
            }
        }
        *self.data.children.borrow_mut() = nodes;
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.data.tag)?;
        for (name, value) in self.data.attributes.borrow().iter() {
            write!(f, " {name}=\"{value}\"")?;
        }
        f.write_str(">")
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

trait HasChildren {
    fn children(&self) -> &RefCell<Vec<Node>>;
}

impl HasChildren for ElementData {
    fn children(&self) -> &RefCell<Vec<Node>> {
        &self.children
    }
}

impl HasChildren for ShadowData {
    fn children(&self) -> &RefCell<Vec<Node>> {
        &self.children
    }
}

pub(crate) fn collect_matches(nodes: &[Node], list: &SelectorList, out: &mut Vec<Element>) {
    for node in nodes {
        if let Node::Element(element) = node {
            if list.matches(element) {
                out.push(element.clone());
            }
            collect_matches(&element.data.children.borrow(), list, out);
        }
    }
}

/// An isolated fragment attached to a host element.
#[derive(Clone)]
pub struct ShadowRoot {
    data: Rc<ShadowData>,
}

impl ShadowRoot {
    #[must_use]
    pub fn ptr_eq(&self, other: &ShadowRoot) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }

    #[must_use]
    pub fn host(&self) -> Option<Element> {
        self.data.host.upgrade().map(|data| Element { data })
    }

    #[must_use]
    pub fn children(&self) -> Vec<Element> {
        self.data
            .children
            .borrow()
            .iter()
            .filter_map(|node| node.as_element().cloned())
            .collect()
    }

    /// First element child.
    #[must_use]
    pub fn first_child(&self) -> Option<Element> {
        self.data
            .children
            .borrow()
            .iter()
            .find_map(|node| node.as_element().cloned())
    }

    pub fn append_child(&self, child: &Element) -> Result<(), DomError> {
        if let Some(host) = self.host() {
            if child.is_inclusive_ancestor_of(&host) {
                return Err(DomError::HierarchyRequest);
            }
        }
        child.remove();
        *child.data.parent.borrow_mut() = ParentLink::Shadow(Rc::downgrade(&self.data));
        self.data
            .children
            .borrow_mut()
            .push(Node::Element(child.clone()));
        Ok(())
    }

    /// Replace the fragment's content with the parsed `markup`.
    pub fn set_inner_html(&self, markup: &str) -> Result<(), DomError> {
        let nodes = markup::parse_fragment(markup)?;
        let old = std::mem::take(&mut *self.data.children.borrow_mut());
        for node in &old {
            if let Node::Element(element) = node {
                *element.data.parent.borrow_mut() = ParentLink::None;
            }
        }
        for node in &nodes {
            if let Node::Element(element) = node {
                *element.data.parent.borrow_mut() = ParentLink::Shadow(Rc::downgrade(&self.data));
            }
        }
        *self.data.children.borrow_mut() = nodes;
        Ok(())
    }

    #[must_use]
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in self.data.children.borrow().iter() {
            markup::serialize(child, &mut out);
        }
        out
    }

    pub fn query_selector(&self, selectors: &str) -> Result<Option<Element>, SelectorError> {
        Ok(self.query_selector_all(selectors)?.into_iter().next())
    }

    pub fn query_selector_all(&self, selectors: &str) -> Result<NodeList, SelectorError> {
        let list = SelectorList::parse(selectors)?;
        let mut out = Vec::new();
        collect_matches(&self.data.children.borrow(), &list, &mut out);
        Ok(NodeList(out))
    }
}

impl fmt::Debug for ShadowRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShadowRoot")
            .field("host", &self.host())
            .finish_non_exhaustive()
    }
}

/// An ordered list of elements, as returned by `query_selector_all`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeList(pub Vec<Element>);

impl NodeList {
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Element> {
        self.0.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.0.iter()
    }
}

impl IntoIterator for NodeList {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeList {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<Element> for NodeList {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Element>> for NodeList {
    fn from(elements: Vec<Element>) -> Self {
        Self(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> Element {
        let root = Element::new("div");
        root.set_inner_html(r#"<p id="a" class="x y">one</p><p class="y">two<b>!</b></p>"#)
            .unwrap();
        root
    }

    #[test]
    fn tag_and_attribute_names_are_lowercased() {
        let el = Element::new("SPAN");
        el.set_attribute("Data-Test", "1");
        assert_eq!(el.tag_name(), "span");
        assert_eq!(el.get_attribute("data-test").as_deref(), Some("1"));
        assert!(el.has_attribute("DATA-TEST"));
        el.remove_attribute("data-TEST");
        assert!(!el.has_attribute("data-test"));
    }

    #[test]
    fn class_list_splits_whitespace() {
        let el = Element::new("div");
        el.set_attribute("class", "  a\tb  c ");
        assert_eq!(el.class_list(), vec!["a", "b", "c"]);
        assert!(el.has_class("b"));
        assert!(!el.has_class("d"));
    }

    #[test]
    fn text_content_concatenates_descendants() {
        assert_eq!(tree().text_content(), "onetwo!");
    }

    #[test]
    fn set_text_content_replaces_children() {
        let root = tree();
        let first = root.children()[0].clone();
        root.set_text_content(Some("plain"));
        assert_eq!(root.text_content(), "plain");
        assert!(root.children().is_empty());
        assert!(first.parent().is_none());

        root.set_text_content(None);
        assert_eq!(root.text_content(), "");
        assert!(root.child_nodes().is_empty());
    }

    #[test]
    fn append_child_moves_between_parents() {
        let a = Element::new("div");
        let b = Element::new("div");
        let child = Element::new("span");
        a.append_child(&child).unwrap();
        b.append_child(&child).unwrap();
        assert!(a.children().is_empty());
        assert_eq!(b.children(), vec![child.clone()]);
        assert_eq!(child.parent(), Some(b));
    }

    #[test]
    fn append_child_rejects_cycles() {
        let outer = Element::new("div");
        let inner = Element::new("div");
        outer.append_child(&inner).unwrap();
        assert_eq!(inner.append_child(&outer), Err(DomError::HierarchyRequest));
        assert_eq!(outer.append_child(&outer), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn shadow_root_append_rejects_host() {
        let host = Element::new("x-widget");
        let shadow = host.attach_shadow();
        assert_eq!(shadow.append_child(&host), Err(DomError::HierarchyRequest));
    }

    #[test]
    fn remove_detaches() {
        let root = tree();
        let first = root.children()[0].clone();
        first.remove();
        assert_eq!(root.children().len(), 1);
        assert!(first.parent().is_none());
        first.remove();
    }

    #[test]
    fn attach_shadow_is_idempotent() {
        let host = Element::new("x-widget");
        let a = host.attach_shadow();
        let b = host.attach_shadow();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.host(), Some(host));
    }

    #[test]
    fn shadow_content_is_hidden_from_host_queries() {
        let host = Element::new("div");
        host.set_inner_html("<span>light</span>").unwrap();
        let shadow = host.attach_shadow();
        shadow.set_inner_html("<span>dark</span>").unwrap();

        let spans = host.query_selector_all("span").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans.get(0).unwrap().text_content(), "light");
        assert_eq!(host.text_content(), "light");

        let inside = shadow.query_selector("span").unwrap().unwrap();
        assert_eq!(inside.text_content(), "dark");
        assert!(inside.parent().is_none());
        assert!(inside.containing_shadow_root().unwrap().ptr_eq(&shadow));
    }

    #[test]
    fn query_selector_returns_first_in_document_order() {
        let root = tree();
        let first = root.query_selector(".y").unwrap().unwrap();
        assert_eq!(first.id().as_deref(), Some("a"));
        assert!(root.query_selector("table").unwrap().is_none());
    }

    #[test]
    fn query_excludes_the_element_itself() {
        let root = tree();
        root.set_attribute("class", "y");
        assert_eq!(root.query_selector_all(".y").unwrap().len(), 2);
    }

    #[test]
    fn invalid_selector_is_an_error() {
        assert!(tree().query_selector_all("p[").is_err());
    }

    #[test]
    fn inner_html_serializes_children() {
        let root = Element::new("div");
        root.set_inner_html(r#"<input type="text"><i>a &amp; b</i>"#)
            .unwrap();
        assert_eq!(root.inner_html(), r#"<input type="text"><i>a &amp; b</i>"#);
        assert_eq!(
            root.outer_html(),
            r#"<div><input type="text"><i>a &amp; b</i></div>"#
        );
    }

    #[test]
    fn dropped_parent_leaves_child_detached() {
        let child = Element::new("span");
        {
            let parent = Element::new("div");
            parent.append_child(&child).unwrap();
        }
        assert!(child.parent().is_none());
    }
}
