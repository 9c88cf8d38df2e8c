#![forbid(unsafe_code)]

//! Deep reactive wrapping of data trees.
//!
//! Every structured node of a tree is an observable container:
//! [`ObservableList`] for ordered sequences and [`ObservableMap`] for keyed
//! structures. Each container carries the [`Notifier`] of the tree it belongs
//! to. Every write goes through a container method, which wraps the incoming
//! value, stores it, releases its borrow and then fires the notifier once.
//!
//! # Wrapping and adoption
//!
//! [`wrap`] is applied eagerly at construction and at every assignment
//! boundary. Scalars pass through. Detached containers are *adopted*: their
//! notifier is rebound, recursively, to the tree's notifier. Adoption keeps
//! identity, so a handle captured before assignment keeps observing the same
//! node. A container still owned by another tree is never taken from it: the
//! receiving tree stores a deep copy, and both trees keep observing their own
//! nodes.
//!
//! # Invariants
//!
//! 1. Every container reachable from a wrapped root carries the root's
//!    notifier.
//! 2. Each mutating call fires exactly once, after the mutation completes and
//!    with no container borrow held.
//! 3. `Null` stored as an element or field is kept as `Null`.
//! 4. Reads never fire.
//!
//! # Failure Modes
//!
//! - Calling a mutating method from inside [`ObservableList::with`] or
//!   [`ObservableMap::with`] on the same container panics (`RefCell` borrow).
//! - Cyclic structures are accepted by writes but snapshots (`to_json`,
//!   `Debug`, equality) and copies out of another tree recurse without bound.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::value::Value;

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Change callback shared by every container of one tree.
///
/// A detached notifier does nothing when fired. Two notifiers are the same
/// when they share the same callback allocation.
#[derive(Clone, Default)]
pub struct Notifier {
    callback: Option<Rc<dyn Fn()>>,
}

impl Notifier {
    /// Create a notifier firing `callback`.
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            callback: Some(Rc::new(callback)),
        }
    }

    /// A notifier bound to nothing.
    #[must_use]
    pub fn detached() -> Self {
        Self { callback: None }
    }

    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.callback.is_none()
    }

    /// Whether both handles share one callback (or both are detached).
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        match (&self.callback, &other.callback) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    /// Fire the callback.
    pub fn notify(&self) {
        if let Some(callback) = &self.callback {
            callback();
        }
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("detached", &self.is_detached())
            .finish()
    }
}

/// Make `value` observable under `notifier`.
///
/// Scalars are returned unchanged. Containers (including containers freshly
/// built from raw `serde_json` input) are adopted into `notifier`.
pub fn wrap(value: impl Into<Value>, notifier: &Notifier) -> Value {
    adopt(value.into(), notifier)
}

/// Bind every container reachable from `value` to `notifier`, copying the
/// ones another tree owns.
///
/// Adoption into a detached notifier leaves attached nodes alone, so building
/// a detached subtree out of live nodes does not unhook them from their tree.
fn adopt(value: Value, notifier: &Notifier) -> Value {
    if notifier.is_detached() {
        return value;
    }
    match value {
        Value::List(list) => Value::List(list.adopted(notifier)),
        Value::Map(map) => Value::Map(map.adopted(notifier)),
        scalar => scalar,
    }
}

/// Detach every container reachable from `value` that is bound to `notifier`.
pub(crate) fn release(value: &Value, notifier: &Notifier) {
    match value {
        Value::List(list) => {
            if !list.node.notifier.borrow().same(notifier) || notifier.is_detached() {
                return;
            }
            *list.node.notifier.borrow_mut() = Notifier::detached();
            for item in list.node.items.borrow().iter() {
                release(item, notifier);
            }
        }
        Value::Map(map) => {
            if !map.node.notifier.borrow().same(notifier) || notifier.is_detached() {
                return;
            }
            *map.node.notifier.borrow_mut() = Notifier::detached();
            for field in map.node.fields.borrow().values() {
                release(field, notifier);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// ObservableList
// ---------------------------------------------------------------------------

struct ListNode {
    items: RefCell<Vec<Value>>,
    notifier: RefCell<Notifier>,
}

/// An observable ordered sequence.
///
/// Cloning creates a new handle to the **same** node.
///
/// The mutating operations mirror the in-place array operations of dynamic
/// languages: [`push`](Self::push), [`pop`](Self::pop),
/// [`shift`](Self::shift), [`unshift`](Self::unshift),
/// [`splice`](Self::splice), plus positional [`set`](Self::set). Each returns
/// what the plain operation returns and fires once afterwards.
#[derive(Clone)]
pub struct ObservableList {
    node: Rc<ListNode>,
}

impl ObservableList {
    /// Create an empty, detached list.
    #[must_use]
    pub fn new() -> Self {
        Self::from_values(Vec::<Value>::new())
    }

    /// Create a detached list holding `values`.
    pub fn from_values<T: Into<Value>>(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            node: Rc::new(ListNode {
                items: RefCell::new(values.into_iter().map(Into::into).collect()),
                notifier: RefCell::new(Notifier::detached()),
            }),
        }
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Whether this list is attached to a tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.node.notifier.borrow().is_detached()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.items.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.items.borrow().is_empty()
    }

    /// Element at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.node.items.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn first(&self) -> Option<Value> {
        self.node.items.borrow().first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<Value> {
        self.node.items.borrow().last().cloned()
    }

    /// Whether an element structurally equals `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.node.items.borrow().iter().any(|item| item == value)
    }

    /// Shallow snapshot of the elements.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.node.items.borrow().clone()
    }

    /// Iterate over a shallow snapshot of the elements.
    pub fn iter(&self) -> std::vec::IntoIter<Value> {
        self.to_vec().into_iter()
    }

    /// Borrow the elements for the duration of `f`.
    ///
    /// `f` must not mutate this list.
    pub fn with<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.node.items.borrow())
    }

    /// Join the canonical text of every element with `separator`.
    ///
    /// `Null` elements contribute an empty string.
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.with(|items| {
            items
                .iter()
                .map(|item| item.to_text().unwrap_or_default())
                .collect::<Vec<_>>()
                .join(separator)
        })
    }

    /// Deep snapshot into a `serde_json` array.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.with(|items| serde_json::Value::Array(items.iter().map(Value::to_json).collect()))
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// Writing past the end pads the gap with `Null`.
    ///
    /// # Panics
    ///
    /// Panics, without modifying the list or signalling, when the padding up
    /// to `index` cannot be allocated (for example `usize::MAX`).
    pub fn set(&self, index: usize, value: impl Into<Value>) -> Option<Value> {
        let value = self.incoming(value);
        let previous = {
            let mut items = self.node.items.borrow_mut();
            if index < items.len() {
                Some(std::mem::replace(&mut items[index], value))
            } else {
                let grow = (index - items.len()).checked_add(1);
                if grow.is_none_or(|grow| items.try_reserve(grow).is_err()) {
                    drop(items);
                    panic!("cannot pad list of length {} to index {index}", self.len());
                }
                items.resize(index, Value::Null);
                items.push(value);
                None
            }
        };
        self.fire();
        previous
    }

    /// Append one element. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        let value = self.incoming(value);
        let len = {
            let mut items = self.node.items.borrow_mut();
            items.push(value);
            items.len()
        };
        self.fire();
        len
    }

    /// Remove and return the last element.
    ///
    /// Fires even when the list is empty.
    pub fn pop(&self) -> Option<Value> {
        let popped = self.node.items.borrow_mut().pop();
        self.fire();
        popped
    }

    /// Remove and return the first element.
    ///
    /// Fires even when the list is empty.
    pub fn shift(&self) -> Option<Value> {
        let shifted = {
            let mut items = self.node.items.borrow_mut();
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        };
        self.fire();
        shifted
    }

    /// Insert `values` at the front, keeping their order. Returns the new
    /// length.
    pub fn unshift<T: Into<Value>>(&self, values: impl IntoIterator<Item = T>) -> usize {
        let mut incoming: Vec<Value> = values.into_iter().map(|v| self.incoming(v)).collect();
        let len = {
            let mut items = self.node.items.borrow_mut();
            incoming.append(&mut items);
            *items = incoming;
            items.len()
        };
        self.fire();
        len
    }

    /// Remove `delete_count` elements starting at `start`, insert `items`
    /// there, and return the removed elements.
    ///
    /// `start` clamps to the length; `delete_count` clamps to the elements
    /// remaining after `start`.
    pub fn splice<T: Into<Value>>(
        &self,
        start: usize,
        delete_count: usize,
        items: impl IntoIterator<Item = T>,
    ) -> Vec<Value> {
        let incoming: Vec<Value> = items.into_iter().map(|v| self.incoming(v)).collect();
        let removed = {
            let mut current = self.node.items.borrow_mut();
            let start = start.min(current.len());
            let end = start + delete_count.min(current.len() - start);
            current.splice(start..end, incoming).collect::<Vec<_>>()
        };
        self.fire();
        removed
    }

    fn incoming(&self, value: impl Into<Value>) -> Value {
        let notifier = self.node.notifier.borrow().clone();
        wrap(value, &notifier)
    }

    fn fire(&self) {
        // Clone first: the callback may rebind notifiers.
        let notifier = self.node.notifier.borrow().clone();
        notifier.notify();
    }

    fn adopted(self, notifier: &Notifier) -> Self {
        let current = self.node.notifier.borrow().clone();
        if current.same(notifier) {
            return self;
        }
        if !current.is_detached() {
            // Owned by another tree: that tree keeps the node.
            return Self::from_values(self.to_vec()).adopted(notifier);
        }
        *self.node.notifier.borrow_mut() = notifier.clone();
        for item in self.node.items.borrow_mut().iter_mut() {
            *item = adopt(std::mem::take(item), notifier);
        }
        self
    }
}

impl Default for ObservableList {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObservableList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.with(|a| other.with(|b| a == b))
    }
}

impl fmt::Debug for ObservableList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|items| f.debug_list().entries(items.iter()).finish())
    }
}

impl IntoIterator for &ObservableList {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// ObservableMap
// ---------------------------------------------------------------------------

struct MapNode {
    fields: RefCell<BTreeMap<String, Value>>,
    notifier: RefCell<Notifier>,
}

/// An observable keyed structure.
///
/// Cloning creates a new handle to the **same** node. Field order carries no
/// meaning; iteration and snapshots are sorted by key.
#[derive(Clone)]
pub struct ObservableMap {
    node: Rc<MapNode>,
}

impl ObservableMap {
    /// Create an empty, detached map.
    #[must_use]
    pub fn new() -> Self {
        Self::from_entries(Vec::<(String, Value)>::new())
    }

    /// Create a detached map holding `entries`.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Self {
            node: Rc::new(MapNode {
                fields: RefCell::new(
                    entries
                        .into_iter()
                        .map(|(k, v)| (k.into(), v.into()))
                        .collect(),
                ),
                notifier: RefCell::new(Notifier::detached()),
            }),
        }
    }

    /// Whether both handles refer to the same node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Whether this map is attached to a tree.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.node.notifier.borrow().is_detached()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.node.fields.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.node.fields.borrow().is_empty()
    }

    /// Value of field `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.node.fields.borrow().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.node.fields.borrow().contains_key(key)
    }

    /// Sorted field names.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.node.fields.borrow().keys().cloned().collect()
    }

    /// Borrow the fields for the duration of `f`.
    ///
    /// `f` must not mutate this map.
    pub fn with<R>(&self, f: impl FnOnce(&BTreeMap<String, Value>) -> R) -> R {
        f(&self.node.fields.borrow())
    }

    /// Deep snapshot into a `serde_json` object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        self.with(|fields| {
            serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            )
        })
    }

    /// Assign field `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let value = {
            let notifier = self.node.notifier.borrow().clone();
            wrap(value, &notifier)
        };
        let previous = self.node.fields.borrow_mut().insert(key.into(), value);
        self.fire();
        previous
    }

    /// Delete field `key`, returning its value.
    ///
    /// Fires only when a field was actually removed.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let removed = self.node.fields.borrow_mut().remove(key);
        if removed.is_some() {
            self.fire();
        }
        removed
    }

    fn fire(&self) {
        let notifier = self.node.notifier.borrow().clone();
        notifier.notify();
    }

    fn adopted(self, notifier: &Notifier) -> Self {
        let current = self.node.notifier.borrow().clone();
        if current.same(notifier) {
            return self;
        }
        if !current.is_detached() {
            return Self::from_entries(self.with(Clone::clone)).adopted(notifier);
        }
        *self.node.notifier.borrow_mut() = notifier.clone();
        for field in self.node.fields.borrow_mut().values_mut() {
            *field = adopt(std::mem::take(field), notifier);
        }
        self
    }
}

impl Default for ObservableMap {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for ObservableMap {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.with(|a| other.with(|b| a == b))
    }
}

impl fmt::Debug for ObservableMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.with(|fields| f.debug_map().entries(fields.iter()).finish())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
