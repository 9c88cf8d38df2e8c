//! Test doubles for view targets and scopes.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::error::ScopeError;
use crate::scope::{Scope, Target, TargetRef};

/// Records what the engine pushed into it. Clones share one record.
#[derive(Clone, Default)]
pub(crate) struct RecordingTarget {
    record: Rc<Record>,
}

#[derive(Default)]
struct Record {
    text: RefCell<Option<String>>,
    text_writes: Cell<usize>,
    attributes: RefCell<BTreeMap<String, String>>,
}

impl RecordingTarget {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn as_target(&self) -> TargetRef {
        Rc::new(self.clone())
    }

    pub(crate) fn text(&self) -> Option<String> {
        self.record.text.borrow().clone()
    }

    pub(crate) fn text_writes(&self) -> usize {
        self.record.text_writes.get()
    }

    pub(crate) fn attribute(&self, name: &str) -> Option<String> {
        self.record.attributes.borrow().get(name).cloned()
    }
}

impl Target for RecordingTarget {
    fn set_text_content(&self, text: Option<&str>) {
        *self.record.text.borrow_mut() = text.map(str::to_owned);
        self.record
            .text_writes
            .set(self.record.text_writes.get() + 1);
    }

    fn set_attribute(&self, name: &str, value: &str) {
        self.record
            .attributes
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn remove_attribute(&self, name: &str) {
        self.record.attributes.borrow_mut().remove(name);
    }
}

/// A scope backed by a fixed query table. Unknown queries match nothing.
#[derive(Clone, Default)]
pub(crate) struct StaticScope {
    table: Rc<RefCell<HashMap<String, Vec<TargetRef>>>>,
    failing: bool,
}

impl StaticScope {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A scope rejecting every query.
    pub(crate) fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub(crate) fn with(self, query: &str, targets: Vec<TargetRef>) -> Self {
        self.insert(query, targets);
        self
    }

    pub(crate) fn insert(&self, query: &str, targets: Vec<TargetRef>) {
        self.table.borrow_mut().insert(query.to_owned(), targets);
    }
}

impl Scope for StaticScope {
    fn query_all(&self, query: &str) -> Result<Vec<TargetRef>, ScopeError> {
        if self.failing {
            return Err(ScopeError::InvalidQuery {
                query: query.to_owned(),
                reason: "rejected".to_owned(),
            });
        }
        Ok(self.table.borrow().get(query).cloned().unwrap_or_default())
    }
}
