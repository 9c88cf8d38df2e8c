#![forbid(unsafe_code)]

//! Test harness for proxyland.
//!
//! - Document fixtures and lookup helpers for end-to-end binding tests.
//! - [`SignalCounter`]: a notifier that counts change signals.
//! - [`strategies`]: proptest strategies for JSON trees and list operation
//!   sequences, plus a plain `Vec` reference model for list operations.
//!
//! Helpers panic with a descriptive message on malformed fixtures; they are
//! meant for tests only.

use std::cell::Cell;
use std::rc::Rc;

use proxyland_core::{Engine, EngineConfig, Notifier, ObservableList, ObservableMap};
use proxyland_dom::Document;

pub mod strategies;

/// A document whose body holds `markup`.
///
/// # Panics
///
/// Panics when `markup` does not parse.
#[must_use]
pub fn fixture(markup: &str) -> Document {
    Document::from_body_markup(markup).unwrap_or_else(|err| panic!("fixture markup: {err}"))
}

/// An engine over `data` whose queries resolve against `doc`.
#[must_use]
pub fn engine_on(doc: &Document, data: serde_json::Value) -> Engine {
    Engine::with_config(data, EngineConfig::default().with_scope(doc.clone()))
}

/// Text content of the first element matching `selector`.
///
/// # Panics
///
/// Panics when nothing matches.
#[must_use]
pub fn text_of(doc: &Document, selector: &str) -> String {
    doc.query_selector(selector)
        .ok()
        .flatten()
        .unwrap_or_else(|| panic!("no element matches {selector:?}"))
        .text_content()
}

/// Attribute `name` of the first element matching `selector`.
///
/// # Panics
///
/// Panics when nothing matches.
#[must_use]
pub fn attr_of(doc: &Document, selector: &str, name: &str) -> Option<String> {
    doc.query_selector(selector)
        .ok()
        .flatten()
        .unwrap_or_else(|| panic!("no element matches {selector:?}"))
        .get_attribute(name)
}

/// The list at JSON `pointer` in the engine's data.
///
/// # Panics
///
/// Panics when the pointer does not lead to a list.
#[must_use]
pub fn list_at(engine: &Engine, pointer: &str) -> ObservableList {
    engine
        .data()
        .pointer(pointer)
        .and_then(|value| value.as_list().cloned())
        .unwrap_or_else(|| panic!("no list at {pointer:?}"))
}

/// The map at JSON `pointer` in the engine's data. `""` is the root.
///
/// # Panics
///
/// Panics when the pointer does not lead to a map.
#[must_use]
pub fn map_at(engine: &Engine, pointer: &str) -> ObservableMap {
    engine
        .data()
        .pointer(pointer)
        .and_then(|value| value.as_map().cloned())
        .unwrap_or_else(|| panic!("no map at {pointer:?}"))
}

/// Counts the signals fired through its notifier.
#[derive(Clone)]
pub struct SignalCounter {
    count: Rc<Cell<usize>>,
    notifier: Notifier,
}

impl Default for SignalCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalCounter {
    #[must_use]
    pub fn new() -> Self {
        let count = Rc::new(Cell::new(0));
        let counted = Rc::clone(&count);
        let notifier = Notifier::new(move || counted.set(counted.get() + 1));
        Self { count, notifier }
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.count.get()
    }

    /// Return the count and reset it to zero.
    pub fn take(&self) -> usize {
        self.count.replace(0)
    }
}
