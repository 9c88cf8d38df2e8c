#![forbid(unsafe_code)]

//! The binding engine: keeps view targets in sync with a reactive data tree.
//!
//! An [`Engine`] owns the wrapped root of a data tree and an ordered table of
//! bindings. Each binding pairs a [`BindTarget`] with a [`Derivation`]. The
//! tree's change signal triggers a full pass over the table, so every write
//! through the tree is reflected in the view before the write returns.
//!
//! # Usage
//!
//! ```
//! use std::rc::Rc;
//! use std::cell::RefCell;
//! use proxyland_core::engine::Engine;
//! use proxyland_core::scope::{Target, TargetRef};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Label(RefCell<String>);
//!
//! impl Target for Label {
//!     fn set_text_content(&self, text: Option<&str>) {
//!         *self.0.borrow_mut() = text.unwrap_or_default().to_owned();
//!     }
//!     fn set_attribute(&self, _: &str, _: &str) {}
//!     fn remove_attribute(&self, _: &str) {}
//! }
//!
//! let label = Rc::new(Label::default());
//! let engine = Engine::new(json!({"value": "initial"}));
//! engine.bind_field(Rc::clone(&label) as TargetRef, "value").unwrap();
//! assert_eq!(*label.0.borrow(), "initial");
//!
//! engine.data().as_map().unwrap().set("value", "updated");
//! assert_eq!(*label.0.borrow(), "updated");
//! ```
//!
//! # Invariants
//!
//! 1. Registration evaluates the new binding once before returning.
//! 2. Every change signal runs exactly one pass over every binding, in
//!    registration order, before the mutating call returns.
//! 3. A descriptor resolving to no targets is skipped silently.
//! 4. Attribute placement removes the attribute when the derived value is
//!    absent and sets its canonical text otherwise.
//! 5. `version()` increments once per change signal.
//!
//! # Failure Modes
//!
//! - Derivation panic: unwinds out of the mutating call, `register`, or
//!   `full_update`. No borrow is held across a derivation, so the engine and
//!   tree stay usable when the caller catches the panic.
//! - Scope error during a signal-triggered pass: logged and skipped (the
//!   mutating call has no error channel). `register` and `full_update`
//!   return it.
//! - Derivation writes to the tree: handled per [`ReentryPolicy`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::{EngineConfig, ReentryPolicy};
use crate::error::BindError;
use crate::scope::{BindTarget, Placement, Scope, TargetRef, resolve_targets};
use crate::tree::{Notifier, release, wrap};
use crate::value::Value;

/// Identifies a registered binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(u64);

impl BindingId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Derivation
// ---------------------------------------------------------------------------

/// A pure function from the data tree to a displayable value.
///
/// `Null` is the absence marker. Derivations may read the tree but must
/// never write to it.
#[derive(Clone)]
pub struct Derivation {
    eval: Rc<dyn Fn(&Value) -> Value>,
    field: Option<String>,
}

impl Derivation {
    /// Derive from an arbitrary function of the root.
    pub fn new<R: Into<Value>>(f: impl Fn(&Value) -> R + 'static) -> Self {
        Self {
            eval: Rc::new(move |data| f(data).into()),
            field: None,
        }
    }

    /// Read field `name` off the root. A missing field, or a root that is not
    /// a map, derives absence.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self {
            eval: Rc::new(move |data| data.get(&key).unwrap_or_default()),
            field: Some(name),
        }
    }

    /// Evaluate against `data`.
    #[must_use]
    pub fn evaluate(&self, data: &Value) -> Value {
        (self.eval)(data)
    }

    /// Apply a further transform, returning a new derivation.
    #[must_use]
    pub fn then<R: Into<Value>>(self, f: impl Fn(Value) -> R + 'static) -> Self {
        let eval = self.eval;
        Self {
            eval: Rc::new(move |data| f(eval(data)).into()),
            field: None,
        }
    }
}

impl From<&str> for Derivation {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl From<String> for Derivation {
    fn from(name: String) -> Self {
        Self::field(name)
    }
}

impl fmt::Debug for Derivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(name) => f.debug_tuple("Derivation::Field").field(name).finish(),
            None => f.write_str("Derivation::Fn"),
        }
    }
}

// ---------------------------------------------------------------------------
// Binding table
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct Binding {
    id: BindingId,
    target: BindTarget,
    derivation: Derivation,
}

/// Marks a pass in progress; restores the previous state on drop, including
/// during unwinding.
struct PassGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> PassGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

struct EngineInner {
    data: RefCell<Value>,
    notifier: Notifier,
    bindings: RefCell<Vec<Rc<Binding>>>,
    scope: Rc<dyn Scope>,
    reentry: ReentryPolicy,
    version: Cell<u64>,
    in_pass: Cell<bool>,
    next_id: Cell<u64>,
}

impl EngineInner {
    fn on_change(&self) {
        self.version.set(self.version.get() + 1);
        if self.in_pass.get() {
            match self.reentry {
                ReentryPolicy::Skip => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        message = "engine.skip_reentrant",
                        version = self.version.get()
                    );
                    return;
                }
                ReentryPolicy::Panic => {
                    panic!("data tree mutated by a derivation during an update pass")
                }
            }
        }
        if let Err(_err) = self.update_all() {
            #[cfg(feature = "tracing")]
            tracing::warn!(message = "engine.scope_error", error = %_err);
        }
    }

    fn update_all(&self) -> Result<(), BindError> {
        // Snapshot the table so a derivation may register without a borrow
        // conflict; the new binding is evaluated by its own registration.
        let bindings: Vec<Rc<Binding>> = self.bindings.borrow().clone();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "engine.update",
            bindings = bindings.len(),
            version = self.version.get()
        )
        .entered();

        let _guard = PassGuard::enter(&self.in_pass);
        let mut first_error = None;
        for binding in &bindings {
            if let Err(err) = self.update_binding(binding) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn update_binding(&self, binding: &Binding) -> Result<(), BindError> {
        let descriptor = binding.target.descriptor();
        let targets = resolve_targets(self.scope.as_ref(), descriptor).map_err(|source| {
            BindError::Resolve {
                descriptor: descriptor.to_string(),
                source,
            }
        })?;
        if targets.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                message = "binding.no_targets",
                id = binding.id.get(),
                descriptor = %descriptor
            );
            return Ok(());
        }

        let data = self.data.borrow().clone();
        for target in &targets {
            let value = binding.derivation.evaluate(&data);
            apply(target, binding.target.placement(), &value);
        }
        Ok(())
    }
}

fn apply(target: &TargetRef, placement: &Placement, value: &Value) {
    match placement {
        Placement::Text => target.set_text_content(value.to_text().as_deref()),
        Placement::Attribute(name) => match value.to_text() {
            Some(text) => target.set_attribute(name, &text),
            None => target.remove_attribute(name),
        },
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns a reactive data tree and keeps bound view targets in sync with it.
///
/// Cloning an `Engine` creates a new handle to the **same** engine. When the
/// last handle drops, surviving tree handles stop signalling anything.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Wrap `data` with no scope configured (query descriptors match
    /// nothing; handle descriptors work).
    pub fn new(data: impl Into<Value>) -> Self {
        Self::with_config(data, EngineConfig::default())
    }

    /// Wrap `data`, resolving queries against `config`'s scope.
    pub fn with_config(data: impl Into<Value>, config: EngineConfig) -> Self {
        let data = data.into();
        let inner = Rc::new_cyclic(|weak: &Weak<EngineInner>| {
            let weak = weak.clone();
            let notifier = Notifier::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_change();
                }
            });
            EngineInner {
                data: RefCell::new(wrap(data, &notifier)),
                notifier,
                bindings: RefCell::new(Vec::new()),
                scope: Rc::clone(config.scope()),
                reentry: config.reentry_policy(),
                version: Cell::new(0),
                in_pass: Cell::new(false),
                next_id: Cell::new(0),
            }
        });
        Self { inner }
    }

    /// The live, wrapped root. All mutation goes through it.
    #[must_use]
    pub fn data(&self) -> Value {
        self.inner.data.borrow().clone()
    }

    /// Replace the whole root, then run a full pass.
    ///
    /// Containers of the old root that the new root does not reuse are
    /// detached and stop signalling.
    pub fn replace_data(&self, data: impl Into<Value>) {
        let old = self.inner.data.replace(Value::Null);
        release(&old, &self.inner.notifier);
        let wrapped = wrap(data, &self.inner.notifier);
        *self.inner.data.borrow_mut() = wrapped;
        self.inner.on_change();
    }

    /// Register a binding and evaluate it once.
    ///
    /// A bare descriptor binds textual content; use
    /// [`BindTarget::attribute`] to bind an attribute. A string derivation is
    /// the field-name shorthand.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::Resolve`] when the scope rejects the descriptor;
    /// the binding is not kept.
    pub fn register(
        &self,
        target: impl Into<BindTarget>,
        derivation: impl Into<Derivation>,
    ) -> Result<BindingId, BindError> {
        let id = BindingId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        let binding = Rc::new(Binding {
            id,
            target: target.into(),
            derivation: derivation.into(),
        });

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "engine.register",
            id = id.get(),
            descriptor = %binding.target.descriptor()
        )
        .entered();

        self.inner.bindings.borrow_mut().push(Rc::clone(&binding));
        let result = {
            let _guard = PassGuard::enter(&self.inner.in_pass);
            self.inner.update_binding(&binding)
        };
        if let Err(err) = result {
            self.inner.bindings.borrow_mut().retain(|b| b.id != id);
            return Err(err);
        }
        Ok(id)
    }

    /// Bind `target` to field `name` of the root.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn bind_field(
        &self,
        target: impl Into<BindTarget>,
        name: &str,
    ) -> Result<BindingId, BindError> {
        self.register(target, Derivation::field(name))
    }

    /// Bind `target` to `f` applied to the root.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn bind_map<R: Into<Value>>(
        &self,
        target: impl Into<BindTarget>,
        f: impl Fn(&Value) -> R + 'static,
    ) -> Result<BindingId, BindError> {
        self.register(target, Derivation::new(f))
    }

    /// Re-evaluate every binding in registration order.
    ///
    /// # Errors
    ///
    /// Every binding is visited; the first resolution error is returned.
    pub fn full_update(&self) -> Result<(), BindError> {
        self.inner.update_all()
    }

    /// Number of change signals observed since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.inner.bindings.borrow().len()
    }

    /// Ids of registered bindings, in evaluation order.
    #[must_use]
    pub fn binding_ids(&self) -> Vec<BindingId> {
        self.inner.bindings.borrow().iter().map(|b| b.id).collect()
    }

    #[must_use]
    pub fn scope(&self) -> &Rc<dyn Scope> {
        &self.inner.scope
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("data", &*self.inner.data.borrow())
            .field("binding_count", &self.binding_count())
            .field("version", &self.version())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
