#![forbid(unsafe_code)]

//! Engine configuration.

use std::fmt;
use std::rc::Rc;

use crate::scope::{DetachedScope, Scope};

/// What happens when the data tree changes while an update pass is running.
///
/// That only occurs when a derivation writes to the tree, which derivations
/// must not do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReentryPolicy {
    /// Count the change but run no nested pass.
    #[default]
    Skip,
    /// Panic, naming the offending write.
    Panic,
}

/// Configuration for [`Engine`](crate::engine::Engine).
///
/// # Example
///
/// ```
/// use proxyland_core::config::{EngineConfig, ReentryPolicy};
/// use proxyland_core::scope::DetachedScope;
///
/// let config = EngineConfig::default()
///     .with_scope(DetachedScope)
///     .with_reentry_policy(ReentryPolicy::Panic);
/// assert_eq!(config.reentry_policy(), ReentryPolicy::Panic);
/// ```
#[derive(Clone)]
pub struct EngineConfig {
    scope: Rc<dyn Scope>,
    reentry: ReentryPolicy,
}

impl EngineConfig {
    /// Resolve query descriptors against `scope`.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Scope + 'static) -> Self {
        self.scope = Rc::new(scope);
        self
    }

    /// Resolve query descriptors against an already shared scope.
    #[must_use]
    pub fn with_shared_scope(mut self, scope: Rc<dyn Scope>) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_reentry_policy(mut self, policy: ReentryPolicy) -> Self {
        self.reentry = policy;
        self
    }

    #[must_use]
    pub fn scope(&self) -> &Rc<dyn Scope> {
        &self.scope
    }

    #[must_use]
    pub fn reentry_policy(&self) -> ReentryPolicy {
        self.reentry
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope: Rc::new(DetachedScope),
            reentry: ReentryPolicy::default(),
        }
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("reentry", &self.reentry)
            .finish_non_exhaustive()
    }
}
