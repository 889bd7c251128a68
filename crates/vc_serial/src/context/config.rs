use core::fmt;

use vc_os::sync::Arc;

use crate::context::{DebugContext, DefaultTypeBinder, SerializationPolicy, TypeBinder};

/// Per-session configuration shared by both directions.
///
/// Cloning is cheap; policy and binder are shared.
#[derive(Clone)]
pub struct SerializationConfig {
    policy: Arc<SerializationPolicy>,
    binder: Arc<dyn TypeBinder>,
    debug: DebugContext,
    allow_weak_fallback: bool,
}

impl Default for SerializationConfig {
    /// The default policy, a [`DefaultTypeBinder`] over the global registry,
    /// the [`log`] backed diagnostics and weak fallback allowed.
    fn default() -> Self {
        Self {
            policy: SerializationPolicy::default_policy(),
            binder: Arc::new(DefaultTypeBinder::new()),
            debug: DebugContext::default(),
            allow_weak_fallback: true,
        }
    }
}

impl SerializationConfig {
    pub fn with_policy(mut self, policy: Arc<SerializationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_binder(mut self, binder: Arc<dyn TypeBinder>) -> Self {
        self.binder = binder;
        self
    }

    pub fn with_debug(mut self, debug: DebugContext) -> Self {
        self.debug = debug;
        self
    }

    /// Whether types without compiled serializers or formatters may be
    /// handled through the weak, reflection driven paths. When `false`,
    /// such types abort the session.
    pub fn with_allow_weak_fallback(mut self, allow: bool) -> Self {
        self.allow_weak_fallback = allow;
        self
    }

    #[inline]
    pub fn policy(&self) -> &Arc<SerializationPolicy> {
        &self.policy
    }

    #[inline]
    pub fn binder(&self) -> &dyn TypeBinder {
        &*self.binder
    }

    #[inline]
    pub fn debug(&self) -> &DebugContext {
        &self.debug
    }

    #[inline]
    pub fn allow_weak_fallback(&self) -> bool {
        self.allow_weak_fallback
    }
}

impl fmt::Debug for SerializationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationConfig")
            .field("policy", &self.policy.name())
            .field("debug", &self.debug)
            .field("allow_weak_fallback", &self.allow_weak_fallback)
            .finish_non_exhaustive()
    }
}
