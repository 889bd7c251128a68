use alloc::string::ToString;
use core::fmt;

use vc_os::sync::Arc;

// -----------------------------------------------------------------------------
// LoggingPolicy

/// Which diagnostics reach the logger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoggingPolicy {
    /// Only errors are logged.
    LogErrors,
    /// Warnings and errors are logged.
    #[default]
    LogWarningsAndErrors,
    /// Nothing is logged.
    Silent,
}

// -----------------------------------------------------------------------------
// SerializationLogger

/// A sink for recoverable anomalies found during (de)serialization.
pub trait SerializationLogger: Send + Sync {
    fn log_warning(&self, message: &str);

    fn log_error(&self, message: &str);
}

/// Forwards to the [`log`] crate under the `vc_serial` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultLogger;

impl SerializationLogger for DefaultLogger {
    fn log_warning(&self, message: &str) {
        log::warn!(target: "vc_serial", "{message}");
    }

    fn log_error(&self, message: &str) {
        log::error!(target: "vc_serial", "{message}");
    }
}

// -----------------------------------------------------------------------------
// DebugContext

/// The diagnostics sink of a session.
///
/// Messages are only formatted if the [`LoggingPolicy`] lets them through.
#[derive(Clone)]
pub struct DebugContext {
    logger: Arc<dyn SerializationLogger>,
    logging_policy: LoggingPolicy,
}

impl Default for DebugContext {
    fn default() -> Self {
        Self {
            logger: Arc::new(DefaultLogger),
            logging_policy: LoggingPolicy::default(),
        }
    }
}

impl DebugContext {
    /// Creates a context logging warnings and errors to `logger`.
    pub fn new(logger: Arc<dyn SerializationLogger>) -> Self {
        Self {
            logger,
            logging_policy: LoggingPolicy::default(),
        }
    }

    pub fn with_logging_policy(mut self, logging_policy: LoggingPolicy) -> Self {
        self.logging_policy = logging_policy;
        self
    }

    #[inline]
    pub fn logging_policy(&self) -> LoggingPolicy {
        self.logging_policy
    }

    #[inline]
    pub fn logger(&self) -> &Arc<dyn SerializationLogger> {
        &self.logger
    }

    pub fn log_warning(&self, message: impl fmt::Display) {
        if self.logging_policy == LoggingPolicy::LogWarningsAndErrors {
            self.logger.log_warning(&message.to_string());
        }
    }

    pub fn log_error(&self, message: impl fmt::Display) {
        if self.logging_policy != LoggingPolicy::Silent {
            self.logger.log_error(&message.to_string());
        }
    }
}

impl fmt::Debug for DebugContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebugContext")
            .field("logging_policy", &self.logging_policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::vec::Vec;

    use vc_os::sync::{Arc, Mutex, lock};

    use super::{DebugContext, LoggingPolicy, SerializationLogger};

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl SerializationLogger for Collect {
        fn log_warning(&self, message: &str) {
            lock(&self.0).push(alloc::format!("warn: {message}"));
        }
        fn log_error(&self, message: &str) {
            lock(&self.0).push(alloc::format!("error: {message}"));
        }
    }

    #[test]
    fn policy_filters_messages() {
        let logger = Arc::new(Collect::default());
        let debug = DebugContext::new(logger.clone()).with_logging_policy(LoggingPolicy::LogErrors);
        debug.log_warning("dropped");
        debug.log_error("kept");

        let silent = debug.with_logging_policy(LoggingPolicy::Silent);
        silent.log_error("dropped");

        assert_eq!(*lock(&logger.0), ["error: kept"]);
    }
}
