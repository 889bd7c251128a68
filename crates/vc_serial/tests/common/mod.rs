//! Helpers shared by the integration tests.
#![allow(dead_code, reason = "not every test binary uses every helper")]

use std::sync::{Arc, Mutex, PoisonError};

use vc_serial::context::{
    DebugContext, DeserializationContext, SerializationConfig, SerializationContext,
    SerializationLogger,
};

/// Records every diagnostic of a session.
#[derive(Default)]
pub struct CountingLogger {
    warnings: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl CountingLogger {
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl SerializationLogger for CountingLogger {
    fn log_warning(&self, message: &str) {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }

    fn log_error(&self, message: &str) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_owned());
    }
}

/// A configuration logging into a fresh [`CountingLogger`].
pub fn counting_config() -> (Arc<CountingLogger>, SerializationConfig) {
    let logger = Arc::new(CountingLogger::default());
    let config = SerializationConfig::default().with_debug(DebugContext::new(logger.clone()));
    (logger, config)
}

pub fn writing(config: SerializationConfig) -> SerializationContext {
    SerializationContext::new(config)
}

pub fn reading(config: SerializationConfig) -> DeserializationContext {
    DeserializationContext::new(config)
}
