//! Static fallback payloads.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use super::module::Module;

/// Hand-authored default content, served only when neither a snapshot nor a
/// working loader is available.
pub trait FallbackProvider: Send + Sync {
    fn fallback(&self, module: Module) -> Option<Value>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheSetupError {
    #[error("no fallback payload registered for modules: {0:?}")]
    MissingFallbacks(Vec<Module>),
    #[error("no loader registered for modules: {0:?}")]
    MissingLoaders(Vec<Module>),
}

/// Fallback payloads keyed by module.
#[derive(Debug, Clone, Default)]
pub struct FallbackRegistry {
    payloads: HashMap<Module, Value>,
}

impl FallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, module: Module, payload: Value) -> Self {
        self.payloads.insert(module, payload);
        self
    }

    /// Fails when any module lacks a fallback. Run once at startup.
    pub fn ensure_complete(&self) -> Result<(), CacheSetupError> {
        let missing: Vec<Module> = Module::ALL
            .into_iter()
            .filter(|module| !self.payloads.contains_key(module))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CacheSetupError::MissingFallbacks(missing))
        }
    }
}

impl FallbackProvider for FallbackRegistry {
    fn fallback(&self, module: Module) -> Option<Value> {
        self.payloads.get(&module).cloned()
    }
}
