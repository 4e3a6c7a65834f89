//! Purges not yet covered by a rebuild.
//!
//! Marks are process-local. Each mark records the epoch at which it was set;
//! a rebuild that started at or after that epoch and persisted successfully
//! clears it.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::module::Module;

pub type Epoch = u64;

#[derive(Debug, Default)]
pub struct PendingPurges {
    epoch: AtomicU64,
    marks: DashMap<Module, Epoch>,
}

impl PendingPurges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds capture this before reading the origin.
    pub fn current_epoch(&self) -> Epoch {
        self.epoch.load(Ordering::Acquire)
    }

    /// Record a purge of `module`.
    pub fn mark(&self, module: Module) -> Epoch {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        self.marks.insert(module, epoch);
        epoch
    }

    pub fn is_marked(&self, module: Module) -> bool {
        self.marks.contains_key(&module)
    }

    /// Drop the mark if it was set before a rebuild that began at `started`.
    pub fn clear_if_older(&self, module: Module, started: Epoch) -> bool {
        self.marks
            .remove_if(&module, |_, marked| *marked <= started)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}
