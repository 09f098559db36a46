//! Minimal recording double for [`crate::OutputLines`], used by this
//! crate's own tests and exported for integration tests under `tests/`.
//! Not a real virtualization framework — it only remembers the last level
//! seen on each line so tests can assert on it.

use crate::lines::OutputLines;
use std::collections::HashMap;

/// Records the most recent level written to each supervisor-soft/user-soft
/// line, keyed by hart id.
#[derive(Debug, Default)]
pub struct RecordingLines {
    pub supervisor_soft: HashMap<u32, bool>,
    pub user_soft: HashMap<u32, bool>,
}

impl RecordingLines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn supervisor_soft(&self, hart_id: u32) -> bool {
        self.supervisor_soft.get(&hart_id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn user_soft(&self, hart_id: u32) -> bool {
        self.user_soft.get(&hart_id).copied().unwrap_or(false)
    }
}

impl OutputLines for RecordingLines {
    fn set_supervisor_soft(&mut self, hart_id: u32, level: bool) {
        self.supervisor_soft.insert(hart_id, level);
    }

    fn set_user_soft(&mut self, hart_id: u32, level: bool) {
        self.user_soft.insert(hart_id, level);
    }
}
