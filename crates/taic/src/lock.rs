//! Shared state-word primitive backing the three protocol lock machines
//! (`Taic.state`, `GlobalQueue.state`, `GlobalQueue.sint_state`).
//!
//! Dispatch into this crate is single-owner (see the `MmioDevice` trait), so
//! these compare-exchanges are never actually contended; they exist to make
//! illegal operation orderings a detectable condition instead of silently
//! accepted state corruption, and to preserve the `ENQ_LQ` reentrancy
//! exception exactly as specified. Acquisition is explicit rather than
//! RAII-guarded: a method acquires, runs its critical section (which may
//! call back into another method that re-observes the same lock), and
//! releases, mirroring the wire protocol's own "CAS, act, write IDLE" shape.

use std::hint;
use std::sync::atomic::{AtomicU8, Ordering};

pub const IDLE: u8 = 0;

/// A CAS-guarded state word. `IDLE` (0) is always the resting value.
#[derive(Debug, Default)]
pub struct StateLock {
    state: AtomicU8,
}

impl StateLock {
    #[must_use]
    pub fn new() -> Self {
        Self { state: AtomicU8::new(IDLE) }
    }

    #[must_use]
    pub fn current(&self) -> u8 {
        self.state.load(Ordering::Acquire)
    }

    /// Spin until `target` is acquired from `IDLE`. Caller must call
    /// [`Self::release`] once the critical section is done.
    pub fn acquire(&self, target: u8) {
        loop {
            match self.state.compare_exchange(IDLE, target, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return,
                Err(_) => hint::spin_loop(),
            }
        }
    }

    /// Spin until `target` is acquired from `IDLE`, or the state is already
    /// one of `reentrant_from` (a legal predecessor for a reentrant call).
    ///
    /// Returns `true` if the caller freshly acquired the lock and owns
    /// [`Self::release`]; `false` if this is a reentrant pass-through and
    /// the caller must *not* release (the outer holder still owns that).
    pub fn acquire_reentrant(&self, target: u8, reentrant_from: &[u8]) -> bool {
        loop {
            match self.state.compare_exchange(IDLE, target, Ordering::AcqRel, Ordering::Relaxed) {
                Ok(_) => return true,
                Err(cur) if reentrant_from.contains(&cur) => return false,
                Err(_) => hint::spin_loop(),
            }
        }
    }

    pub fn release(&self) {
        self.state.store(IDLE, Ordering::Release);
    }
}
