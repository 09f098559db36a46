//! Construction-time failures.
//!
//! Per-operation faults (out-of-range index, full slot table, unmatched
//! capability) are never propagated as `Err` — they are logged and the
//! operation is dropped, matching a real guest's expectation that a
//! malformed MMIO access has no observable effect beyond a dropped write.
//! Only a device that cannot come into existence returns an error.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaicError {
    #[error("hart_count must be non-zero")]
    InvalidHartCount,

    #[error("external_irq_count must be non-zero and at most {max} (the per-queue interrupt slot count), got {got}")]
    InvalidIrqCount { got: u32, max: u32 },
}
