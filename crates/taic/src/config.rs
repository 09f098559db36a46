//! Fixed topology constants and the two validated construction properties.

use crate::error::TaicError;

/// Number of global queues (per-process slots) the controller holds.
pub const GQ_NUM: usize = 4;
/// Number of local (hart-facing) ready queues per global queue.
pub const LQ_NUM: usize = 2;
/// Number of external-interrupt and software-interrupt slots per global queue.
pub const INTR_NUM: usize = 6;
/// Size of one MMIO page.
pub const PAGE_SIZE: u64 = 0x1000;
/// Total size of the controller's MMIO region.
pub const TAIC_MMIO_SIZE: u64 = 16 * 1024 * 1024;

/// Construction properties for a [`crate::Taic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaicConfig {
    /// Number of harts whose supervisor-soft/user-soft lines this device drives.
    pub hart_count: u32,
    /// Number of distinct external device IRQ lines routed through `sim_extintr`.
    pub external_irq_count: u32,
}

impl TaicConfig {
    /// Validate and construct a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TaicError`] if either property is zero, or if
    /// `external_irq_count` exceeds the number of interrupt slots each
    /// global queue reserves ([`INTR_NUM`]).
    pub fn new(hart_count: u32, external_irq_count: u32) -> Result<Self, TaicError> {
        if hart_count == 0 {
            return Err(TaicError::InvalidHartCount);
        }
        if external_irq_count == 0 || external_irq_count as usize > INTR_NUM {
            return Err(TaicError::InvalidIrqCount { got: external_irq_count, max: INTR_NUM as u32 });
        }
        Ok(Self { hart_count, external_irq_count })
    }
}
