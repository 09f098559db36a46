//! Pending external-interrupt handler table.
//!
//! Each slot holds at most one registered handler; delivering it consumes
//! the slot, so a device interrupt wakes exactly one waiter per registration.

/// Fixed-size table of pending external-interrupt handlers.
#[derive(Debug, Clone)]
pub struct ExtIntrSlots {
    slots: Vec<u64>,
}

impl ExtIntrSlots {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self { slots: vec![0; cap] }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Register `handler` for `irq`. Out-of-range `irq` is logged and dropped.
    pub fn register(&mut self, irq: usize, handler: u64) {
        match self.slots.get_mut(irq) {
            Some(slot) => *slot = handler,
            None => log::warn!(target: "taic::ext_intr", "register: irq {irq} out of range"),
        }
    }

    /// Consume and return the handler registered for `irq`, or 0 if none.
    pub fn wakeup(&mut self, irq: usize) -> u64 {
        match self.slots.get_mut(irq) {
            Some(slot) => std::mem::take(slot),
            None => {
                log::warn!(target: "taic::ext_intr", "wakeup: irq {irq} out of range");
                0
            }
        }
    }

    pub fn clean(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_reports_the_table_size() {
        let slots = ExtIntrSlots::new(6);
        assert_eq!(slots.capacity(), 6);
    }

    #[test]
    fn register_then_wakeup_round_trips() {
        let mut slots = ExtIntrSlots::new(6);
        slots.register(2, 0x42);
        assert_eq!(slots.wakeup(2), 0x42);
    }

    #[test]
    fn wakeup_consumes_the_handler() {
        let mut slots = ExtIntrSlots::new(6);
        slots.register(0, 7);
        assert_eq!(slots.wakeup(0), 7);
        assert_eq!(slots.wakeup(0), 0);
    }

    #[test]
    fn out_of_range_is_a_no_op() {
        let mut slots = ExtIntrSlots::new(6);
        slots.register(99, 1);
        assert_eq!(slots.wakeup(99), 0);
    }

    #[test]
    fn clean_clears_every_slot() {
        let mut slots = ExtIntrSlots::new(3);
        slots.register(0, 1);
        slots.register(1, 2);
        slots.clean();
        assert_eq!(slots.wakeup(0), 0);
        assert_eq!(slots.wakeup(1), 0);
    }
}
