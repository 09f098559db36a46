//! Send/receive capability tables backing inter-process software interrupts.
//!
//! A process may only deliver a software interrupt to a peer it holds a send
//! capability for, and the peer must hold a matching receive capability
//! naming a handler to run. The three scalar fields below are carry
//! registers: the multi-word MMIO protocols that build up an `(os, proc)` or
//! `(os, proc, task)` tuple stash partial state here between writes, under
//! the sequencing of the owning `GlobalQueue`'s `sint_state` lock.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SendCap {
    recv_os: u64,
    recv_proc: u64,
}

impl SendCap {
    fn is_free(self) -> bool {
        self.recv_os == 0 && self.recv_proc == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RecvCap {
    send_os: u64,
    send_proc: u64,
    handler: u64,
}

impl RecvCap {
    fn is_free(self) -> bool {
        self.send_os == 0 && self.send_proc == 0
    }
}

/// Software-interrupt capability tables for one `GlobalQueue`.
#[derive(Debug, Clone)]
pub struct SoftIntrSlots {
    sendcap: Vec<SendCap>,
    recvcap: Vec<RecvCap>,
    /// Carry register: first word of a two/three-word protocol.
    pub os_id: u64,
    /// Carry register: second word.
    pub proc_id: u64,
    /// Carry register: third word (receiver registration only).
    pub task_id: u64,
}

impl SoftIntrSlots {
    #[must_use]
    pub fn new(cap: usize) -> Self {
        Self {
            sendcap: vec![SendCap::default(); cap],
            recvcap: vec![RecvCap::default(); cap],
            os_id: 0,
            proc_id: 0,
            task_id: 0,
        }
    }

    /// Register a send capability to `(os, proc)`. Idempotent; logs and
    /// drops if the table is full.
    pub fn register_send(&mut self, os: u64, proc: u64) {
        if self.sendcap.iter().any(|c| c.recv_os == os && c.recv_proc == proc) {
            return;
        }
        match self.sendcap.iter_mut().find(|c| c.is_free()) {
            Some(slot) => *slot = SendCap { recv_os: os, recv_proc: proc },
            None => log::warn!(target: "taic::soft_intr", "no send cap slots free"),
        }
    }

    /// Cancel a previously registered send capability. Not-found is silent.
    pub fn cancel_send(&mut self, os: u64, proc: u64) {
        if let Some(slot) = self.sendcap.iter_mut().find(|c| c.recv_os == os && c.recv_proc == proc) {
            *slot = SendCap::default();
        }
    }

    /// Index of the first send capability matching `(os, proc)`, or -1.
    #[must_use]
    pub fn check_send(&self, os: u64, proc: u64) -> i64 {
        self.sendcap
            .iter()
            .position(|c| c.recv_os == os && c.recv_proc == proc)
            .map_or(-1, |i| i as i64)
    }

    /// Register (or re-register) a receive capability from `(os, proc)`
    /// with the given handler. Logs and drops if the table is full and no
    /// existing entry matches.
    pub fn register_recv(&mut self, os: u64, proc: u64, handler: u64) {
        if let Some(slot) = self.recvcap.iter_mut().find(|c| c.send_os == os && c.send_proc == proc) {
            slot.handler = handler;
            return;
        }
        match self.recvcap.iter_mut().find(|c| c.is_free()) {
            Some(slot) => *slot = RecvCap { send_os: os, send_proc: proc, handler },
            None => log::warn!(target: "taic::soft_intr", "no recv cap slots free"),
        }
    }

    /// Consume and return the handler registered to receive from
    /// `(send_os, send_proc)`, or 0 if none.
    pub fn wakeup_soft(&mut self, send_os: u64, send_proc: u64) -> u64 {
        match self.recvcap.iter_mut().find(|c| c.send_os == send_os && c.send_proc == send_proc) {
            Some(slot) => {
                let handler = slot.handler;
                *slot = RecvCap::default();
                handler
            }
            None => {
                log::warn!(target: "taic::soft_intr", "no recv cap for ({send_os}, {send_proc})");
                0
            }
        }
    }

    pub fn clean(&mut self) {
        self.sendcap.iter_mut().for_each(|s| *s = SendCap::default());
        self.recvcap.iter_mut().for_each(|s| *s = RecvCap::default());
        self.os_id = 0;
        self.proc_id = 0;
        self.task_id = 0;
    }
}
