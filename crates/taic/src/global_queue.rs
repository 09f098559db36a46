//! Per-process scheduling state: `LQ_NUM` ready queues plus the external and
//! software interrupt slot tables, serialized by two independent lock
//! machines.

use crate::ext_intr::ExtIntrSlots;
use crate::local_queue::LocalQueue;
use crate::lock::StateLock;
use crate::soft_intr::SoftIntrSlots;

pub const GQ_IDLE: u8 = 0;
pub const ALLOC_LQ: u8 = 1;
pub const FREE_LQ: u8 = 2;
pub const ENQ_LQ: u8 = 3;
pub const DEQ_LQ: u8 = 4;
pub const REG_EXT: u8 = 5;
pub const HANDLE_EXT: u8 = 6;
pub const HANDLE_SOFT: u8 = 7;

/// `lq_enq` is the only operation reentrant onto a `GlobalQueue` already
/// mid-interrupt-dispatch: both handler paths enqueue into a local queue
/// without releasing the lock they already hold.
const ENQ_REENTRANT_FROM: [u8; 2] = [HANDLE_EXT, HANDLE_SOFT];

pub const SINT_IDLE: u8 = 0;
pub const SINT_REG_SEND: u8 = 1;
pub const SINT_CANCEL_SEND: u8 = 2;
pub const SINT_REG_RECV0: u8 = 3;
pub const SINT_REG_RECV1: u8 = 4;
pub const SINT_SEND_INTR: u8 = 5;

/// One process's slice of the interrupt controller: its ready queues, its
/// external-interrupt handler table, and its software-interrupt capabilities.
pub struct GlobalQueue {
    state: StateLock,
    sint_state: StateLock,
    pub os_id: u64,
    pub proc_id: u64,
    pub hart_id: i64,
    pub ssip: bool,
    pub usip: bool,
    local_queue: Vec<LocalQueue>,
    ext: ExtIntrSlots,
    soft: SoftIntrSlots,
    used_lq_count: usize,
    pub sendcap_idx: i64,
    pub recv_os: u64,
    pub recv_proc: u64,
}

impl GlobalQueue {
    #[must_use]
    pub fn new(lq_num: usize, intr_num: usize) -> Self {
        Self {
            state: StateLock::new(),
            sint_state: StateLock::new(),
            os_id: 0,
            proc_id: 0,
            hart_id: -1,
            ssip: false,
            usip: false,
            local_queue: (0..lq_num).map(|_| LocalQueue::new()).collect(),
            ext: ExtIntrSlots::new(intr_num),
            soft: SoftIntrSlots::new(intr_num),
            used_lq_count: 0,
            sendcap_idx: -1,
            recv_os: 0,
            recv_proc: 0,
        }
    }

    #[must_use]
    pub fn is_owned(&self) -> bool {
        self.os_id != 0 || self.proc_id != 0
    }

    #[must_use]
    pub fn owner(&self) -> (u64, u64) {
        (self.os_id, self.proc_id)
    }

    pub fn claim(&mut self, os_id: u64, proc_id: u64) {
        self.os_id = os_id;
        self.proc_id = proc_id;
    }

    /// Find the first unused local queue, mark it in use, and return its
    /// index, or -1 if the global queue's local queues are all taken.
    pub fn alloc_lq(&mut self) -> i64 {
        self.state.acquire(ALLOC_LQ);
        let found = self.local_queue.iter().position(|lq| !lq.in_use);
        let result = match found {
            Some(idx) => {
                self.local_queue[idx].in_use = true;
                self.used_lq_count += 1;
                idx as i64
            }
            None => {
                log::warn!(target: "taic::global_queue", "alloc_lq: no free local queue");
                -1
            }
        };
        self.state.release();
        result
    }

    /// Release local queue `idx`. If this was the last held local queue,
    /// the whole global queue reverts to the unowned state.
    pub fn free_lq(&mut self, idx: usize) {
        self.state.acquire(FREE_LQ);
        match self.local_queue.get_mut(idx) {
            Some(lq) if lq.in_use => {
                lq.release();
                self.used_lq_count -= 1;
                if self.used_lq_count == 0 {
                    self.release_owner();
                }
            }
            Some(_) => log::warn!(target: "taic::global_queue", "free_lq: lq {idx} not in use"),
            None => log::warn!(target: "taic::global_queue", "free_lq: lq {idx} out of range"),
        }
        self.state.release();
    }

    fn release_owner(&mut self) {
        self.os_id = 0;
        self.proc_id = 0;
        self.hart_id = -1;
        self.ssip = false;
        self.usip = false;
        self.ext.clean();
        self.soft.clean();
        self.sendcap_idx = -1;
        self.recv_os = 0;
        self.recv_proc = 0;
        for lq in &mut self.local_queue {
            lq.release();
        }
    }

    /// Enqueue `data` into local queue `idx`. Reentrant from inside
    /// `handle_extintr`/`handle_softintr`.
    pub fn lq_enq(&mut self, idx: usize, data: u64, need_preempt: bool) {
        let Some(lq) = self.local_queue.get_mut(idx) else {
            log::warn!(target: "taic::global_queue", "lq_enq: lq {idx} out of range");
            return;
        };
        if !lq.in_use {
            log::warn!(target: "taic::global_queue", "lq_enq: lq {idx} not in use");
            return;
        }
        let owns_release = self.state.acquire_reentrant(ENQ_LQ, &ENQ_REENTRANT_FROM);
        self.local_queue[idx].enqueue(data, need_preempt);
        if owns_release {
            self.state.release();
        }
    }

    /// Dequeue from local queue `idx`, unless a pending preemptive
    /// interrupt forces local queue 0 instead. Falls back to work-stealing
    /// across every local queue when the chosen one is empty.
    pub fn lq_deq(&mut self, idx: usize) -> u64 {
        self.state.acquire(DEQ_LQ);
        let idx = if self.ssip || self.usip {
            self.ssip = false;
            self.usip = false;
            0
        } else {
            idx
        };
        let result = match self.local_queue.get_mut(idx) {
            Some(lq) => {
                let first = lq.dequeue();
                if first != 0 {
                    first
                } else {
                    self.local_queue.iter_mut().find_map(|lq| {
                        let h = lq.dequeue();
                        (h != 0).then_some(h)
                    }).unwrap_or(0)
                }
            }
            None => {
                log::warn!(target: "taic::global_queue", "lq_deq: lq {idx} out of range");
                0
            }
        };
        self.state.release();
        result
    }

    pub fn register_ext_handler(&mut self, irq: usize, handler: u64) {
        self.state.acquire(REG_EXT);
        self.ext.register(irq, handler);
        self.state.release();
    }

    /// Consume the handler pending for `irq` and enqueue it onto local
    /// queue 0, raising the appropriate software-interrupt line flag when
    /// the handler requests preemption.
    pub fn handle_extintr(&mut self, irq: usize) {
        self.state.acquire(HANDLE_EXT);
        let handler = self.ext.wakeup(irq);
        if handler != 0 {
            let need_preempt = handler & 1 == 1;
            if need_preempt {
                if self.proc_id == 0 {
                    self.ssip = true;
                } else {
                    self.usip = true;
                }
            }
            self.lq_enq(0, handler, need_preempt);
        }
        self.state.release();
    }

    /// Two-word send-capability registration: word 1 is `os_id`, word 2 is
    /// `proc_id`, completing the operation.
    pub fn register_sender(&mut self, data: u64) {
        match self.sint_state.current() {
            SINT_REG_SEND => {
                self.sint_state.release();
                self.soft.register_send(self.soft.os_id, data);
            }
            _ => {
                self.sint_state.acquire(SINT_REG_SEND);
                self.soft.os_id = data;
            }
        }
    }

    pub fn cancel_sender(&mut self, data: u64) {
        match self.sint_state.current() {
            SINT_CANCEL_SEND => {
                self.sint_state.release();
                self.soft.cancel_send(self.soft.os_id, data);
            }
            _ => {
                self.sint_state.acquire(SINT_CANCEL_SEND);
                self.soft.os_id = data;
            }
        }
    }

    /// Three-word receiver registration: os, then proc, then handler.
    pub fn register_receiver(&mut self, data: u64) {
        match self.sint_state.current() {
            SINT_REG_RECV0 => {
                self.soft.proc_id = data;
                self.sint_state.release();
                self.sint_state.acquire(SINT_REG_RECV1);
            }
            SINT_REG_RECV1 => {
                self.sint_state.release();
                self.soft.register_recv(self.soft.os_id, self.soft.proc_id, data);
            }
            _ => {
                self.sint_state.acquire(SINT_REG_RECV0);
                self.soft.os_id = data;
            }
        }
    }

    /// Two-word sendcap check: word 1 sets `recv_os`, word 2 sets
    /// `recv_proc` and completes, recording the found index in
    /// `sendcap_idx` (-1 if absent). Returns `Some(idx)` only on the
    /// completing word so the controller knows when to route the
    /// interrupt; `None` on the first word.
    pub fn check_sendcap(&mut self, data: u64) -> Option<i64> {
        if self.sint_state.current() == SINT_SEND_INTR {
            self.recv_proc = data;
            self.sendcap_idx = self.soft.check_send(self.recv_os, self.recv_proc);
            self.sint_state.release();
            Some(self.sendcap_idx)
        } else {
            self.sint_state.acquire(SINT_SEND_INTR);
            self.recv_os = data;
            None
        }
    }

    /// Consume the receive capability registered for `(send_os, send_proc)`
    /// and enqueue its handler, mirroring `handle_extintr`.
    pub fn handle_softintr(&mut self, send_os: u64, send_proc: u64) {
        self.state.acquire(HANDLE_SOFT);
        let handler = self.soft.wakeup_soft(send_os, send_proc);
        if handler != 0 {
            let need_preempt = handler & 1 == 1;
            if need_preempt {
                if self.proc_id == 0 {
                    self.ssip = true;
                } else {
                    self.usip = true;
                }
            }
            self.lq_enq(0, handler, need_preempt);
        }
        self.state.release();
    }

    pub fn write_hartid(&mut self, hart_id: i64) {
        self.hart_id = hart_id;
    }
}
