//! Top-level device: owns every global queue and decodes the MMIO bus.

use crate::config::{TaicConfig, GQ_NUM, INTR_NUM, LQ_NUM};
use crate::error::TaicError;
use crate::global_queue::GlobalQueue;
use crate::lines::OutputLines;
use crate::lock::StateLock;
use crate::mmio::{self, Decoded, MmioDevice};

const WOS: u8 = 1;
const RIDX: u8 = 2;
const FREE_QUEUE: u8 = 3;
const PASS_SOFT_INTR: u8 = 4;

/// The task-aware interrupt controller.
pub struct Taic<L> {
    state: StateLock,
    os_id: u64,
    proc_id: u64,
    alloc_idx: i64,
    gqs: Vec<GlobalQueue>,
    lines: L,
    config: TaicConfig,
}

impl<L: OutputLines> Taic<L> {
    /// # Errors
    ///
    /// Returns [`TaicError`] if `config` is invalid.
    pub fn new(config: TaicConfig, lines: L) -> Result<Self, TaicError> {
        // TaicConfig::new already validates; constructing directly from an
        // already-validated config still re-checks so callers can't bypass
        // it by building a TaicConfig through struct-update syntax.
        let config = TaicConfig::new(config.hart_count, config.external_irq_count)?;
        Ok(Self {
            state: StateLock::new(),
            os_id: 0,
            proc_id: 0,
            alloc_idx: -1,
            gqs: (0..GQ_NUM).map(|_| GlobalQueue::new(LQ_NUM, INTR_NUM)).collect(),
            lines,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> TaicConfig {
        self.config
    }

    #[must_use]
    pub fn global_queue(&self, idx: usize) -> Option<&GlobalQueue> {
        self.gqs.get(idx)
    }

    #[must_use]
    pub fn lines(&self) -> &L {
        &self.lines
    }

    fn alloc_gq(&mut self, data: u64) {
        if self.state.current() == WOS {
            self.proc_id = data;
            self.alloc_idx = self.do_alloc_gq(self.os_id, self.proc_id);
            self.state.release();
            self.state.acquire(RIDX);
        } else {
            self.state.acquire(WOS);
            self.os_id = data;
        }
    }

    /// Scan global queues from the highest index down, preferring an exact
    /// `(os_id, proc_id)` match (shared allocation) over the lowest free
    /// slot seen along the way.
    fn do_alloc_gq(&mut self, os_id: u64, proc_id: u64) -> i64 {
        let mut match_idx = None;
        let mut free_idx = None;
        for i in (0..self.gqs.len()).rev() {
            let g = &self.gqs[i];
            if g.is_owned() {
                if g.owner() == (os_id, proc_id) {
                    match_idx = Some(i);
                }
            } else {
                free_idx = Some(i);
            }
        }
        let Some(gq_idx) = match_idx.or(free_idx) else {
            log::warn!(target: "taic::controller", "alloc_gq: no free global queue for ({os_id}, {proc_id})");
            return -1;
        };
        if !self.gqs[gq_idx].is_owned() {
            self.gqs[gq_idx].claim(os_id, proc_id);
        }
        let lq_idx = self.gqs[gq_idx].alloc_lq();
        if lq_idx < 0 {
            return -1;
        }
        (((gq_idx as u64) << 32) | (lq_idx as u64)) as i64
    }

    fn read_alloc_idx(&mut self) -> u64 {
        if self.state.current() == RIDX {
            self.state.release();
        }
        self.alloc_idx as u64
    }

    fn free_gq(&mut self, packed: u64) {
        self.state.acquire(FREE_QUEUE);
        let gq_idx = (packed >> 32) as usize;
        let lq_idx = (packed & 0xFFFF_FFFF) as usize;
        match self.gqs.get_mut(gq_idx) {
            Some(g) => g.free_lq(lq_idx),
            None => log::warn!(target: "taic::controller", "free_gq: gq {gq_idx} out of range"),
        }
        self.state.release();
        self.sync_lines();
    }

    fn sim_extintr(&mut self, irq: usize) {
        for g in &mut self.gqs {
            if g.is_owned() {
                g.handle_extintr(irq);
            }
        }
        self.sync_lines();
    }

    fn lq_enq(&mut self, gq_idx: usize, lq_idx: usize, data: u64) {
        match self.gqs.get_mut(gq_idx) {
            Some(g) => g.lq_enq(lq_idx, data, false),
            None => log::warn!(target: "taic::controller", "lq_enq: gq {gq_idx} out of range"),
        }
    }

    fn lq_deq(&mut self, gq_idx: usize, lq_idx: usize) -> u64 {
        let result = match self.gqs.get_mut(gq_idx) {
            Some(g) => g.lq_deq(lq_idx),
            None => {
                log::warn!(target: "taic::controller", "lq_deq: gq {gq_idx} out of range");
                0
            }
        };
        self.sync_lines();
        result
    }

    fn register_ext(&mut self, gq_idx: usize, irq: usize, data: u64) {
        match self.gqs.get_mut(gq_idx) {
            Some(g) => g.register_ext_handler(irq, data),
            None => log::warn!(target: "taic::controller", "register_ext: gq {gq_idx} out of range"),
        }
    }

    fn register_sender(&mut self, gq_idx: usize, data: u64) {
        if let Some(g) = self.gqs.get_mut(gq_idx) {
            g.register_sender(data);
        }
    }

    fn cancel_sender(&mut self, gq_idx: usize, data: u64) {
        if let Some(g) = self.gqs.get_mut(gq_idx) {
            g.cancel_sender(data);
        }
    }

    fn register_receiver(&mut self, gq_idx: usize, data: u64) {
        if let Some(g) = self.gqs.get_mut(gq_idx) {
            g.register_receiver(data);
        }
    }

    fn write_hartid(&mut self, gq_idx: usize, data: u64) {
        if let Some(g) = self.gqs.get_mut(gq_idx) {
            g.write_hartid(data as i64);
        }
    }

    /// Two-word `send_softintr`. The per-GQ capability check is serialized
    /// by that GQ's own `sint_state`; once it completes, the cross-GQ
    /// routing step below is bracketed by the controller-level lock so it
    /// can't interleave with an `alloc_gq`/`free_gq` restructuring the
    /// global-queue array.
    fn send_softintr(&mut self, gq_idx: usize, data: u64) {
        let Some(sender) = self.gqs.get_mut(gq_idx) else {
            log::warn!(target: "taic::controller", "send_softintr: gq {gq_idx} out of range");
            return;
        };
        let Some(sendcap_idx) = sender.check_sendcap(data) else {
            return; // first word only
        };
        if sendcap_idx < 0 {
            return; // sender lacks the capability
        }
        let (send_os, send_proc) = sender.owner();
        let recv_os = sender.recv_os;
        let recv_proc = sender.recv_proc;

        self.state.acquire(PASS_SOFT_INTR);
        if let Some(receiver_idx) =
            self.gqs.iter().position(|g| g.is_owned() && g.owner() == (recv_os, recv_proc))
        {
            self.gqs[receiver_idx].handle_softintr(send_os, send_proc);
        }
        self.state.release();
        self.sync_lines();
    }

    /// Push current `ssip`/`usip` levels to the output-line collaborator
    /// for every owned, hart-bound global queue.
    fn sync_lines(&mut self) {
        for g in &self.gqs {
            if g.is_owned() && g.hart_id >= 0 {
                let hart = g.hart_id as u32;
                self.lines.set_supervisor_soft(hart, g.ssip);
                self.lines.set_user_soft(hart, g.usip);
            }
        }
    }
}

impl<L: OutputLines> MmioDevice for Taic<L> {
    fn mmio_read(&mut self, addr: u64) -> u64 {
        match mmio::decode(addr) {
            Decoded::Control { op: mmio::CTL_ALLOC_GQ } => self.read_alloc_idx(),
            Decoded::Control { op } => {
                log::warn!(target: "taic::mmio", "read: unmapped control offset {op:#x}");
                0
            }
            Decoded::Queue { gq_idx, lq_idx, op: mmio::LQ_DEQ } => self.lq_deq(gq_idx, lq_idx),
            Decoded::Queue { op: mmio::LQ_READ_RESERVED, .. } => 0,
            Decoded::Queue { op, .. } => {
                log::warn!(target: "taic::mmio", "read: unmapped queue offset {op:#x}");
                0
            }
        }
    }

    fn mmio_write(&mut self, addr: u64, value: u64) {
        match mmio::decode(addr) {
            Decoded::Control { op: mmio::CTL_ALLOC_GQ } => self.alloc_gq(value),
            Decoded::Control { op: mmio::CTL_FREE_GQ } => self.free_gq(value),
            Decoded::Control { op } => {
                if let Some(irq) = mmio::sim_extintr_index(op) {
                    self.sim_extintr(irq);
                } else {
                    log::warn!(target: "taic::mmio", "write: unmapped control offset {op:#x}");
                }
            }
            Decoded::Queue { gq_idx, lq_idx, op: mmio::LQ_ENQ } => self.lq_enq(gq_idx, lq_idx, value),
            Decoded::Queue { gq_idx, op: mmio::LQ_REG_SEND, .. } => self.register_sender(gq_idx, value),
            Decoded::Queue { gq_idx, op: mmio::LQ_CANCEL_SEND, .. } => self.cancel_sender(gq_idx, value),
            Decoded::Queue { gq_idx, op: mmio::LQ_REG_RECV, .. } => self.register_receiver(gq_idx, value),
            Decoded::Queue { gq_idx, op: mmio::LQ_SEND_SOFTINTR, .. } => self.send_softintr(gq_idx, value),
            Decoded::Queue { gq_idx, op: mmio::LQ_WRITE_HARTID, .. } => self.write_hartid(gq_idx, value),
            Decoded::Queue { gq_idx, op, .. } => {
                if let Some(irq) = mmio::reg_ext_index(op) {
                    self.register_ext(gq_idx, irq, value);
                } else {
                    log::warn!(target: "taic::mmio", "write: unmapped queue offset {op:#x}");
                }
            }
        }
    }
}
