//! End-to-end MMIO scenarios exercising the controller through its public
//! bus surface, against the in-crate recording line double.

use taic::mmio::{LQ_CANCEL_SEND, LQ_DEQ, LQ_ENQ, LQ_REG_EXT_BASE, LQ_REG_RECV, LQ_REG_SEND, LQ_SEND_SOFTINTR, LQ_WRITE_HARTID};
use taic::testutil::RecordingLines;
use taic::{MmioDevice, Taic, TaicConfig, GQ_NUM, LQ_NUM, PAGE_SIZE};

fn fresh() -> Taic<RecordingLines> {
    Taic::new(TaicConfig::new(4, 6).unwrap(), RecordingLines::new()).unwrap()
}

fn queue_base(gq: u64, lq: u64) -> u64 {
    PAGE_SIZE * (1 + gq * LQ_NUM as u64 + lq)
}

fn alloc(t: &mut Taic<RecordingLines>, os: u64, proc: u64) -> (u64, u64) {
    t.mmio_write(0x0, os);
    t.mmio_write(0x0, proc);
    let packed = t.mmio_read(0x0);
    (packed >> 32, packed & 0xFFFF_FFFF)
}

#[test]
fn scenario_allocate_and_release() {
    let mut t = fresh();
    let (gq, lq) = alloc(&mut t, 7, 42);
    assert_eq!((gq, lq), (0, 0), "lowest-indexed free gq chosen with no existing owner");

    let packed = (gq << 32) | lq;
    t.mmio_write(0x8, packed);

    // Freed, so a fresh allocation for the same owner lands back on gq 0.
    let (gq2, lq2) = alloc(&mut t, 7, 42);
    assert_eq!(gq2, 0);
    assert_eq!(lq2, 0);
}

#[test]
fn scenario_enqueue_dequeue_fifo() {
    let mut t = fresh();
    let (gq, lq) = alloc(&mut t, 7, 42);
    let base = queue_base(gq, lq);

    t.mmio_write(base + LQ_ENQ, 0x100);
    t.mmio_write(base + LQ_ENQ, 0x200);

    assert_eq!(t.mmio_read(base + LQ_DEQ), 0x100);
    assert_eq!(t.mmio_read(base + LQ_DEQ), 0x200);
    assert_eq!(t.mmio_read(base + LQ_DEQ), 0, "empty queue reads back 0");
}

#[test]
fn scenario_preemption_override() {
    let mut t = fresh();
    let (gq, lq0) = alloc(&mut t, 7, 42);
    let base0 = queue_base(gq, lq0);
    t.mmio_write(base0 + LQ_WRITE_HARTID, 3);

    let (gq2, lq1) = alloc(&mut t, 7, 42);
    assert_eq!(gq2, gq, "second alloc for the same owner reuses its gq");
    assert_eq!(lq1, 1);
    let base1 = queue_base(gq, lq1);

    // Register handler 0x11 (odd => preempt bit set) for irq 0 on this gq.
    t.mmio_write(base0 + LQ_REG_EXT_BASE, 0x11);
    // Control-page sim_extintr(0).
    t.mmio_write(0x10, 0);

    assert!(t.lines().user_soft(3), "proc_id != 0 raises the user-soft line");

    // Dequeue requested against lq1 is redirected to lq0 by the pending flag.
    assert_eq!(t.mmio_read(base1 + LQ_DEQ), 0x11);
    assert!(!t.lines().user_soft(3), "dequeue consumes the pending flag");
}

#[test]
fn scenario_soft_intr_path() {
    let mut t = fresh();
    let (sender_gq, _) = alloc(&mut t, 7, 42);
    let (recv_gq, recv_lq) = alloc(&mut t, 7, 99);
    let recv_base = queue_base(recv_gq, recv_lq);
    t.mmio_write(recv_base + LQ_WRITE_HARTID, 5);

    let sender_base = queue_base(sender_gq, 0);
    t.mmio_write(sender_base + LQ_REG_SEND, 7); // recv os
    t.mmio_write(sender_base + LQ_REG_SEND, 99); // recv proc, completes

    t.mmio_write(recv_base + LQ_REG_RECV, 7); // send os
    t.mmio_write(recv_base + LQ_REG_RECV, 42); // send proc
    t.mmio_write(recv_base + LQ_REG_RECV, 0x44); // handler, completes

    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 7); // recv os
    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 99); // recv proc, completes and routes

    assert_eq!(t.mmio_read(recv_base + LQ_DEQ), 0x44);
}

#[test]
fn scenario_soft_intr_requires_capability() {
    let mut t = fresh();
    let (sender_gq, _) = alloc(&mut t, 7, 42);
    let (recv_gq, recv_lq) = alloc(&mut t, 7, 99);
    let recv_base = queue_base(recv_gq, recv_lq);

    // Receiver registers, but sender never registered a send capability.
    t.mmio_write(recv_base + LQ_REG_RECV, 7);
    t.mmio_write(recv_base + LQ_REG_RECV, 42);
    t.mmio_write(recv_base + LQ_REG_RECV, 0x44);

    let sender_base = queue_base(sender_gq, 0);
    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 7);
    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 99);

    assert_eq!(t.mmio_read(recv_base + LQ_DEQ), 0, "no delivery without a send capability");
}

#[test]
fn scenario_send_cap_cancel_blocks_delivery() {
    let mut t = fresh();
    let (sender_gq, _) = alloc(&mut t, 7, 42);
    let (recv_gq, recv_lq) = alloc(&mut t, 7, 99);
    let recv_base = queue_base(recv_gq, recv_lq);
    let sender_base = queue_base(sender_gq, 0);

    t.mmio_write(sender_base + LQ_REG_SEND, 7);
    t.mmio_write(sender_base + LQ_REG_SEND, 99);
    t.mmio_write(sender_base + LQ_CANCEL_SEND, 7);
    t.mmio_write(sender_base + LQ_CANCEL_SEND, 99);

    t.mmio_write(recv_base + LQ_REG_RECV, 7);
    t.mmio_write(recv_base + LQ_REG_RECV, 42);
    t.mmio_write(recv_base + LQ_REG_RECV, 0x44);

    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 7);
    t.mmio_write(sender_base + LQ_SEND_SOFTINTR, 99);

    assert_eq!(t.mmio_read(recv_base + LQ_DEQ), 0);
}

#[test]
fn scenario_cross_irq_fanout() {
    let mut t = fresh();
    let (gq_a, lq_a) = alloc(&mut t, 1, 1);
    let (gq_b, lq_b) = alloc(&mut t, 2, 2);
    let base_a = queue_base(gq_a, lq_a);
    let base_b = queue_base(gq_b, lq_b);

    t.mmio_write(base_a + LQ_REG_EXT_BASE + 8 * 2, 0x10); // irq 2, no preempt
    t.mmio_write(base_b + LQ_REG_EXT_BASE + 8 * 2, 0x20);

    t.mmio_write(0x10 + 8 * 2, 0); // sim_extintr(2)

    assert_eq!(t.mmio_read(base_a + LQ_DEQ), 0x10);
    assert_eq!(t.mmio_read(base_b + LQ_DEQ), 0x20);

    // No re-registration: a second fanout delivers nothing further.
    t.mmio_write(0x10 + 8 * 2, 0);
    assert_eq!(t.mmio_read(base_a + LQ_DEQ), 0);
    assert_eq!(t.mmio_read(base_b + LQ_DEQ), 0);
}

#[test]
fn scenario_exhaustion() {
    let mut t = fresh();
    for i in 0..(GQ_NUM as u64) {
        let (gq, _) = alloc(&mut t, i + 1, 1000 + i);
        assert_eq!(gq, i, "global queues are claimed lowest-free-first");
    }
    t.mmio_write(0x0, 9999);
    t.mmio_write(0x0, 9999);
    assert_eq!(t.mmio_read(0x0), u64::MAX, "no global queue left to allocate");
}
