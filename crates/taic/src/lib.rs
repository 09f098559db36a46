//! Task-aware interrupt controller.
//!
//! A memory-mapped device that lets a guest operating system allocate and
//! free per-process scheduling queues, enqueue and dequeue runnable task
//! handles, register external-device interrupt handlers, and route
//! inter-process software interrupts across harts.
//!
//! See [`Taic`] for the device itself and [`mmio`] for the address layout
//! a host bus model drives it through.

mod config;
mod controller;
mod error;
mod ext_intr;
mod global_queue;
mod lines;
mod local_queue;
mod lock;
pub mod mmio;
mod queue;
mod soft_intr;

pub mod testutil;

pub use config::{TaicConfig, GQ_NUM, INTR_NUM, LQ_NUM, PAGE_SIZE, TAIC_MMIO_SIZE};
pub use controller::Taic;
pub use error::TaicError;
pub use global_queue::GlobalQueue;
pub use lines::OutputLines;
pub use mmio::MmioDevice;
