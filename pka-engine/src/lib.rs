//! Virtual big-number register engine for a public-key accelerator.
//!
//! The accelerator exposes a small bank of physical accumulator registers.
//! This crate virtualizes that bank behind an unbounded (up to
//! [`MAX_VIRT_REGS`]) set of [`VirtReg`] handles with strictly LIFO
//! allocation, stages values between the accumulators and backing RAM on
//! demand, and issues integer and modular micro-operations against a single
//! "current modulus" slot.
//!
//! The hardware model is genuinely synchronous: every operation busy-waits
//! for a free pipeline slot before issue, and status-flag reads busy-wait
//! for the pipeline to drain. Callers must serialize access externally;
//! exclusivity is expressed through `&mut PkaEngine`.
//!
//! Contract violations — freeing a handle that is not the most recently
//! allocated, exhausting the virtual bank, operating on a freed handle —
//! are programming errors and panic. The only recoverable failure is an
//! exhausted entropy source, surfaced as [`EntropyError`].

#![no_std]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

extern crate alloc;

mod accel;
mod alu;
mod engine;
mod entropy;

pub use engine::{MAX_VIRT_REGS, PkaEngine, VirtReg};
pub use entropy::{EntropyError, EntropySource, RandomQuality};

pub use rand_core;
pub use subtle;
