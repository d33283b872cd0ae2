//! Scheduler layer for the runner
//!
//! Re-triggers whole invocations on a fixed interval when the runner is not
//! driven by an external scheduler.

pub mod interval;

pub use interval::RunScheduler;
