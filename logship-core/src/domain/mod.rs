//! Core domain types
//!
//! These types are shared between the protocol clients (which produce and
//! persist snapshots) and the runner (which diffs them and reports outcomes).

pub mod run;
pub mod snapshot;

pub use run::{RunResult, StepOutcome};
pub use snapshot::{LogSnapshot, NewLinesBatch, RemoteLogSnapshot};
