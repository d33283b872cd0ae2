//! Logship Core
//!
//! Core types and the line diff for the logship log shipper.
//!
//! This crate contains:
//! - Domain types: snapshots of the remote log, the batch of new lines, run outcomes
//! - Diff: the pure computation of lines appended since the last snapshot
//!
//! Nothing in here performs I/O. Protocol clients live in `logship-client`,
//! orchestration lives in `logship-runner`.

pub mod diff;
pub mod domain;
