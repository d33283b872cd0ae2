//! Line diff between the last snapshot and the current remote log
//!
//! The diff is a membership filter, not a positional diff: every line of the
//! remote log whose exact text never occurs in the previous snapshot is new,
//! regardless of where it appears. Duplicate new lines are kept once per
//! occurrence and lines that disappeared from the remote log are ignored.

use std::collections::HashSet;

use crate::domain::{LogSnapshot, NewLinesBatch, RemoteLogSnapshot};

/// Computes the lines of `current` that are absent from `previous`
///
/// Without a previous snapshot the batch is empty: a first run records a
/// baseline instead of replaying the whole file.
pub fn compute(previous: Option<&LogSnapshot>, current: &RemoteLogSnapshot) -> NewLinesBatch {
    let Some(previous) = previous else {
        return NewLinesBatch::empty();
    };

    let seen: HashSet<&str> = previous.lines().collect();

    NewLinesBatch::from_lines(current.lines().filter(|line| !seen.contains(line)))
}
