//! Snapshot domain types

use serde::{Deserialize, Serialize};

/// Full text of the remote log file as it was last persisted
///
/// A missing snapshot is modelled as `Option<LogSnapshot>::None`, which is
/// distinct from a snapshot with empty content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSnapshot {
    content: String,
}

impl LogSnapshot {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Builds a snapshot from stored bytes, replacing invalid UTF-8 sequences
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::new(String::from_utf8_lossy(bytes))
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Lines of the snapshot, split on `\n` with no further normalization
    pub fn lines(&self) -> std::str::Split<'_, char> {
        self.content.split('\n')
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

/// Full text of the remote log file fetched during the current run
///
/// Surrounding whitespace is trimmed on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLogSnapshot {
    content: String,
}

impl RemoteLogSnapshot {
    pub fn from_text(text: &str) -> Self {
        Self {
            content: text.trim().to_string(),
        }
    }

    /// Decodes the concatenated transfer chunks as UTF-8 (lossy) and trims them
    pub fn decode(bytes: &[u8]) -> Self {
        Self::from_text(&String::from_utf8_lossy(bytes))
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn lines(&self) -> std::str::Split<'_, char> {
        self.content.split('\n')
    }
}

impl From<RemoteLogSnapshot> for LogSnapshot {
    fn from(remote: RemoteLogSnapshot) -> Self {
        LogSnapshot::new(remote.content)
    }
}

/// Lines present in the remote log but absent from the previous snapshot
///
/// Stored as the newline-joined text with outer whitespace trimmed, so a batch
/// whose lines are all blank is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLinesBatch {
    text: String,
}

impl NewLinesBatch {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let joined = lines.into_iter().collect::<Vec<_>>().join("\n");
        Self {
            text: joined.trim().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Lines in remote log order
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        (!self.text.is_empty())
            .then(|| self.text.split('\n'))
            .into_iter()
            .flatten()
    }

    pub fn len(&self) -> usize {
        self.lines().count()
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }
}
