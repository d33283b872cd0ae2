//! Syslog collector client
//!
//! Forwards log lines to a remote collector as RFC 5424 messages over TCP,
//! one newline-terminated message per line. Every message carries the
//! configured hostname and program name so the collector can tell sources
//! apart.

use chrono::{DateTime, SecondsFormat, Utc};
use logship_core::domain::NewLinesBatch;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::Result;

/// Facility `user` (1) with severity `informational` (6)
const PRIORITY: u8 = 14;

/// RFC 5424 length limits for the HOSTNAME and APP-NAME header fields
const MAX_HOSTNAME_LEN: usize = 255;
const MAX_APP_NAME_LEN: usize = 48;

/// Collector connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorSettings {
    pub host: String,
    pub port: u16,
    /// Reported as the syslog HOSTNAME of every forwarded line
    pub hostname: String,
    /// Reported as the syslog APP-NAME of every forwarded line
    pub program: String,
}

/// Client that ships batches of lines to a syslog collector
#[derive(Debug, Clone)]
pub struct SyslogClient {
    settings: CollectorSettings,
}

impl SyslogClient {
    pub fn new(settings: CollectorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CollectorSettings {
        &self.settings
    }

    /// Human readable source identifier, `hostname/program`
    pub fn source_tag(&self) -> String {
        format!(
            "{}/{}",
            header_field(&self.settings.hostname, MAX_HOSTNAME_LEN),
            header_field(&self.settings.program, MAX_APP_NAME_LEN)
        )
    }

    /// Render one line as a newline-terminated RFC 5424 message
    pub fn format_line(&self, line: &str, timestamp: DateTime<Utc>) -> String {
        format!(
            "<{}>1 {} {} {} - - - {}\n",
            PRIORITY,
            timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            header_field(&self.settings.hostname, MAX_HOSTNAME_LEN),
            header_field(&self.settings.program, MAX_APP_NAME_LEN),
            line
        )
    }

    /// Send every line of the batch, in order, over one connection
    ///
    /// Fails as a whole if the collector cannot be reached. Once connected,
    /// only connection-level write errors are reported; the collector sends
    /// no per-line acknowledgement. Returns the number of lines written.
    pub async fn send_batch(&self, batch: &NewLinesBatch) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let mut stream =
            TcpStream::connect((self.settings.host.as_str(), self.settings.port)).await?;
        debug!(
            "Connected to collector {}:{}",
            self.settings.host, self.settings.port
        );

        let mut sent = 0;
        for line in batch.lines() {
            let message = self.format_line(line, Utc::now());
            stream.write_all(message.as_bytes()).await?;
            sent += 1;
        }

        stream.flush().await?;
        stream.shutdown().await?;

        debug!("Wrote {} line(s) as {}", sent, self.source_tag());
        Ok(sent)
    }
}

/// Syslog header fields are printable ASCII without spaces, at most
/// `max_len` characters; `-` means nil
fn header_field(value: &str, max_len: usize) -> String {
    let cleaned: String = value
        .chars()
        .map(|c| if c.is_ascii_graphic() { c } else { '-' })
        .take(max_len)
        .collect();
    if cleaned.is_empty() {
        "-".to_string()
    } else {
        cleaned
    }
}
