//! SFTP log source
//!
//! Downloads the whole remote log file over an SFTP session. libssh2 is
//! blocking, so the transfer runs on tokio's blocking pool and callers only
//! see a single async `fetch`.

use std::io::{ErrorKind, Read};
use std::net::TcpStream;
use std::ops::Deref;
use std::path::Path;

use logship_core::domain::RemoteLogSnapshot;
use ssh2::{MethodType, Session};
use tracing::{debug, info, warn};

use crate::error::Result;

/// Key exchange preference used when none is configured
///
/// Keeps the legacy SHA-1 groups at the end so older appliances can still
/// negotiate a session.
pub const DEFAULT_KEX_ALGORITHMS: &str = "ecdh-sha2-nistp256,ecdh-sha2-nistp384,ecdh-sha2-nistp521,\
diffie-hellman-group-exchange-sha256,diffie-hellman-group14-sha256,\
diffie-hellman-group14-sha1,diffie-hellman-group-exchange-sha1,diffie-hellman-group1-sha1";

/// Default read size for each transfer chunk
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Connection settings for the remote log file
#[derive(Clone)]
pub struct SftpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Plaintext password; decryption happens before the client is built
    pub password: String,
    pub remote_path: String,
    /// Comma separated key exchange algorithms, passed straight to libssh2
    pub kex_algorithms: String,
    pub chunk_size: usize,
}

impl std::fmt::Debug for SftpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SftpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("remote_path", &self.remote_path)
            .field("kex_algorithms", &self.kex_algorithms)
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

/// Client that reads the remote log file over SFTP
#[derive(Debug, Clone)]
pub struct SftpClient {
    settings: SftpSettings,
}

impl SftpClient {
    pub fn new(settings: SftpSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SftpSettings {
        &self.settings
    }

    /// Fetch the full current contents of the remote log file
    ///
    /// Any connection, authentication or transfer error is returned as is;
    /// there is no partial-read recovery.
    pub async fn fetch(&self) -> Result<RemoteLogSnapshot> {
        let settings = self.settings.clone();
        let bytes = tokio::task::spawn_blocking(move || read_remote_file(&settings)).await??;

        info!(
            "Fetched {} bytes from {}:{}",
            bytes.len(),
            self.settings.host,
            self.settings.remote_path
        );

        Ok(RemoteLogSnapshot::decode(&bytes))
    }
}

/// Blocking transfer: connect, authenticate, read every chunk, disconnect
fn read_remote_file(settings: &SftpSettings) -> Result<Vec<u8>> {
    let session = SessionGuard::connect(settings)?;
    let sftp = session.sftp()?;
    let file = sftp.open(Path::new(&settings.remote_path))?;

    let mut content = Vec::new();
    let mut chunks = 0usize;
    for chunk in ChunkReader::new(file, settings.chunk_size) {
        content.extend_from_slice(&chunk?);
        chunks += 1;
    }

    debug!("Read {} chunk(s) from {}", chunks, settings.remote_path);
    Ok(content)
}

/// SSH session that is always disconnected when dropped
struct SessionGuard {
    session: Session,
}

impl SessionGuard {
    fn connect(settings: &SftpSettings) -> Result<Self> {
        debug!("Connecting to {}:{}", settings.host, settings.port);
        let tcp = TcpStream::connect((settings.host.as_str(), settings.port))?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        let mut guard = Self { session };

        guard
            .session
            .method_pref(MethodType::Kex, &settings.kex_algorithms)?;
        guard.session.handshake()?;
        guard
            .session
            .userauth_password(&settings.username, &settings.password)?;

        debug!("Authenticated as {}", settings.username);
        Ok(guard)
    }
}

impl Deref for SessionGuard {
    type Target = Session;

    fn deref(&self) -> &Session {
        &self.session
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Err(e) = self
            .session
            .disconnect(None, "logship transfer finished", None)
        {
            warn!("Failed to close SSH session cleanly: {}", e);
        }
    }
}

/// Lazy, finite sequence of chunks read from a transfer stream
///
/// Consumes the reader; once the stream ends or fails the iterator is done.
pub struct ChunkReader<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = std::io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(n) => {
                    buf.truncate(n);
                    return Some(Ok(buf));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
