//! Prompt-delimited command/response session with a modem's management port.
//!
//! A [`Session`] wraps one connection for one poll cycle:
//!
//! ```text
//! connect ──► login ──► send_command ─┬─► send_command ──► close
//!             │                       │
//!             │ "Account:"  → account │ "show adsl\n" → text up to "> "
//!             │ "Password: "→ password│
//!             │ "> "                  │
//! ```
//!
//! Every wait for a marker is bounded by the configured read timeout and
//! fails with [`SessionError::Timeout`] when the marker never shows up.
//!
//! # Testing
//!
//! ```
//! use bblogger_core::config::SessionConfig;
//! use bblogger_core::session::{Prompts, Session};
//! use bblogger_core::session::mock::{MockConnector, MockModem};
//! use secrecy::SecretString;
//!
//! let connector = MockConnector::always(MockModem::vigor130());
//! let prompts = Prompts::new("Account:", "Password: ", "> ");
//! let mut session =
//!     Session::connect(&connector, "192.168.1.1", prompts, &SessionConfig::default()).unwrap();
//! session.login("admin", &SecretString::new("admin".into())).unwrap();
//! let status = session.send_command("show status").unwrap();
//! assert!(status.contains("System Uptime:"));
//! session.close();
//! ```

pub mod mock;
mod telnet;
mod traits;

pub use telnet::TelnetDecoder;
pub use traits::{Connector, Stream, TELNET_PORT, TcpConnector};

use std::io::{self, ErrorKind};
use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, trace};

use crate::config::SessionConfig;

/// Session failures. Any of these aborts the current poll cycle.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: io::Error,
    },
    #[error("timed out after {after:?} waiting for {marker:?}")]
    Timeout { marker: String, after: Duration },
    #[error("connection closed while waiting for {marker:?}")]
    Closed { marker: String },
    #[error("network error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SessionError::Timeout { .. })
    }
}

/// Marker strings a device model prints while logging in and between
/// commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompts {
    pub account: &'static str,
    pub password: &'static str,
    pub command: &'static str,
}

impl Prompts {
    pub const fn new(account: &'static str, password: &'static str, command: &'static str) -> Self {
        Self {
            account,
            password,
            command,
        }
    }
}

const READ_CHUNK: usize = 4096;

/// One open management session.
pub struct Session<S: Stream> {
    stream: S,
    decoder: TelnetDecoder,
    /// Decoded text received but not yet returned to a caller.
    pending: Vec<u8>,
    prompts: Prompts,
    read_timeout: Duration,
}

impl<S: Stream> Session<S> {
    /// Opens a connection to `host`.
    pub fn connect<C>(
        connector: &C,
        host: &str,
        prompts: Prompts,
        config: &SessionConfig,
    ) -> Result<Self, SessionError>
    where
        C: Connector<Stream = S>,
    {
        debug!("Connecting to {}", host);
        let stream = connector
            .connect(host, config.connect_timeout)
            .map_err(|source| SessionError::Connect {
                host: host.to_string(),
                source,
            })?;
        Ok(Self {
            stream,
            decoder: TelnetDecoder::new(),
            pending: Vec::new(),
            prompts,
            read_timeout: config.read_timeout,
        })
    }

    /// Runs the account/password handshake and waits for the command prompt.
    pub fn login(&mut self, account: &str, password: &SecretString) -> Result<(), SessionError> {
        self.read_until(self.prompts.account)?;
        self.write_line(account)?;
        self.read_until(self.prompts.password)?;
        self.write_line(password.expose_secret())?;
        self.read_until(self.prompts.command)?;
        debug!("Logged in as {}", account);
        Ok(())
    }

    /// Sends `command` and returns everything up to and including the next
    /// command prompt, echo included.
    pub fn send_command(&mut self, command: &str) -> Result<String, SessionError> {
        self.write_line(command)?;
        let response = self.read_until(self.prompts.command)?;
        trace!("{} -> {} bytes", command, response.len());
        Ok(response)
    }

    /// Says goodbye and drops the connection. Never fails.
    pub fn close(mut self) {
        if let Err(e) = self.write_line("exit") {
            debug!("Session close: exit not sent ({})", e);
        } else if let Err(e) = self.drain() {
            debug!("Session close: drain stopped ({})", e);
        }
        if let Err(e) = self.stream.shutdown() {
            debug!("Session close: shutdown failed ({})", e);
        }
    }

    fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        let mut bytes = telnet::escape(line.as_bytes());
        bytes.push(b'\n');
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        Ok(())
    }

    /// Reads until `marker` appears in the decoded text or the read timeout
    /// expires.
    fn read_until(&mut self, marker: &str) -> Result<String, SessionError> {
        let deadline = Instant::now() + self.read_timeout;
        loop {
            if let Some(end) = find(&self.pending, marker.as_bytes()) {
                let taken: Vec<u8> = self.pending.drain(..end).collect();
                return Ok(String::from_utf8_lossy(&taken).into_owned());
            }

            let remaining = deadline
                .checked_duration_since(Instant::now())
                .filter(|d| !d.is_zero())
                .ok_or_else(|| self.timeout(marker))?;

            match self.fill(remaining) {
                Ok(0) => {
                    return Err(SessionError::Closed {
                        marker: marker.to_string(),
                    });
                }
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(self.timeout(marker));
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Reads until EOF, bounded by the read timeout.
    fn drain(&mut self) -> io::Result<()> {
        let deadline = Instant::now() + self.read_timeout;
        while let Some(remaining) = deadline
            .checked_duration_since(Instant::now())
            .filter(|d| !d.is_zero())
        {
            match self.fill(remaining) {
                Ok(0) => return Ok(()),
                Ok(_) => self.pending.clear(),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// One blocking read. Returns the number of raw bytes received.
    fn fill(&mut self, timeout: Duration) -> io::Result<usize> {
        self.stream.set_read_timeout(Some(timeout))?;
        let mut raw = [0u8; READ_CHUNK];
        let n = self.stream.read(&mut raw)?;
        let mut replies = Vec::new();
        self.decoder.feed(&raw[..n], &mut self.pending, &mut replies);
        if !replies.is_empty() {
            self.stream.write_all(&replies)?;
        }
        Ok(n)
    }

    fn timeout(&self, marker: &str) -> SessionError {
        SessionError::Timeout {
            marker: marker.to_string(),
            after: self.read_timeout,
        }
    }
}

/// Returns the end offset of the first occurrence of `needle`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|start| start + needle.len())
}
