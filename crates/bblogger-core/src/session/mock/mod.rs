//! Scripted in-memory modem for testing sessions without a network.
//!
//! [`MockConnector`] hands out [`MockStream`]s that play a [`MockModem`]
//! script: prompt for an account, prompt for a password, then answer known
//! commands followed by the command prompt. Everything the client sends is
//! recorded for assertions.
//!
//! ```
//! use bblogger_core::session::mock::{MockConnector, MockModem};
//!
//! // First cycle refuses the connection, every later one succeeds.
//! let connector = MockConnector::new()
//!     .then_refuse()
//!     .otherwise(MockModem::vigor130());
//! assert_eq!(connector.connections(), 0);
//! ```

mod scenarios;

pub use scenarios::{VIGOR130_ADSL, VIGOR130_STATUS};

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::{self, ErrorKind, Read, Write};
use std::rc::Rc;
use std::time::Duration;

use super::Prompts;
use super::telnet::IAC;
use super::traits::{Connector, Stream};

/// Where a scripted modem stops answering.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Fault {
    /// Goes silent after the password.
    StallLogin,
    /// Goes silent after receiving this command.
    Stall(String),
    /// Drops the connection after receiving this command.
    HangUp(String),
}

/// Script for one mock management session.
#[derive(Debug, Clone)]
pub struct MockModem {
    prompts: Prompts,
    banner: String,
    responses: HashMap<String, String>,
    negotiation: Vec<u8>,
    faults: Vec<Fault>,
}

impl MockModem {
    /// Creates a modem that knows no commands.
    pub fn new(prompts: Prompts) -> Self {
        Self {
            prompts,
            banner: String::new(),
            responses: HashMap::new(),
            negotiation: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Sets the text printed before the account prompt.
    pub fn banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Sets the body printed in answer to `command` (echo and prompt are
    /// added around it).
    pub fn respond(mut self, command: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(command.into(), body.into());
        self
    }

    /// Removes every line containing `needle` from the answer to `command`.
    pub fn strip_line(mut self, command: &str, needle: &str) -> Self {
        if let Some(body) = self.responses.get_mut(command) {
            *body = body
                .split_inclusive('\n')
                .filter(|line| !line.contains(needle))
                .collect();
        }
        self
    }

    /// Opens with `IAC DO ECHO, IAC WILL SGA` before the banner.
    pub fn with_negotiation(mut self) -> Self {
        self.negotiation = vec![IAC, 253, 1, IAC, 251, 3];
        self
    }

    /// Goes silent once the password has been received.
    pub fn stall_on_login(mut self) -> Self {
        self.faults.push(Fault::StallLogin);
        self
    }

    /// Goes silent once `command` has been received.
    pub fn stall_on(mut self, command: impl Into<String>) -> Self {
        self.faults.push(Fault::Stall(command.into()));
        self
    }

    /// Drops the connection once `command` has been received.
    pub fn hang_up_on(mut self, command: impl Into<String>) -> Self {
        self.faults.push(Fault::HangUp(command.into()));
        self
    }
}

/// What the client did, across every connection of one connector.
#[derive(Debug, Default)]
struct MockLog {
    connections: usize,
    lines: Vec<String>,
    negotiation: Vec<u8>,
}

/// Hands out scripted streams, one script per connection.
#[derive(Debug, Default)]
pub struct MockConnector {
    queue: RefCell<VecDeque<Option<MockModem>>>,
    fallback: Option<MockModem>,
    log: Rc<RefCell<MockLog>>,
}

impl MockConnector {
    /// Creates a connector that refuses every connection until scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `modem` on every connection.
    pub fn always(modem: MockModem) -> Self {
        Self::new().otherwise(modem)
    }

    /// Serves `modem` on the next unscripted connection.
    pub fn then(self, modem: MockModem) -> Self {
        self.queue.borrow_mut().push_back(Some(modem));
        self
    }

    /// Refuses the next unscripted connection.
    pub fn then_refuse(self) -> Self {
        self.queue.borrow_mut().push_back(None);
        self
    }

    /// Serves `modem` once the scripted connections are used up.
    pub fn otherwise(mut self, modem: MockModem) -> Self {
        self.fallback = Some(modem);
        self
    }

    /// Number of connection attempts so far.
    pub fn connections(&self) -> usize {
        self.log.borrow().connections
    }

    /// Lines sent by the client, in order, across all connections.
    pub fn sent_lines(&self) -> Vec<String> {
        self.log.borrow().lines.clone()
    }

    /// Raw telnet negotiation bytes sent by the client.
    pub fn negotiation_replies(&self) -> Vec<u8> {
        self.log.borrow().negotiation.clone()
    }
}

impl Connector for MockConnector {
    type Stream = MockStream;

    fn connect(&self, address: &str, _timeout: Duration) -> io::Result<MockStream> {
        self.log.borrow_mut().connections += 1;
        let scripted = self.queue.borrow_mut().pop_front();
        let modem = match scripted {
            Some(Some(modem)) => modem,
            Some(None) => return Err(refused(address)),
            None => self.fallback.clone().ok_or_else(|| refused(address))?,
        };
        Ok(MockStream::new(modem, self.log.clone()))
    }
}

fn refused(address: &str) -> io::Error {
    io::Error::new(
        ErrorKind::ConnectionRefused,
        format!("mock modem at {} refused the connection", address),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Account,
    Password,
    Ready,
    Silent,
    Gone,
}

/// One scripted connection.
#[derive(Debug)]
pub struct MockStream {
    modem: MockModem,
    phase: Phase,
    outbox: VecDeque<u8>,
    inbox: Vec<u8>,
    log: Rc<RefCell<MockLog>>,
}

impl MockStream {
    fn new(modem: MockModem, log: Rc<RefCell<MockLog>>) -> Self {
        let mut outbox = VecDeque::new();
        outbox.extend(modem.negotiation.iter().copied());
        outbox.extend(modem.banner.bytes());
        outbox.extend(modem.prompts.account.bytes());
        Self {
            modem,
            phase: Phase::Account,
            outbox,
            inbox: Vec::new(),
            log,
        }
    }

    fn say(&mut self, text: &str) {
        self.outbox.extend(text.bytes());
    }

    fn on_line(&mut self, line: String) {
        self.log.borrow_mut().lines.push(line.clone());
        match self.phase {
            Phase::Account => {
                self.phase = Phase::Password;
                self.say("\r\n");
                self.say(self.modem.prompts.password);
            }
            Phase::Password => {
                if self.modem.faults.contains(&Fault::StallLogin) {
                    self.phase = Phase::Silent;
                    return;
                }
                self.phase = Phase::Ready;
                self.say("\r\n\r\nType ? for command help\r\n\r\nDrayTek");
                self.say(self.modem.prompts.command);
            }
            Phase::Ready => {
                self.say(&line);
                self.say("\r\n");
                if line == "exit" {
                    self.say("Bye\r\n");
                    self.phase = Phase::Gone;
                } else if self.modem.faults.contains(&Fault::Stall(line.clone())) {
                    self.phase = Phase::Silent;
                } else if self.modem.faults.contains(&Fault::HangUp(line.clone())) {
                    self.phase = Phase::Gone;
                } else {
                    let body = self
                        .modem
                        .responses
                        .get(&line)
                        .cloned()
                        .unwrap_or_else(|| format!("% Unknown command: {}\r\n", line));
                    self.say(&body);
                    self.say("DrayTek");
                    self.say(self.modem.prompts.command);
                }
            }
            Phase::Silent | Phase::Gone => {}
        }
    }
}

impl Read for MockStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.outbox.is_empty() {
            return match self.phase {
                Phase::Gone => Ok(0),
                _ => Err(ErrorKind::WouldBlock.into()),
            };
        }
        let n = buf.len().min(self.outbox.len());
        for (slot, byte) in buf.iter_mut().zip(self.outbox.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for MockStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.phase == Phase::Gone {
            return Err(ErrorKind::BrokenPipe.into());
        }
        if buf.first() == Some(&IAC) {
            self.log.borrow_mut().negotiation.extend_from_slice(buf);
            return Ok(buf.len());
        }
        self.inbox.extend_from_slice(buf);
        while let Some(pos) = self.inbox.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.inbox.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw)
                .trim_end_matches(['\r', '\n'])
                .to_string();
            self.on_line(line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Stream for MockStream {
    fn set_read_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(stream: &mut MockStream) -> String {
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        while let Ok(n) = stream.read(&mut buf) {
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        String::from_utf8_lossy(&out).into_owned()
    }

    #[test]
    fn script_walks_through_login() {
        let connector = MockConnector::always(MockModem::vigor130());
        let mut stream = connector.connect("modem", Duration::from_secs(1)).unwrap();

        assert!(read_all(&mut stream).ends_with("Account:"));
        stream.write_all(b"admin\n").unwrap();
        assert!(read_all(&mut stream).ends_with("Password: "));
        stream.write_all(b"secret\n").unwrap();
        assert!(read_all(&mut stream).ends_with("> "));
        assert_eq!(connector.sent_lines(), vec!["admin", "secret"]);
    }

    #[test]
    fn scripted_connections_run_in_order() {
        let connector = MockConnector::new()
            .then_refuse()
            .then(MockModem::vigor130());

        assert!(connector.connect("modem", Duration::from_secs(1)).is_err());
        assert!(connector.connect("modem", Duration::from_secs(1)).is_ok());
        assert!(connector.connect("modem", Duration::from_secs(1)).is_err());
        assert_eq!(connector.connections(), 3);
    }

    #[test]
    fn strip_line_removes_matching_lines() {
        let modem = MockModem::vigor130().strip_line("show adsl", "NE CRC Count");
        let body = &modem.responses["show adsl"];
        assert!(!body.contains("NE CRC Count"));
        assert!(body.contains("NE ES Count"));
    }
}
