//! Minimal telnet wire decoding.
//!
//! The modem's management port speaks telnet. We never enable any option:
//! every `DO` is answered `WONT`, every `WILL` is answered `DONT`, and
//! sub-negotiation blocks are dropped. What remains is the plain text stream.

pub(crate) const IAC: u8 = 255;
const DONT: u8 = 254;
const DO: u8 = 253;
const WONT: u8 = 252;
const WILL: u8 = 251;
const SB: u8 = 250;
const SE: u8 = 240;
const NUL: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum State {
    #[default]
    Data,
    Iac,
    Negotiate(u8),
    Sub,
    SubIac,
}

/// Incremental decoder; state carries across reads, since a command sequence
/// may be split between two packets.
#[derive(Debug, Default)]
pub struct TelnetDecoder {
    state: State,
}

impl TelnetDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `input`, appending text bytes to `data` and any negotiation
    /// answers that must be sent back to `replies`.
    pub fn feed(&mut self, input: &[u8], data: &mut Vec<u8>, replies: &mut Vec<u8>) {
        for &byte in input {
            self.state = match (self.state, byte) {
                (State::Data, IAC) => State::Iac,
                (State::Data, NUL) => State::Data,
                (State::Data, b) => {
                    data.push(b);
                    State::Data
                }
                (State::Iac, IAC) => {
                    data.push(IAC);
                    State::Data
                }
                (State::Iac, cmd @ (DO | DONT | WILL | WONT)) => State::Negotiate(cmd),
                (State::Iac, SB) => State::Sub,
                // NOP, GA, AYT and friends carry no payload.
                (State::Iac, _) => State::Data,
                (State::Negotiate(cmd), opt) => {
                    match cmd {
                        DO => replies.extend_from_slice(&[IAC, WONT, opt]),
                        WILL => replies.extend_from_slice(&[IAC, DONT, opt]),
                        _ => {}
                    }
                    State::Data
                }
                (State::Sub, IAC) => State::SubIac,
                (State::Sub, _) => State::Sub,
                (State::SubIac, SE) => State::Data,
                (State::SubIac, _) => State::Sub,
            };
        }
    }
}

/// Escapes a literal `0xFF` in outgoing text.
pub fn escape(text: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for &b in text {
        if b == IAC {
            out.push(IAC);
        }
        out.push(b);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> (Vec<u8>, Vec<u8>) {
        let mut decoder = TelnetDecoder::new();
        let (mut data, mut replies) = (Vec::new(), Vec::new());
        decoder.feed(input, &mut data, &mut replies);
        (data, replies)
    }

    #[test]
    fn plain_text_passes_through() {
        let (data, replies) = decode(b"Account:");
        assert_eq!(data, b"Account:");
        assert!(replies.is_empty());
    }

    #[test]
    fn options_are_refused() {
        // IAC DO ECHO, IAC WILL SGA, IAC DONT LINEMODE
        let (data, replies) = decode(&[IAC, DO, 1, IAC, WILL, 3, IAC, DONT, 34, b'o', b'k']);
        assert_eq!(data, b"ok");
        assert_eq!(replies, vec![IAC, WONT, 1, IAC, DONT, 3]);
    }

    #[test]
    fn subnegotiation_is_dropped() {
        let (data, _) = decode(&[b'a', IAC, SB, 24, 1, IAC, IAC, IAC, SE, b'b']);
        assert_eq!(data, b"ab");
    }

    #[test]
    fn escaped_iac_is_data() {
        let (data, _) = decode(&[b'x', IAC, IAC, b'y']);
        assert_eq!(data, vec![b'x', IAC, b'y']);
    }

    #[test]
    fn sequence_split_across_reads() {
        let mut decoder = TelnetDecoder::new();
        let (mut data, mut replies) = (Vec::new(), Vec::new());
        decoder.feed(&[b'a', IAC], &mut data, &mut replies);
        decoder.feed(&[DO], &mut data, &mut replies);
        decoder.feed(&[31, b'b'], &mut data, &mut replies);
        assert_eq!(data, b"ab");
        assert_eq!(replies, vec![IAC, WONT, 31]);
    }

    #[test]
    fn nul_padding_is_stripped() {
        let (data, _) = decode(b"a\r\0b");
        assert_eq!(data, b"a\rb");
    }

    #[test]
    fn escape_doubles_iac() {
        assert_eq!(escape(&[1, IAC, 2]), vec![1, IAC, IAC, 2]);
    }
}
