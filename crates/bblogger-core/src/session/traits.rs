//! Abstractions over the network connection so sessions can run against a
//! real modem or a scripted mock.

use std::io::{self, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// Default telnet port.
pub const TELNET_PORT: u16 = 23;

/// A bidirectional byte stream with a settable read timeout.
pub trait Stream: Read + Write {
    /// Bounds the next blocking read. A read that expires must fail with
    /// `WouldBlock` or `TimedOut`.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Releases the connection.
    fn shutdown(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Opens streams to a modem address.
pub trait Connector {
    type Stream: Stream;

    /// Connects to `address` (`host` or `host:port`).
    fn connect(&self, address: &str, timeout: Duration) -> io::Result<Self::Stream>;
}

/// Real TCP connector.
#[derive(Debug, Clone, Copy)]
pub struct TcpConnector {
    default_port: u16,
}

impl Default for TcpConnector {
    fn default() -> Self {
        Self::new(TELNET_PORT)
    }
}

impl TcpConnector {
    /// Creates a connector that uses `default_port` when an address carries
    /// no port of its own.
    pub fn new(default_port: u16) -> Self {
        Self { default_port }
    }

    fn target(&self, address: &str) -> String {
        if address.parse::<SocketAddr>().is_ok() {
            return address.to_string();
        }
        // Bare IP literals, including bracketed IPv6 without a port.
        let bare = address.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare.parse::<IpAddr>() {
            return SocketAddr::new(ip, self.default_port).to_string();
        }
        if address.contains(':') {
            address.to_string()
        } else {
            format!("{}:{}", address, self.default_port)
        }
    }
}

impl Connector for TcpConnector {
    type Stream = TcpStream;

    fn connect(&self, address: &str, timeout: Duration) -> io::Result<TcpStream> {
        let target = self.target(address);
        let mut last_err = None;
        for addr in target.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {}", target),
            )
        }))
    }
}

impl Stream for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn shutdown(&self) -> io::Result<()> {
        TcpStream::shutdown(self, Shutdown::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn target_appends_default_port() {
        let connector = TcpConnector::new(2323);
        assert_eq!(connector.target("192.168.1.1"), "192.168.1.1:2323");
        assert_eq!(connector.target("192.168.1.1:23"), "192.168.1.1:23");
        assert_eq!(connector.target("modem.lan"), "modem.lan:2323");
        assert_eq!(connector.target("modem.lan:23"), "modem.lan:23");
    }

    #[test]
    fn target_brackets_ipv6_literals() {
        let connector = TcpConnector::new(23);
        assert_eq!(connector.target("::1"), "[::1]:23");
        assert_eq!(connector.target("[fe80::1]"), "[fe80::1]:23");
        assert_eq!(connector.target("[::1]:2323"), "[::1]:2323");
    }

    #[test]
    fn connects_to_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let connector = TcpConnector::default();
        let stream = connector.connect(&addr, Duration::from_secs(1)).unwrap();
        assert!(Stream::set_read_timeout(&stream, Some(Duration::from_millis(10))).is_ok());
    }

    #[test]
    fn refused_connection_is_an_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let connector = TcpConnector::new(port);
        assert!(connector.connect("127.0.0.1", Duration::from_secs(1)).is_err());
    }
}
