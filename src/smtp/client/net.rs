//! A stream that is either plain TCP, TLS-wrapped, or an in-memory mock

use std::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::debug;
use native_tls::{HandshakeError, TlsConnector, TlsStream};

use crate::smtp::client::mock::MockStream;
use crate::smtp::error::Error;

/// Parameters to use for secure clients
#[derive(Clone)]
pub struct TlsParameters {
    /// The domain to send during the TLS handshake
    pub domain: String,
    accept_invalid_certs: bool,
}

impl fmt::Debug for TlsParameters {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("TlsParameters")
            .field("domain", &self.domain)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl TlsParameters {
    /// Creates a `TlsParameters` with certificate verification enabled
    pub fn new(domain: String) -> TlsParameters {
        TlsParameters {
            domain,
            accept_invalid_certs: false,
        }
    }

    /// Disables certificate verification. Verification is on by default;
    /// this is strictly opt-in.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> TlsParameters {
        self.accept_invalid_certs = accept;
        self
    }

    fn connector(&self) -> Result<TlsConnector, native_tls::Error> {
        TlsConnector::builder()
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .danger_accept_invalid_hostnames(self.accept_invalid_certs)
            .build()
    }
}

/// Represents the different types of underlying network streams
pub enum NetworkStream {
    /// Plain TCP stream
    Tcp(TcpStream),
    /// Encrypted TCP stream
    Tls(Box<TlsStream<TcpStream>>),
}

impl fmt::Debug for NetworkStream {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(match self {
            NetworkStream::Tcp(_) => "NetworkStream::Tcp",
            NetworkStream::Tls(_) => "NetworkStream::Tls",
        })
    }
}

impl NetworkStream {
    /// Opens a connection to the first address `addr` resolves to, bounded by
    /// `timeout`, and wraps it in TLS right away when `tls_parameters` is
    /// given (implicit TLS).
    pub fn connect<A: ToSocketAddrs>(
        addr: A,
        timeout: Option<Duration>,
        tls_parameters: Option<&TlsParameters>,
    ) -> Result<NetworkStream, Error> {
        let server_addr: SocketAddr = addr
            .to_socket_addrs()
            .map_err(|_| Error::Resolution)?
            .next()
            .ok_or(Error::Resolution)?;

        debug!("connecting to {}", server_addr);

        let tcp_stream = match timeout {
            Some(duration) => TcpStream::connect_timeout(&server_addr, duration)?,
            None => TcpStream::connect(server_addr)?,
        };

        match tls_parameters {
            Some(context) => {
                let tls_stream =
                    complete_handshake(&context.connector()?, &context.domain, tcp_stream)?;
                Ok(NetworkStream::Tls(Box::new(tls_stream)))
            }
            None => Ok(NetworkStream::Tcp(tcp_stream)),
        }
    }

    /// Upgrades an established plaintext connection to TLS, after `STARTTLS`
    pub fn upgrade_tls(self, tls_parameters: &TlsParameters) -> Result<Self, Error> {
        match self {
            NetworkStream::Tcp(stream) => {
                let tls_stream = complete_handshake(
                    &tls_parameters.connector()?,
                    &tls_parameters.domain,
                    stream,
                )?;
                Ok(NetworkStream::Tls(Box::new(tls_stream)))
            }
            _ => Ok(self),
        }
    }

    /// Is the stream encrypted
    pub fn is_encrypted(&self) -> bool {
        match *self {
            NetworkStream::Tcp(_) => false,
            NetworkStream::Tls(_) => true,
        }
    }

    /// Applies read and write deadlines to the underlying socket. `None`
    /// removes them, restoring unbounded blocking reads.
    pub fn set_timeouts(&self, timeout: Option<Duration>) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref s) => {
                s.set_read_timeout(timeout)?;
                s.set_write_timeout(timeout)
            }
            NetworkStream::Tls(ref s) => {
                s.get_ref().set_read_timeout(timeout)?;
                s.get_ref().set_write_timeout(timeout)
            }
        }
    }
}

/// Drives a blocking native-tls handshake to completion, retrying while the
/// socket reports `WouldBlock` mid-handshake.
fn complete_handshake(
    connector: &TlsConnector,
    domain: &str,
    stream: TcpStream,
) -> Result<TlsStream<TcpStream>, Error> {
    match connector.connect(domain, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(Error::Tls(err)),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(err)) => break Err(Error::Tls(err)),
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}

impl Read for NetworkStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.read(buf),
            NetworkStream::Tls(ref mut s) => s.read(buf),
        }
    }
}

impl Write for NetworkStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.write(buf),
            NetworkStream::Tls(ref mut s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match *self {
            NetworkStream::Tcp(ref mut s) => s.flush(),
            NetworkStream::Tls(ref mut s) => s.flush(),
        }
    }
}

/// Stream-specific operations the low-level client needs besides plain I/O
pub trait Connector: Sized {
    /// Upgrades to TLS connection
    fn upgrade_tls(self, tls_parameters: &TlsParameters) -> Result<Self, Error>;

    /// Is the stream encrypted
    fn is_encrypted(&self) -> bool;
}

impl Connector for NetworkStream {
    fn upgrade_tls(self, tls_parameters: &TlsParameters) -> Result<Self, Error> {
        NetworkStream::upgrade_tls(self, tls_parameters)
    }

    fn is_encrypted(&self) -> bool {
        NetworkStream::is_encrypted(self)
    }
}

impl Connector for MockStream {
    fn upgrade_tls(self, _tls_parameters: &TlsParameters) -> Result<Self, Error> {
        Ok(self)
    }

    fn is_encrypted(&self) -> bool {
        false
    }
}
