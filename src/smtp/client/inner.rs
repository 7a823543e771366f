use std::fmt::Display;
use std::io::{self, BufRead, Write};

use bufstream::BufStream;
use log::debug;

use crate::smtp::client::net::Connector;
use crate::smtp::client::ClientCodec;
use crate::smtp::error::{Error, SmtpResult};
use crate::smtp::response::parse_response;

/// Returns the string replacing all the CRLF with "\<CRLF\>"
/// Used for debug displays
fn escape_crlf(string: &str) -> String {
    string.replace("\r\n", "<CRLF>")
}

/// Structure that implements the low-level SMTP client
///
/// It owns the buffered stream and knows how to write command lines and read
/// back complete (possibly multi-line) replies. It knows nothing about the
/// order of the SMTP conversation; that is the session's business.
pub struct InnerClient<S: Connector + io::Read + Write> {
    /// Buffered stream between client and server
    /// Value is None before connection
    stream: Option<BufStream<S>>,
}

impl<S: Connector + io::Read + Write> std::fmt::Debug for InnerClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("InnerClient")
            .field("connected", &self.stream.is_some())
            .finish()
    }
}

impl<S: Connector + io::Read + Write> InnerClient<S> {
    /// Creates a new SMTP client
    ///
    /// It does not connect to the server, but only creates the `InnerClient`
    pub fn new() -> InnerClient<S> {
        InnerClient { stream: None }
    }

    /// Sets the underlying stream.
    pub fn set_stream(&mut self, stream: S) {
        self.stream = Some(BufStream::new(stream));
    }

    /// Tells if the underlying stream is currently encrypted
    pub fn is_encrypted(&self) -> bool {
        self.stream
            .as_ref()
            .map(|s| s.get_ref().is_encrypted())
            .unwrap_or(false)
    }

    /// Upgrades the underlying connection to SSL/TLS in place
    pub fn upgrade_tls_stream(
        &mut self,
        tls_parameters: &crate::smtp::client::net::TlsParameters,
    ) -> Result<(), Error> {
        match self.stream.take() {
            Some(stream) => {
                let plain = stream.into_inner().map_err(|err| {
                    Error::Io(io::Error::new(io::ErrorKind::Other, err.to_string()))
                })?;
                self.stream = Some(BufStream::new(plain.upgrade_tls(tls_parameters)?));
                Ok(())
            }
            None => Err(Error::NoStream),
        }
    }

    /// Drops the connection. Idempotent.
    pub fn close(&mut self) {
        self.stream = None;
    }

    /// Sends an SMTP command and reads the reply
    pub fn command<C: Display>(&mut self, command: C) -> SmtpResult {
        self.write(command.to_string().as_bytes())?;
        self.read_response()
    }

    /// Sends the message payload through the transparency codec, terminates
    /// it with the end-of-data sequence and reads the final reply.
    pub fn message(&mut self, message: &[u8]) -> SmtpResult {
        let mut codec = ClientCodec::new();

        let stream = self.stream.as_mut().ok_or(Error::NoStream)?;
        codec.encode(message, stream)?;
        codec.encode(&[], stream)?;
        stream.flush()?;

        debug!(">> [{} bytes of message data]", message.len());

        self.read_response()
    }

    /// Writes a string to the server
    pub fn write(&mut self, string: &[u8]) -> Result<(), Error> {
        let stream = self.stream.as_mut().ok_or(Error::NoStream)?;

        stream.write_all(string)?;
        stream.flush()?;

        debug!(
            ">> {}",
            escape_crlf(String::from_utf8_lossy(string).as_ref())
        );
        Ok(())
    }

    /// Reads a complete SMTP reply, accumulating lines until the terminator.
    /// Negative replies come back as `Transient`/`Permanent` errors.
    pub fn read_response(&mut self) -> SmtpResult {
        let stream = self.stream.as_mut().ok_or(Error::NoStream)?;

        let mut buffer = String::with_capacity(100);

        while stream.read_line(&mut buffer)? > 0 {
            debug!("<< {}", escape_crlf(&buffer));
            match parse_response(&buffer) {
                Ok((_remaining, response)) => {
                    if response.is_positive() {
                        return Ok(response);
                    }

                    return Err(response.into());
                }
                Err(nom::Err::Incomplete(_)) => { /* read more */ }
                Err(nom::Err::Failure(e)) => {
                    return Err(Error::Parsing(e.code));
                }
                Err(nom::Err::Error(e)) => {
                    return Err(Error::Parsing(e.code));
                }
            }
        }

        Err(io::Error::new(io::ErrorKind::Other, "incomplete").into())
    }
}
