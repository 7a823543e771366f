//! The SMTP conversation, one step per method.
//!
//! A `Session` drives the command/reply sequence over an [`InnerClient`]:
//! banner, greeting, optional STARTTLS upgrade, authentication, envelope,
//! DATA and QUIT. Each step requires a specific reply code; a positive reply
//! with the wrong code is as fatal as a negative one. Every command sent and
//! every reply line received is recorded in the transcript.

use std::fmt::Display;
use std::io::{Read, Write};
use std::time::Duration;

use crate::smtp::authentication::{login_secret, login_username, Credentials, Mechanism};
use crate::smtp::client::net::{Connector, NetworkStream, TlsParameters};
use crate::smtp::client::InnerClient;
use crate::smtp::commands::*;
use crate::smtp::error::{Error, SmtpResult};
use crate::smtp::response::Response;
use crate::transcript::Transcript;
use crate::types::{EmailAddress, Recipient};

/// An established connection being walked through the SMTP dialogue
#[derive(Debug)]
pub struct Session<'a, S: Connector + Read + Write = NetworkStream> {
    client: InnerClient<S>,
    transcript: &'a mut Transcript,
}

/// Fails the step when the server's (positive) reply carries the wrong code
fn expect(reply: Response, expected: u16) -> SmtpResult {
    if reply.has_code(expected) {
        Ok(reply)
    } else {
        Err(Error::UnexpectedReply {
            expected,
            got: reply,
        })
    }
}

impl<'a> Session<'a, NetworkStream> {
    /// Opens the TCP connection (TLS-wrapped when `wrapper` is given) and
    /// applies the read/write deadlines. No SMTP traffic happens yet.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Option<Duration>,
        timeout: Option<Duration>,
        wrapper: Option<&TlsParameters>,
        transcript: &'a mut Transcript,
    ) -> Result<Self, Error> {
        transcript.record(format!("Connecting to \"{}:{}\".", host, port));

        let stream = match NetworkStream::connect((host, port), connect_timeout, wrapper) {
            Ok(stream) => stream,
            Err(err) => {
                transcript.record(format!("Connection failed: {}", err));
                return Err(err);
            }
        };
        stream.set_timeouts(timeout)?;

        transcript.record("Connection established.");

        let mut client = InnerClient::new();
        client.set_stream(stream);

        Ok(Session { client, transcript })
    }
}

impl<'a, S: Connector + Read + Write> Session<'a, S> {
    /// Wraps an already-open stream, used by tests with a scripted mock
    pub fn from_stream(stream: S, transcript: &'a mut Transcript) -> Self {
        let mut client = InnerClient::new();
        client.set_stream(stream);
        Session { client, transcript }
    }

    /// Reads the server banner; requires 220
    pub fn banner(&mut self) -> SmtpResult {
        let result = self.client.read_response();
        expect(self.record_result(result)?, 220)
    }

    /// Greets with EHLO or HELO; requires 250
    pub fn hello(&mut self, verb: Greeting, client_id: &str) -> SmtpResult {
        let reply = self.command(HelloCommand {
            verb,
            client_id: client_id.to_string(),
        })?;
        expect(reply, 250)
    }

    /// Sends STARTTLS (requires 220) and upgrades the stream in place. The
    /// caller re-greets afterwards, over the encrypted channel.
    pub fn starttls(&mut self, tls_parameters: &TlsParameters) -> Result<(), Error> {
        let reply = self.command(StarttlsCommand)?;
        expect(reply, 220)?;
        self.client.upgrade_tls_stream(tls_parameters)
    }

    /// Runs the handshake of the configured mechanism; both paths must end
    /// with 235.
    pub fn authenticate(&mut self, mechanism: Mechanism, credentials: &Credentials) -> SmtpResult {
        match mechanism {
            Mechanism::Login => {
                let reply = self.command(AuthCommand::new(mechanism, credentials))?;
                expect(reply, 334)?;
                let reply = self.command(ChallengeResponse(login_username(credentials)))?;
                expect(reply, 334)?;
                let reply = self.command(ChallengeResponse(login_secret(credentials)))?;
                expect(reply, 235)
            }
            Mechanism::Xoauth2 => {
                let reply = self.command(AuthCommand::new(mechanism, credentials))?;
                expect(reply, 235)
            }
        }
    }

    /// MAIL FROM plus one RCPT TO per recipient, in insertion order, each
    /// requiring 250
    pub fn envelope(
        &mut self,
        from: &EmailAddress,
        recipients: &[Recipient],
        notify: bool,
    ) -> Result<(), Error> {
        let reply = self.command(MailCommand { from: from.clone() })?;
        expect(reply, 250)?;

        for recipient in recipients {
            let reply = self.command(RcptCommand {
                to: recipient.mailbox.address.clone(),
                notify,
            })?;
            expect(reply, 250)?;
        }

        Ok(())
    }

    /// DATA (requires 354), then the payload through the transparency codec,
    /// then the final reply (requires 250). The payload itself is not echoed
    /// into the transcript; a size note stands in for it.
    pub fn send_data(&mut self, message: &[u8]) -> SmtpResult {
        let reply = self.command(DataCommand)?;
        expect(reply, 354)?;

        self.transcript
            .record(format!("# [message data, {} bytes]", message.len()));
        let result = self.client.message(message);
        expect(self.record_result(result)?, 250)
    }

    /// Sends QUIT (reply errors are ignored at this point) and drops the
    /// connection.
    pub fn quit(&mut self) {
        self.transcript.record_command("QUIT");
        if self.client.write(QuitCommand.to_string().as_bytes()).is_ok() {
            let result = self.client.read_response();
            let _ = self.record_result(result);
        }
        self.client.close();
    }

    /// Drops the connection without the QUIT exchange, for transport-level
    /// failures where the peer is already gone.
    pub fn close(&mut self) {
        self.client.close();
    }

    pub fn is_encrypted(&self) -> bool {
        self.client.is_encrypted()
    }

    fn command<C: Display>(&mut self, command: C) -> SmtpResult {
        let text = command.to_string();
        self.transcript.record_command(text.trim_end());
        self.client.write(text.as_bytes())?;
        let result = self.client.read_response();
        self.record_result(result)
    }

    /// Mirrors every reply line into the transcript, whether the reply was
    /// positive or came back as a Transient/Permanent error.
    fn record_result(&mut self, result: SmtpResult) -> SmtpResult {
        match &result {
            Ok(reply) | Err(Error::Transient(reply)) | Err(Error::Permanent(reply)) => {
                for line in reply.lines() {
                    self.transcript.record(line);
                }
            }
            Err(_) => {}
        }
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::smtp::client::mock::MockStream;

    fn recipient(addr: &str) -> Recipient {
        Recipient {
            mailbox: crate::types::Mailbox::new(addr.parse().unwrap(), None),
            kind: crate::types::RecipientKind::To,
        }
    }

    #[test]
    fn test_happy_path() {
        let script = b"220 mail.example.org ESMTP\r\n\
              250 mail.example.org\r\n\
              235 2.7.0 accepted\r\n\
              250 sender ok\r\n\
              250 recipient ok\r\n\
              354 go ahead\r\n\
              250 queued\r\n\
              221 bye\r\n";

        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        assert!(session.banner().is_ok());
        assert!(session.hello(Greeting::Ehlo, "client.example.org").is_ok());
        let credentials = Credentials::new("user".to_string(), "token".to_string());
        assert!(session.authenticate(Mechanism::Xoauth2, &credentials).is_ok());
        let from: EmailAddress = "sender@example.org".parse().unwrap();
        assert!(session
            .envelope(&from, &[recipient("rcpt@example.org")], false)
            .is_ok());
        assert!(session.send_data(b"Subject: hi\r\n\r\nhello\r\n").is_ok());
        session.quit();

        let lines: Vec<&str> = transcript.entries().iter().map(|e| e.line.as_str()).collect();
        assert!(lines.contains(&"# EHLO client.example.org"));
        assert!(lines.contains(&"# MAIL FROM:<sender@example.org>"));
        assert!(lines.contains(&"# RCPT TO:<rcpt@example.org>"));
        assert!(lines.contains(&"# DATA"));
        assert!(lines.contains(&"# [message data, 22 bytes]"));
        assert!(lines.contains(&"250 queued"));
        assert!(lines.contains(&"# QUIT"));
        assert!(lines.contains(&"221 bye"));
    }

    #[test]
    fn test_wrong_positive_code_is_fatal() {
        // banner is fine, but EHLO answered with 220 instead of 250
        let script = b"220 mail.example.org ESMTP\r\n220 what\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        assert!(session.banner().is_ok());
        match session.hello(Greeting::Ehlo, "client") {
            Err(Error::UnexpectedReply { expected: 250, got }) => assert!(got.has_code(220)),
            other => panic!("expected code mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_starttls_then_regreet() {
        let script = b"220 2.0.0 ready to start TLS\r\n250 mail.example.org\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        let tls_parameters = TlsParameters::new("mail.example.org".to_string());
        assert!(session.starttls(&tls_parameters).is_ok());
        assert!(session.hello(Greeting::Ehlo, "client.example.org").is_ok());

        let lines: Vec<&str> = transcript.entries().iter().map(|e| e.line.as_str()).collect();
        let upgrade = lines.iter().position(|l| *l == "# STARTTLS").unwrap();
        let regreet = lines
            .iter()
            .position(|l| *l == "# EHLO client.example.org")
            .unwrap();
        assert!(upgrade < regreet);
    }

    #[test]
    fn test_starttls_wrong_code_is_fatal() {
        // positive reply, but not the 220 the upgrade requires
        let script = b"250 not today\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        let tls_parameters = TlsParameters::new("mail.example.org".to_string());
        match session.starttls(&tls_parameters) {
            Err(Error::UnexpectedReply { expected: 220, got }) => assert!(got.has_code(250)),
            other => panic!("expected code mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_starttls_refused() {
        let script = b"454 4.7.0 TLS not available\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        let tls_parameters = TlsParameters::new("mail.example.org".to_string());
        assert!(matches!(
            session.starttls(&tls_parameters),
            Err(Error::Transient(_))
        ));
        let lines: Vec<&str> = transcript.entries().iter().map(|e| e.line.as_str()).collect();
        assert!(lines.contains(&"454 4.7.0 TLS not available"));
    }

    #[test]
    fn test_login_challenge_sequence() {
        let script = b"334 VXNlcm5hbWU6\r\n334 UGFzc3dvcmQ6\r\n235 ok\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        let credentials = Credentials::new("user".to_string(), "pass".to_string());
        assert!(session.authenticate(Mechanism::Login, &credentials).is_ok());

        let lines: Vec<&str> = transcript.entries().iter().map(|e| e.line.as_str()).collect();
        assert!(lines.contains(&"# AUTH LOGIN"));
        assert!(lines.contains(&format!("# {}", base64::encode("user")).as_str()));
        assert!(lines.contains(&format!("# {}", base64::encode("pass")).as_str()));
    }

    #[test]
    fn test_auth_rejected() {
        let script = b"535 5.7.8 bad credentials\r\n";
        let mut transcript = Transcript::new();
        let mut session = Session::from_stream(MockStream::with_vec(script.to_vec()), &mut transcript);

        let credentials = Credentials::new("user".to_string(), "token".to_string());
        assert!(matches!(
            session.authenticate(Mechanism::Xoauth2, &credentials),
            Err(Error::Permanent(_))
        ));
        let lines: Vec<&str> = transcript.entries().iter().map(|e| e.line.as_str()).collect();
        assert!(lines.contains(&"535 5.7.8 bad credentials"));
    }
}
