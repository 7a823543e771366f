//! The public mailer: registries plus the `send` orchestration.
//!
//! A `Mailer` accumulates recipients, custom headers and attachments, then
//! `send` runs one complete SMTP session: compose the MIME payload, connect,
//! handshake, deliver, quit. One message per session; the connection is
//! closed on every exit path and the registries are cleared only after a
//! clean QUIT.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::{EmailResult, Error as EmailError};
use crate::mime::Composer;
use crate::smtp::authentication::{Credentials, Mechanism};
use crate::smtp::client::net::{Connector, TlsParameters};
use crate::smtp::commands::Greeting;
use crate::smtp::error::{Error, SmtpResult};
use crate::smtp::response::Response;
use crate::smtp::session::Session;
use crate::transcript::{LogEntry, Transcript};
use crate::types::{Attachment, BodyMode, EmailAddress, Mailbox, Recipient, RecipientKind};

/// How to apply TLS to a client connection
#[derive(Debug)]
pub enum ClientSecurity {
    /// Plaintext connection only
    None,
    /// Plaintext connection, upgraded with `STARTTLS` after the greeting
    Starttls(TlsParameters),
    /// TLS wrapped connection from the first byte (implicit TLS)
    Wrapper(TlsParameters),
}

/// Bound on the blocking connect call
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
/// Default read/write deadline for the rest of the session
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A single-use SMTP mail sender
#[derive(Debug)]
pub struct Mailer {
    host: String,
    port: u16,
    security: ClientSecurity,
    credentials: Option<(Credentials, Mechanism)>,
    /// Name sent during EHLO/HELO
    hello_name: String,
    greeting: Greeting,
    connect_timeout: Option<Duration>,
    timeout: Option<Duration>,
    read_receipt: bool,
    delivery_status: bool,
    recipients: Vec<Recipient>,
    reply_to: Option<Mailbox>,
    attachments: Vec<Attachment>,
    headers: BTreeMap<String, String>,
    transcript: Transcript,
}

fn default_hello_name() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

impl Mailer {
    /// Creates a mailer for the given server. A `tls://` prefix on the host
    /// requests a STARTTLS upgrade after the greeting; use
    /// [`Mailer::security`] with [`ClientSecurity::Wrapper`] for implicit
    /// TLS instead.
    pub fn new(host: &str, port: u16) -> Mailer {
        let (host, security) = match host.strip_prefix("tls://") {
            Some(stripped) => (
                stripped.to_string(),
                ClientSecurity::Starttls(TlsParameters::new(stripped.to_string())),
            ),
            None => (host.to_string(), ClientSecurity::None),
        };

        Mailer {
            host,
            port,
            security,
            credentials: None,
            hello_name: default_hello_name(),
            greeting: Greeting::Ehlo,
            connect_timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            timeout: Some(DEFAULT_TIMEOUT),
            read_receipt: false,
            delivery_status: false,
            recipients: Vec::new(),
            reply_to: None,
            attachments: Vec::new(),
            headers: BTreeMap::new(),
            transcript: Transcript::new(),
        }
    }

    /// Set the client credentials and the mechanism to authenticate with
    pub fn credentials(mut self, credentials: Credentials, mechanism: Mechanism) -> Mailer {
        self.credentials = Some((credentials, mechanism));
        self
    }

    /// Set the TLS behavior, replacing whatever the host prefix selected
    pub fn security(mut self, security: ClientSecurity) -> Mailer {
        self.security = security;
        self
    }

    /// Set the name used during EHLO/HELO
    pub fn hello_name(mut self, name: &str) -> Mailer {
        self.hello_name = name.to_string();
        self
    }

    /// Set the greeting verb; `EHLO` unless a legacy server needs `HELO`
    pub fn greeting(mut self, greeting: Greeting) -> Mailer {
        self.greeting = greeting;
        self
    }

    /// Set the read/write deadline for the session. `None` means reads may
    /// block indefinitely.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Mailer {
        self.timeout = timeout;
        self
    }

    /// Set the bound on the blocking connect call
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Mailer {
        self.connect_timeout = timeout;
        self
    }

    /// Request a read receipt via `Disposition-Notification-To`
    pub fn enable_read_receipt(&mut self) {
        self.read_receipt = true;
    }

    /// Request delivery status notifications on every `RCPT TO`
    pub fn enable_delivery_status(&mut self) {
        self.delivery_status = true;
    }

    /// Registers a recipient. The address is validated and lowercased;
    /// rejections are recorded in the session log and leave the registry
    /// untouched.
    pub fn add_address(
        &mut self,
        email: &str,
        name: Option<&str>,
        kind: RecipientKind,
    ) -> EmailResult<()> {
        let address = self.validated(email)?;
        self.recipients.push(Recipient {
            mailbox: Mailbox::new(address, name.map(str::to_string)),
            kind,
        });
        Ok(())
    }

    /// Sets the reply-to address, subject to the same validation
    pub fn set_reply_to(&mut self, email: &str, name: Option<&str>) -> EmailResult<()> {
        let address = self.validated(email)?;
        self.reply_to = Some(Mailbox::new(address, name.map(str::to_string)));
        Ok(())
    }

    /// Registers a file for attachment; fails if the source is not readable
    pub fn add_attachment<P: AsRef<Path>>(&mut self, path: P, name: Option<&str>) -> EmailResult<()> {
        match Attachment::from_path(path.as_ref(), name.map(str::to_string)) {
            Ok(attachment) => {
                self.attachments.push(attachment);
                Ok(())
            }
            Err(err) => {
                self.transcript.record(format!(
                    "\"{}\" is not accessible.",
                    path.as_ref().display()
                ));
                Err(err)
            }
        }
    }

    /// Upserts a custom header; the last write for a key wins
    pub fn add_header(&mut self, key: &str, value: &str) {
        self.headers.insert(key.to_string(), value.to_string());
    }

    /// The session log so far, oldest entry first
    pub fn logs(&self) -> &[LogEntry] {
        self.transcript.entries()
    }

    /// Composes the message and runs the full SMTP session.
    ///
    /// Input validation failures are reported before any network I/O. A
    /// protocol failure tears the session down with QUIT; transport failures
    /// just drop the connection. On success the registries are cleared and
    /// the server's final DATA reply is returned.
    pub fn send(
        &mut self,
        from: &str,
        from_name: Option<&str>,
        subject: &str,
        body: &str,
        mode: BodyMode,
        alternate_text: Option<&str>,
    ) -> Result<Response, Error> {
        let from = self.validated(from)?;

        if self.recipients.is_empty() {
            self.transcript.record("There is no recipient added.");
            return Err(EmailError::MissingTo.into());
        }

        let from_mailbox = Mailbox::new(from.clone(), from_name.map(str::to_string));
        let composer = Composer {
            from: &from_mailbox,
            subject,
            body,
            mode,
            alternate_text,
            recipients: &self.recipients,
            reply_to: self.reply_to.as_ref(),
            custom_headers: &self.headers,
            attachments: &self.attachments,
            read_receipt: self.read_receipt,
        };
        let message = match composer.render() {
            Ok(message) => message,
            Err(err) => {
                self.transcript.record(err.to_string());
                return Err(err.into());
            }
        };

        let (wrapper, starttls) = match self.security {
            ClientSecurity::None => (None, None),
            ClientSecurity::Starttls(ref tls_parameters) => (None, Some(tls_parameters)),
            ClientSecurity::Wrapper(ref tls_parameters) => (Some(tls_parameters), None),
        };

        let mut session = Session::connect(
            &self.host,
            self.port,
            self.connect_timeout,
            self.timeout,
            wrapper,
            &mut self.transcript,
        )?;

        let result = transact(
            &mut session,
            self.greeting,
            &self.hello_name,
            starttls,
            self.credentials.as_ref(),
            &from,
            &self.recipients,
            self.delivery_status,
            &message,
        );

        match result {
            Ok(response) => {
                session.quit();
                drop(session);
                self.recipients.clear();
                self.reply_to = None;
                self.attachments.clear();
                self.headers.clear();
                Ok(response)
            }
            Err(err) => {
                // a dead transport cannot carry a QUIT
                match err {
                    Error::Io(_) | Error::Tls(_) => session.close(),
                    _ => session.quit(),
                }
                drop(session);
                self.transcript.record(err.to_string());
                Err(err)
            }
        }
    }

    fn validated(&mut self, email: &str) -> Result<EmailAddress, EmailError> {
        EmailAddress::new(email.to_string()).map_err(|err| {
            self.transcript
                .record(format!("\"{}\" is not a valid email address.", email));
            err
        })
    }
}

/// The protocol steps between an established connection and the final DATA
/// reply. Split out so the caller can tear the session down uniformly on any
/// error.
#[allow(clippy::too_many_arguments)]
fn transact<S: Connector + std::io::Read + std::io::Write>(
    session: &mut Session<S>,
    greeting: Greeting,
    hello_name: &str,
    starttls: Option<&TlsParameters>,
    credentials: Option<&(Credentials, Mechanism)>,
    from: &EmailAddress,
    recipients: &[Recipient],
    notify: bool,
    message: &[u8],
) -> SmtpResult {
    session.banner()?;
    session.hello(greeting, hello_name)?;

    if let Some(tls_parameters) = starttls {
        session.starttls(tls_parameters)?;
        // greet again, this time over the encrypted channel
        session.hello(greeting, hello_name)?;
    }

    if let Some((credentials, mechanism)) = credentials {
        session.authenticate(*mechanism, credentials)?;
    }

    session.envelope(from, recipients, notify)?;
    session.send_data(message)
}
