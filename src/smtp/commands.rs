//! SMTP commands as Display-able values. Each rendering includes the
//! terminating CRLF; the transcript strips it before recording.

use std::fmt::{self, Display, Formatter};

use crate::smtp::authentication::{Credentials, Mechanism};
use crate::types::EmailAddress;

/// Which greeting verb opens the session
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Greeting {
    /// Extended hello, the default
    Ehlo,
    /// Plain `HELO` for legacy servers
    Helo,
}

/// EHLO/HELO command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct HelloCommand {
    pub verb: Greeting,
    pub client_id: String,
}

impl Display for HelloCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let verb = match self.verb {
            Greeting::Ehlo => "EHLO",
            Greeting::Helo => "HELO",
        };
        write!(f, "{} {}\r\n", verb, self.client_id)
    }
}

/// STARTTLS command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct StarttlsCommand;

impl Display for StarttlsCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("STARTTLS\r\n")
    }
}

/// AUTH command with the mechanism's initial response, when it has one
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct AuthCommand {
    pub mechanism: Mechanism,
    pub initial: Option<String>,
}

impl AuthCommand {
    pub fn new(mechanism: Mechanism, credentials: &Credentials) -> AuthCommand {
        AuthCommand {
            mechanism,
            initial: mechanism.initial_response(credentials),
        }
    }
}

impl Display for AuthCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.initial {
            Some(ref initial) => write!(f, "AUTH {} {}\r\n", self.mechanism, initial),
            None => write!(f, "AUTH {}\r\n", self.mechanism),
        }
    }
}

/// A bare line answering a 334 continuation challenge
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ChallengeResponse(pub String);

impl Display for ChallengeResponse {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}\r\n", self.0)
    }
}

/// MAIL FROM command
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MailCommand {
    pub from: EmailAddress,
}

impl Display for MailCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "MAIL FROM:<{}>\r\n", self.from)
    }
}

/// RCPT TO command, with an optional delivery status notification request
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RcptCommand {
    pub to: EmailAddress,
    pub notify: bool,
}

impl Display for RcptCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.notify {
            write!(f, "RCPT TO:<{}> NOTIFY=SUCCESS,FAILURE,DELAY\r\n", self.to)
        } else {
            write!(f, "RCPT TO:<{}>\r\n", self.to)
        }
    }
}

/// DATA command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct DataCommand;

impl Display for DataCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("DATA\r\n")
    }
}

/// QUIT command
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct QuitCommand;

impl Display for QuitCommand {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str("QUIT\r\n")
    }
}
