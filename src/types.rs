use std::ffi::OsStr;
use std::fmt::{self, Display, Formatter};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{EmailResult, Error};
use crate::mime::mime_types::mime_type_for_extension;

/// Email address, lowercased and checked at construction
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new(address: String) -> EmailResult<EmailAddress> {
        // Basic RFC 5321-style checks. They mainly guard against injection of
        // control characters into the SMTP protocol; full semantic validation
        // is left to the server.
        if address.chars().any(|c| {
            !c.is_ascii() || c.is_ascii_control() || c.is_ascii_whitespace() || c == '<' || c == '>'
        }) {
            return Err(Error::InvalidEmailAddress(address));
        }

        let mut parts = address.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();

        if local.is_empty()
            || domain.is_empty()
            || domain.contains('@')
            || local.starts_with('.')
            || local.ends_with('.')
            || local.contains("..")
            || domain.starts_with('.')
            || domain.ends_with('.')
            || domain.starts_with('-')
            || domain.contains("..")
        {
            return Err(Error::InvalidEmailAddress(address));
        }

        Ok(EmailAddress(address.to_ascii_lowercase()))
    }

    /// The part after the `@`, used when building `Message-ID`
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

impl FromStr for EmailAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EmailAddress::new(s.to_string())
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<OsStr> for EmailAddress {
    fn as_ref(&self) -> &OsStr {
        self.0.as_ref()
    }
}

/// An address with an optional display name
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Mailbox {
    pub address: EmailAddress,
    pub name: Option<String>,
}

impl Mailbox {
    pub fn new(address: EmailAddress, name: Option<String>) -> Mailbox {
        Mailbox { address, name }
    }
}

impl Display for Mailbox {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self.name {
            Some(ref name) => write!(f, "\"{}\" <{}>", name, self.address),
            None => write!(f, "<{}>", self.address),
        }
    }
}

/// Where a recipient appears: envelope only, or envelope plus headers
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum RecipientKind {
    To,
    Cc,
    /// Included in the envelope, never rendered in headers
    Bcc,
}

/// A registered recipient. Insertion order is preserved for header rendering.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Recipient {
    pub mailbox: Mailbox,
    pub kind: RecipientKind,
}

/// Body rendering mode for [`crate::Mailer::send`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BodyMode {
    Text,
    Html,
}

/// A file to attach, with its display name and inferred MIME type
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub path: PathBuf,
}

impl Attachment {
    /// Registers a file for attachment. The display name defaults to the file
    /// name; the MIME type is inferred from the extension. Fails if the
    /// source cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P, name: Option<String>) -> EmailResult<Attachment> {
        let path = path.as_ref();

        File::open(path).map_err(|_| Error::InaccessibleAttachment(path.to_path_buf()))?;

        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_string();
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_ascii_lowercase();

        Ok(Attachment {
            name: name.unwrap_or(file_name),
            mime_type: mime_type_for_extension(&extension),
            path: path.to_path_buf(),
        })
    }
}
