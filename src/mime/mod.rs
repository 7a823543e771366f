//! MIME message composer.
//!
//! Turns the registered recipients, headers and attachments plus the caller's
//! subject/body into a complete RFC 822 payload, ready to be fed through the
//! transparency codec during `DATA`. Four body shapes exist, depending on the
//! body mode and on whether attachments are present:
//!
//! * text without attachments: a bare `text/plain` message, 7bit
//! * text with attachments: `multipart/mixed` around the text part
//! * HTML without attachments: `multipart/alternative` (plain + html, both
//!   quoted-printable)
//! * HTML with attachments: `multipart/mixed` around a nested
//!   `multipart/alternative`

pub mod encoding;
pub mod mime_types;

use std::collections::BTreeMap;
use std::fs;

use chrono::{Local, Utc};
use rand::Rng;

use crate::error::{EmailResult, Error};
use crate::mime::encoding::{base64_wrapped, encoded_word, quoted_printable, strip_tags};
use crate::types::{Attachment, BodyMode, Mailbox, Recipient, RecipientKind};

const EOL: &str = "\r\n";

/// Everything the composer needs, borrowed from the [`crate::Mailer`]
/// registries for the duration of one render.
#[derive(Debug, Clone, Copy)]
pub struct Composer<'a> {
    pub from: &'a Mailbox,
    pub subject: &'a str,
    pub body: &'a str,
    pub mode: BodyMode,
    pub alternate_text: Option<&'a str>,
    pub recipients: &'a [Recipient],
    pub reply_to: Option<&'a Mailbox>,
    pub custom_headers: &'a BTreeMap<String, String>,
    pub attachments: &'a [Attachment],
    pub read_receipt: bool,
}

/// An opaque token used for MIME boundaries and the Message-ID hash
fn random_token() -> String {
    format!("{:032x}", rand::thread_rng().gen::<u128>())
}

/// `"Display Name" <addr>` with the name RFC 2047-encoded when needed
fn format_mailbox(mailbox: &Mailbox) -> String {
    match mailbox.name {
        Some(ref name) => format!("\"{}\" <{}>", encoded_word(name), mailbox.address),
        None => format!("<{}>", mailbox.address),
    }
}

impl<'a> Composer<'a> {
    /// Renders the full message: header block, blank line, body. The SMTP
    /// end-of-data sentinel is not included; transparency and the final dot
    /// are the transport codec's responsibility.
    pub fn render(&self) -> EmailResult<Vec<u8>> {
        let subject: String = self
            .subject
            .trim()
            .chars()
            .filter(|c| *c != '\r' && *c != '\n')
            .collect();
        // CRs are stripped; the quoted-printable encoder and the CRLF join
        // below reintroduce proper line endings
        let body: String = self.body.trim().chars().filter(|c| *c != '\r').collect();

        let boundary_mixed = random_token();
        let boundary_alternative = random_token();

        let mut headers = self.common_headers(&subject);
        let mut contents: Vec<String> = Vec::new();

        match (self.mode, self.attachments.is_empty()) {
            (BodyMode::Text, true) => {
                headers.push("Content-Type: text/plain; charset=\"utf-8\"".to_string());
                headers.push("Content-Transfer-Encoding: 7bit".to_string());
                contents.push(body.replace('\n', EOL));
            }
            (BodyMode::Text, false) => {
                headers.push(format!(
                    "Content-Type: multipart/mixed;{}\tboundary=\"{}\"",
                    EOL, boundary_mixed
                ));
                contents.push(format!("--{}", boundary_mixed));
                contents.push("Content-Type: text/plain; charset=\"utf-8\"".to_string());
                contents.push("Content-Transfer-Encoding: 7bit".to_string());
                contents.push(String::new());
                contents.push(body.replace('\n', EOL));
            }
            (BodyMode::Html, true) => {
                headers.push(format!(
                    "Content-Type: multipart/alternative;{}\tboundary=\"{}\"",
                    EOL, boundary_alternative
                ));
                self.push_alternative(&mut contents, &body, &boundary_alternative);
            }
            (BodyMode::Html, false) => {
                headers.push(format!(
                    "Content-Type: multipart/mixed;{}\tboundary=\"{}\"",
                    EOL, boundary_mixed
                ));
                contents.push(format!("--{}", boundary_mixed));
                contents.push(format!(
                    "Content-Type: multipart/alternative; boundary=\"{}\"",
                    boundary_alternative
                ));
                contents.push(String::new());
                self.push_alternative(&mut contents, &body, &boundary_alternative);
            }
        }

        if !self.attachments.is_empty() {
            for attachment in self.attachments {
                contents.push(String::new());
                contents.push(format!("--{}", boundary_mixed));
                contents.push(format!(
                    "Content-Type: {}; name=\"{}\"",
                    attachment.mime_type, attachment.name
                ));
                contents.push("Content-Transfer-Encoding: base64".to_string());
                contents.push(format!(
                    "Content-Disposition: attachment; filename=\"{}\"",
                    attachment.name
                ));
                contents.push(String::new());

                let data = fs::read(&attachment.path)
                    .map_err(|_| Error::InaccessibleAttachment(attachment.path.clone()))?;
                // base64_wrapped terminates its own lines
                contents.push(base64_wrapped(&data).trim_end().to_string());
            }
            contents.push(format!("--{}--", boundary_mixed));
        }

        let mut message = headers.join(EOL);
        message.push_str(EOL);
        message.push_str(EOL);
        message.push_str(&contents.join(EOL));
        message.push_str(EOL);

        Ok(message.into_bytes())
    }

    /// The header block shared by all body shapes, in a fixed order.
    fn common_headers(&self, subject: &str) -> Vec<String> {
        let mut headers = vec![
            format!(
                "Message-ID: <{}.{}@{}>",
                Utc::now().timestamp(),
                random_token(),
                self.from.address.domain()
            ),
            format!("From: {}", format_mailbox(self.from)),
        ];

        for (key, value) in self.custom_headers {
            headers.push(format!("{}: {}", key, value));
        }

        if let Some(reply_to) = self.reply_to {
            headers.push(format!("Reply-To: {}", format_mailbox(reply_to)));
        }

        let mut to_list = Vec::new();
        let mut cc_list = Vec::new();
        for recipient in self.recipients {
            match recipient.kind {
                RecipientKind::To => to_list.push(format_mailbox(&recipient.mailbox)),
                RecipientKind::Cc => cc_list.push(format_mailbox(&recipient.mailbox)),
                // Bcc stays out of every header
                RecipientKind::Bcc => {}
            }
        }

        headers.push(format!("To: {}", to_list.join(", ")));
        headers.push(format!("CC: {}", cc_list.join(", ")));
        headers.push(format!("Subject: {}", encoded_word(subject)));
        headers.push(format!("Date: {}", Local::now().to_rfc2822()));
        headers.push("Importance: Normal".to_string());
        headers.push("MIME-Version: 1.0".to_string());
        headers.push(format!("Return-Path: <{}>", self.from.address));

        if self.read_receipt {
            let sender = format_mailbox(self.from);
            headers.push(format!("Disposition-Notification-To: {}", sender));
            headers.push(format!("Return-Receipt-To: {}", sender));
        }

        headers
    }

    /// The `multipart/alternative` pair: quoted-printable plain text (either
    /// the supplied alternative or the HTML with tags stripped) followed by
    /// the quoted-printable HTML part.
    fn push_alternative(&self, contents: &mut Vec<String>, body: &str, boundary: &str) {
        let plain = match self.alternate_text {
            Some(text) => text.to_string(),
            None => strip_tags(body),
        };

        contents.push(format!("--{}", boundary));
        contents.push("Content-Type: text/plain; charset=\"UTF-8\"".to_string());
        contents.push("Content-Transfer-Encoding: quoted-printable".to_string());
        contents.push(String::new());
        contents.push(quoted_printable(&plain));
        contents.push(format!("--{}", boundary));
        contents.push("Content-Type: text/html; charset=\"UTF-8\"".to_string());
        contents.push("Content-Transfer-Encoding: quoted-printable".to_string());
        contents.push(String::new());
        contents.push(quoted_printable(body));
        contents.push(format!("--{}--", boundary));
    }
}
