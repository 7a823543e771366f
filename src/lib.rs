//! Smtp-mailer is a synchronous, direct-to-server SMTP client in Rust.
//!
//! It speaks to a mail server over a plain or TLS socket (implicit TLS or a
//! STARTTLS upgrade), authenticates with `AUTH LOGIN` or `XOAUTH2`, and
//! transmits a MIME message it composed itself: plain text, HTML with a
//! plain-text alternative, or multipart with base64 attachments. No local
//! mail transfer agent is involved, and no state survives the session.
//!
//! ```no_run
//! use smtp_mailer::{BodyMode, Mailer, RecipientKind};
//!
//! let mut mailer = Mailer::new("tls://smtp.example.org", 587);
//! mailer.add_address("to@example.org", Some("Recipient"), RecipientKind::To)?;
//! let response = mailer.send(
//!     "from@example.org",
//!     Some("Sender"),
//!     "Subject",
//!     "Hello",
//!     BodyMode::Text,
//!     None,
//! )?;
//! for entry in mailer.logs() {
//!     println!("{}", entry);
//! }
//! # Ok::<(), smtp_mailer::smtp::error::Error>(())
//! ```

#![deny(
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    missing_debug_implementations,
    clippy::unwrap_used
)]

pub mod error;
mod mailer;
pub mod mime;
pub mod smtp;
pub mod transcript;
mod types;

pub use types::*;

pub use crate::mailer::{ClientSecurity, Mailer};
pub use crate::smtp::authentication::{Credentials, Mechanism};
pub use crate::smtp::client::net::TlsParameters;
pub use crate::smtp::commands::Greeting;
pub use crate::transcript::LogEntry;
