use std::path::PathBuf;

/// Error type for email content
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Invalid email address
    #[error("invalid email address: {0:?}")]
    InvalidEmailAddress(String),
    /// No recipient registered before sending
    #[error("missing destination address")]
    MissingTo,
    /// Attachment source could not be read
    #[error("attachment not accessible: {}", .0.display())]
    InaccessibleAttachment(PathBuf),
}

/// Email result type
pub type EmailResult<T> = Result<T, Error>;
