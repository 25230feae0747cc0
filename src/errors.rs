//! Handles errors, with a custom [`Result`] and [`Error`] type

use core::{fmt, result};

use crate::{credentials, dedup, fetch, options, removal};

/// Errors that may occur while running the app.
#[derive(Debug)]
pub enum Error {
    /// Failed to load the credentials.
    Credentials(credentials::Error),
    /// Failure occurred while connecting to the IMAP server.
    ImapConnection(fetch::connection::Error),
    /// Failed to load the run options.
    Options(options::Error),
    /// Failure occurred while removing the duplicates.
    Removal(removal::Error),
    /// Failure occurred while looking for duplicates.
    Scan(dedup::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credentials(err) => write!(f, "invalid credentials: {err}"),
            Self::ImapConnection(err) => err.fmt(f),
            Self::Options(err) => write!(f, "invalid options: {err}"),
            Self::Removal(err) => write!(f, "cannot remove duplicates: {err}"),
            Self::Scan(err) => write!(f, "cannot find duplicates: {err}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<credentials::Error> for Error {
    fn from(error: credentials::Error) -> Self {
        Self::Credentials(error)
    }
}

impl From<fetch::connection::Error> for Error {
    fn from(error: fetch::connection::Error) -> Self {
        Self::ImapConnection(error)
    }
}

impl From<options::Error> for Error {
    fn from(error: options::Error) -> Self {
        Self::Options(error)
    }
}

impl From<removal::Error> for Error {
    fn from(error: removal::Error) -> Self {
        Self::Removal(error)
    }
}

impl From<dedup::Error> for Error {
    fn from(error: dedup::Error) -> Self {
        Self::Scan(error)
    }
}

/// Overloaded result for the [`mailbox_dedup`](crate) crate
pub type Result<T = (), E = Error> = result::Result<T, E>;
