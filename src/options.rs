//! Options of a deduplication run, loaded like the
//! [`Credentials`](crate::credentials::Credentials).
//!
//! ```env
//! MAILBOX=INBOX
//! LIST_ONLY_DUPS=false
//! IGNORE_MESSAGE_ID=false
//! DRY_RUN=true
//! ```

use core::fmt;
use std::env::var;

use crate::credentials::{self, load_dotenv};
use crate::dedup::Verbosity;
use crate::fingerprint::Mode;

/// What to deduplicate and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Only report the duplicates, and not what would be removed
    pub dry_run: bool,
    /// Mailbox to remove duplicates from
    pub mailbox: String,
    /// How emails are identified
    pub mode: Mode,
    /// Which emails are reported while scanning
    pub verbosity: Verbosity,
}

impl Options {
    /// Key id for the dry run flag.
    const DRY_RUN: &'static str = "DRY_RUN";
    /// Key id for the flag that forces hashing the envelopes.
    const IGNORE_MESSAGE_ID: &'static str = "IGNORE_MESSAGE_ID";
    /// Key id for the flag that only reports duplicates.
    const LIST_ONLY_DUPS: &'static str = "LIST_ONLY_DUPS";
    /// Key id for the mailbox name.
    const MAILBOX: &'static str = "MAILBOX";

    /// Loads the options from the `.env` file and the environment.
    pub fn load() -> Result<Self, Error> {
        load_dotenv()?;
        Self::from_lookup(|key| var(key).ok())
    }

    /// Loads the options from a lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let flag =
            |key: &'static str| lookup(key).map_or(Ok(false), |value| parse_flag(key, &value));

        let mailbox = lookup(Self::MAILBOX)
            .filter(|name| !name.is_empty())
            .ok_or(Error::MissingMailbox)?;
        let mode = if flag(Self::IGNORE_MESSAGE_ID)? { Mode::ContentHash } else { Mode::MessageId };
        let verbosity =
            if flag(Self::LIST_ONLY_DUPS)? { Verbosity::DuplicatesOnly } else { Verbosity::All };
        let dry_run = flag(Self::DRY_RUN)?;

        Ok(Self { dry_run, mailbox, mode, verbosity })
    }
}

/// Reads a boolean flag.
fn parse_flag(key: &'static str, value: &str) -> Result<bool, Error> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidFlag(key, value.to_owned())),
    }
}

/// Errors that may occur while loading the options.
#[derive(Debug)]
pub enum Error {
    /// Failed to load the `.env` file.
    Env(credentials::Error),
    /// A flag is not a boolean.
    InvalidFlag(&'static str, String),
    /// No mailbox was given.
    MissingMailbox,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Env(err) => err.fmt(f),
            Self::InvalidFlag(key, value) => write!(f, "{key} must be a boolean, found {value:?}"),
            Self::MissingMailbox => f.write_str("missing variable MAILBOX"),
        }
    }
}

impl std::error::Error for Error {}

impl From<credentials::Error> for Error {
    fn from(error: credentials::Error) -> Self {
        Self::Env(error)
    }
}
