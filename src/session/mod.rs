//! Abstraction over the mailbox session the deduplication runs against.
//!
//! The real implementation is [`ImapSession`](crate::fetch::connection::ImapSession),
//! which talks to an IMAP server. Tests use an in-memory session instead.

#[cfg(test)]
pub mod memory;

use core::fmt;
use std::sync::mpsc::SyncSender;

use crate::fingerprint::Envelope;

/// Unique identifier of an email inside a mailbox.
///
/// Only comparable within the same [`ValidityToken`].
pub type Uid = u32;

/// One email observed while scanning a mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Envelope of the email
    pub envelope: Envelope,
    /// Unique id of the email
    pub uid: Uid,
}

/// Inclusive range of [`Uid`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UidRange {
    /// First uid of the range
    first: Uid,
    /// Last uid of the range
    last: Uid,
}

impl UidRange {
    /// Range covering every possible uid: `1:4294967295`.
    pub const ALL: Self = Self { first: 1, last: Uid::MAX };

    /// Returns `true` if the uid belongs to the range.
    pub const fn contains(self, uid: Uid) -> bool {
        self.first <= uid && uid <= self.last
    }

    /// Creates a new range, swapping the bounds if needed.
    #[cfg(test)]
    pub(crate) const fn new(first: Uid, last: Uid) -> Self {
        if first <= last { Self { first, last } } else { Self { first: last, last: first } }
    }
}

impl fmt::Display for UidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.first, self.last)
    }
}

/// Generation of the uids of a mailbox (`UIDVALIDITY`).
///
/// Servers are allowed not to send it, in which case it is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidityToken(pub Option<u32>);

impl fmt::Display for ValidityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(token) => write!(f, "{token}"),
            None => f.write_str("unknown"),
        }
    }
}

/// Operations the deduplication needs from a mailbox session.
///
/// The session must already be authenticated.
pub trait MailboxSession: Send {
    /// Opens a mailbox read-only and returns its current [`ValidityToken`].
    fn examine(&mut self, mailbox: &str) -> Result<ValidityToken, Error>;

    /// Flags a single email as `\Deleted`.
    fn mark_deleted(&mut self, uid: Uid) -> Result<(), Error>;

    /// Permanently removes every email flagged as `\Deleted` in the selected
    /// mailbox, including the ones flagged before this run.
    fn purge(&mut self) -> Result<(), Error>;

    /// Opens a mailbox read-write and returns its current [`ValidityToken`].
    fn select(&mut self, mailbox: &str) -> Result<ValidityToken, Error>;

    /// Sends the uid and envelope of every email of the selected mailbox
    /// whose uid is in `range` into `sink`, in ascending uid order.
    ///
    /// Returning marks the end of the stream, and the returned value is the
    /// completion status of the whole fetch.
    fn stream_metadata(
        &mut self,
        range: UidRange,
        sink: &SyncSender<MessageRecord>,
    ) -> Result<(), Error>;
}

/// Errors that may occur while interacting with a mailbox session.
#[derive(Debug)]
pub enum Error {
    /// The receiving end of the stream was dropped before the end.
    Disconnected,
    /// The server answered with an error.
    Imap(imap::Error),
    /// The thread running the request panicked.
    Panicked,
    /// The session refused the request.
    Refused(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("stream receiver disconnected"),
            Self::Imap(err) => write!(f, "imap: {err}"),
            Self::Panicked => f.write_str("metadata fetch panicked"),
            Self::Refused(reason) => write!(f, "refused: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Imap(err) => Some(err),
            Self::Disconnected | Self::Panicked | Self::Refused(_) => None,
        }
    }
}

impl From<imap::Error> for Error {
    fn from(error: imap::Error) -> Self {
        Self::Imap(error)
    }
}
