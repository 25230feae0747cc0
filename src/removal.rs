//! Removes emails from a mailbox with the two steps of IMAP: flag each email
//! as `\Deleted`, then expunge the mailbox.

use core::fmt;

use crate::session::{self, MailboxSession, Uid};

/// Marks the given emails as deleted, then expunges the mailbox.
///
/// Marks are sent one at a time, in order, and the first failure stops the
/// removal: the remaining emails are not marked and the mailbox is not
/// expunged, but the emails already marked stay flagged.
///
/// The expunge also removes every email that was flagged as `\Deleted`
/// before this call.
pub fn remove<S: MailboxSession + ?Sized>(
    session: &mut S,
    mailbox: &str,
    uids: &[Uid],
) -> Result<(), Error> {
    let validity = session.select(mailbox).map_err(Error::Select)?;
    tracing::debug!(mailbox, %validity, count = uids.len(), "marking duplicates as deleted");

    for (marked, &uid) in uids.iter().enumerate() {
        session.mark_deleted(uid).map_err(|source| {
            tracing::error!(mailbox, uid, marked, %source, "failed to mark message as deleted");
            Error::Mark { marked, source, uid }
        })?;
    }

    session.purge().map_err(Error::Purge)?;
    tracing::info!(mailbox, removed = uids.len(), "expunged mailbox");
    Ok(())
}

/// Errors that may occur while removing emails.
#[derive(Debug)]
pub enum Error {
    /// Failed to flag an email.
    Mark {
        /// Number of emails flagged before the failure
        marked: usize,
        /// Reason of the failure
        source: session::Error,
        /// Email that could not be flagged
        uid: Uid,
    },
    /// Every email was flagged, but the expunge failed.
    Purge(session::Error),
    /// Failed to select the mailbox.
    Select(session::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mark { marked, source, uid } => write!(
                f,
                "cannot mark message {uid} as deleted ({marked} already marked): {source}"
            ),
            Self::Purge(err) => write!(f, "cannot expunge mailbox: {err}"),
            Self::Select(err) => write!(f, "cannot select mailbox: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mark { source: err, .. } | Self::Purge(err) | Self::Select(err) => Some(err),
        }
    }
}
