//! Scans a mailbox to find the emails that are duplicates of an earlier one.
//!
//! The envelopes are fetched on a separate thread and handed over through a
//! bounded queue, so the memory used by a scan grows with the number of
//! distinct emails and not with the size of the mailbox.

use core::fmt;
use std::collections::HashSet;
use std::sync::mpsc::sync_channel;
use std::thread;

use crate::fingerprint::{Fingerprint, Mode, fingerprint};
use crate::session::{self, MailboxSession, MessageRecord, Uid, UidRange, ValidityToken};

/// Maximum number of fetched emails waiting to be classified.
pub const QUEUE_CAPACITY: usize = 1000;

/// Selects which classifications are reported while scanning.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Report every email.
    #[default]
    All,
    /// Only report duplicates.
    DuplicatesOnly,
}

/// Classification of an email during a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// An email with the same fingerprint was already seen.
    Duplicate,
    /// First email seen with this fingerprint.
    Unique,
}

/// Result of a scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Duplicates {
    /// Number of distinct fingerprints seen
    pub distinct: usize,
    /// Number of emails classified
    pub scanned: usize,
    /// Uids of the duplicates, in the order they were received
    pub uids: Vec<Uid>,
    /// Validity of the uids, as read when opening the mailbox
    pub validity: ValidityToken,
}

/// Fingerprints of the emails already classified.
#[derive(Debug, Default)]
struct SeenSet(HashSet<Fingerprint>);

impl SeenSet {
    /// Classifies a fingerprint, remembering it if it is new.
    fn observe(&mut self, fingerprint: Fingerprint) -> Classification {
        if self.0.insert(fingerprint) { Classification::Unique } else { Classification::Duplicate }
    }
}

/// Finds the duplicated emails of a mailbox.
///
/// The mailbox is opened read-only, so the scan leaves it untouched.
///
/// The first email with a given fingerprint is kept, and the uids of the
/// following ones are returned in the order the server sent them. If the
/// fetch fails, every email received before the failure is still classified
/// and the partial result is returned inside [`Error::Stream`].
pub fn find_duplicates<S: MailboxSession + ?Sized>(
    session: &mut S,
    mailbox: &str,
    mode: Mode,
    verbosity: Verbosity,
) -> Result<Duplicates, Error> {
    let validity = session.examine(mailbox).map_err(Error::Select)?;
    tracing::info!(mailbox, %validity, "examined mailbox");

    let mut seen = SeenSet::default();
    let mut duplicates = Duplicates { validity, ..Duplicates::default() };

    let status = thread::scope(|scope| {
        let (sender, receiver) = sync_channel::<MessageRecord>(QUEUE_CAPACITY);
        let producer = scope.spawn(move || session.stream_metadata(UidRange::ALL, &sender));

        for record in receiver {
            let fingerprint = fingerprint(&record.envelope, mode);
            let classification = seen.observe(fingerprint.clone());
            report(mailbox, &record, &fingerprint, classification, verbosity);
            if classification == Classification::Duplicate {
                duplicates.uids.push(record.uid);
            }
            duplicates.scanned += 1;
        }

        producer.join().unwrap_or(Err(session::Error::Panicked))
    });

    duplicates.distinct = seen.0.len();
    match status {
        Ok(()) => {
            tracing::info!(
                mailbox,
                scanned = duplicates.scanned,
                duplicates = duplicates.uids.len(),
                "scan complete"
            );
            Ok(duplicates)
        }
        Err(source) => {
            tracing::error!(
                mailbox,
                scanned = duplicates.scanned,
                %source,
                "metadata fetch failed"
            );
            Err(Error::Stream { partial: duplicates, source })
        }
    }
}

/// Logs the classification of an email, according to the [`Verbosity`].
fn report(
    mailbox: &str,
    record: &MessageRecord,
    fingerprint: &Fingerprint,
    classification: Classification,
    verbosity: Verbosity,
) {
    let subject = record.envelope.subject.as_str();
    match (classification, verbosity) {
        (Classification::Duplicate, _) => {
            tracing::info!(mailbox, subject, uid = record.uid, %fingerprint, "duplicate");
        }
        (Classification::Unique, Verbosity::All) => {
            tracing::info!(mailbox, subject, uid = record.uid, %fingerprint, "unique");
        }
        (Classification::Unique, Verbosity::DuplicatesOnly) => (),
    }
}

/// Errors that may occur while scanning a mailbox.
#[derive(Debug)]
pub enum Error {
    /// Failed to open the mailbox.
    Select(session::Error),
    /// The fetch failed after `partial` was computed from the emails already
    /// received.
    Stream {
        /// Duplicates among the emails received before the failure
        partial: Duplicates,
        /// Reason of the failure
        source: session::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Select(err) => write!(f, "cannot open mailbox: {err}"),
            Self::Stream { partial, source } => write!(
                f,
                "fetch failed after {} messages: {source}",
                partial.scanned
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Select(err) | Self::Stream { source: err, .. } => Some(err),
        }
    }
}
