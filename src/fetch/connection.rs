//! Handles the IMAP connections.
//!
//! IMAP is the protocol responsible for accessing the mailboxes. This
//! implements the [`MailboxSession`] the deduplication runs against.

use core::fmt;
use std::net;
use std::sync::mpsc::SyncSender;

use native_tls::{TlsConnector, TlsStream};

use crate::credentials::{Credentials, Encryption};
use crate::fetch::envelope;
use crate::session::{self, MailboxSession, MessageRecord, Uid, UidRange, ValidityToken};

/// Type of query made on the IMAP server.
const QUERY: &str = "(UID ENVELOPE)";

/// Number of uids fetched per `UID FETCH` command.
const FETCH_CHUNK: usize = 500;

/// Represents the Imap session to communicate with the server.
pub struct ImapSession {
    /// Active session
    session: imap::Session<TlsStream<net::TcpStream>>,
}

impl ImapSession {
    /// Creates a new [`ImapSession`] with the given [`Credentials`].
    pub fn with_credentials(credentials: &Credentials) -> Result<Self, Error> {
        let socket_address = credentials.as_imap_socket_address();
        let domain_name = credentials.as_domain_name();
        let ssl_connector = TlsConnector::new().map_err(Error::TlsConnection)?;

        let client = match credentials.as_encryption() {
            Encryption::Tls => imap::connect(socket_address, domain_name, &ssl_connector),
            Encryption::StartTls => {
                imap::connect_starttls(socket_address, domain_name, &ssl_connector)
            }
        }
        .map_err(Error::ImapConnection)?;

        let session = client
            .login(credentials.as_email(), credentials.as_password())
            .map_err(|(err, _)| Error::Login(err))?;

        tracing::info!(server = domain_name, user = credentials.as_email(), "logged in");
        Ok(Self { session })
    }
}

impl MailboxSession for ImapSession {
    fn examine(&mut self, mailbox: &str) -> Result<ValidityToken, session::Error> {
        let mailbox = self.session.examine(mailbox)?;
        Ok(ValidityToken(mailbox.uid_validity))
    }

    fn mark_deleted(&mut self, uid: Uid) -> Result<(), session::Error> {
        self.session.uid_store(uid.to_string(), "+FLAGS.SILENT (\\Deleted)")?;
        Ok(())
    }

    fn purge(&mut self) -> Result<(), session::Error> {
        let expunged = self.session.expunge()?;
        tracing::debug!(count = expunged.len(), "expunge acknowledged");
        Ok(())
    }

    fn select(&mut self, mailbox: &str) -> Result<ValidityToken, session::Error> {
        let mailbox = self.session.select(mailbox)?;
        Ok(ValidityToken(mailbox.uid_validity))
    }

    fn stream_metadata(
        &mut self,
        range: UidRange,
        sink: &SyncSender<MessageRecord>,
    ) -> Result<(), session::Error> {
        let mut uids = self
            .session
            .uid_search(format!("UID {range}"))?
            .into_iter()
            .collect::<Vec<_>>();
        uids.sort_unstable();
        tracing::debug!(count = uids.len(), %range, "fetching envelopes");

        for chunk in uids.chunks(FETCH_CHUNK) {
            let fetches = self.session.uid_fetch(uid_set(chunk), QUERY)?;
            let mut records = fetches.iter().filter_map(envelope::to_record).collect::<Vec<_>>();
            if records.len() < chunk.len() {
                tracing::warn!(
                    requested = chunk.len(),
                    received = records.len(),
                    "server returned fewer envelopes than requested"
                );
            }
            records.sort_unstable_by_key(|record| record.uid);
            for record in records {
                sink.send(record).map_err(|_| session::Error::Disconnected)?;
            }
        }
        Ok(())
    }
}

impl Drop for ImapSession {
    fn drop(&mut self) {
        if let Err(err) = self.session.logout() {
            tracing::warn!(%err, "failed to log out from session, it may still be active");
        }
    }
}

/// Builds a compact uid set from sorted uids, `1:3,5,8:9` for instance.
fn uid_set(uids: &[Uid]) -> String {
    let mut ranges: Vec<(Uid, Uid)> = Vec::new();
    for &uid in uids {
        match ranges.last_mut() {
            Some((_, last)) if last.checked_add(1) == Some(uid) => *last = uid,
            _ => ranges.push((uid, uid)),
        }
    }
    ranges
        .iter()
        .map(|&(first, last)| {
            if first == last { first.to_string() } else { format!("{first}:{last}") }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Errors that may occur while connecting to the IMAP server.
#[derive(Debug)]
pub enum Error {
    /// Failed to connect to the IMAP server.
    ImapConnection(imap::Error),
    /// The server rejected the credentials.
    Login(imap::Error),
    /// Failed to establish `TLS` connection.
    TlsConnection(native_tls::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImapConnection(err) => write!(f, "cannot connect to the IMAP server: {err}"),
            Self::Login(err) => write!(f, "cannot log in: {err}"),
            Self::TlsConnection(err) => write!(f, "cannot set up TLS: {err}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use crate::fetch::connection::uid_set;

    #[test]
    fn compact_uid_sets() {
        assert_eq!(uid_set(&[1, 2, 3, 5, 8, 9]), "1:3,5,8:9");
        assert_eq!(uid_set(&[42]), "42");
        assert_eq!(uid_set(&[u32::MAX - 1, u32::MAX]), "4294967294:4294967295");
        assert_eq!(uid_set(&[]), "");
    }
}
