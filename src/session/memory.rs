//! In-memory [`MailboxSession`] used by the tests.
//!
//! It keeps a single mailbox, records every call it receives and can be told
//! to fail at a precise point.

use std::collections::BTreeSet;
use std::sync::mpsc::SyncSender;

use crate::fingerprint::Envelope;
use crate::session::{Error, MailboxSession, MessageRecord, Uid, UidRange, ValidityToken};

/// Envelope with a `Message-ID` and nothing else.
pub fn with_message_id(message_id: &str) -> Envelope {
    Envelope { message_id: Some(message_id.to_owned()), ..Envelope::default() }
}

/// Envelope without `Message-ID`, identified by its content only.
pub fn with_content(subject: &str, date: &str, from: &str) -> Envelope {
    Envelope {
        date: date.to_owned(),
        from: vec![from.to_owned()],
        subject: subject.to_owned(),
        to: vec!["me@example.com".to_owned()],
        ..Envelope::default()
    }
}

/// Call received by a [`MemorySession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    /// [`MailboxSession::examine`]
    Examine(String),
    /// [`MailboxSession::mark_deleted`]
    Mark(Uid),
    /// [`MailboxSession::purge`]
    Purge,
    /// [`MailboxSession::select`]
    Select(String),
    /// [`MailboxSession::stream_metadata`]
    Stream(UidRange),
}

/// Mailbox kept in memory.
#[derive(Debug, Default)]
pub struct MemorySession {
    /// Calls received, in order
    pub calls: Vec<Call>,
    /// Uid whose marking fails
    pub fail_mark: Option<Uid>,
    /// Makes the purge fail
    pub fail_purge: bool,
    /// Number of records streamed before the fetch fails
    pub fail_stream_after: Option<usize>,
    /// Uids flagged as `\Deleted`
    pub flagged: BTreeSet<Uid>,
    /// Emails of the mailbox, sorted by uid
    messages: Vec<MessageRecord>,
    /// Name of the only mailbox that can be opened
    name: String,
    /// Whether the opened mailbox is read-only
    pub read_only: bool,
    /// Name of the opened mailbox
    selected: Option<String>,
    /// Validity token returned on selection
    validity: ValidityToken,
}

impl MemorySession {
    /// Creates a mailbox holding the given envelopes, with uids `1..=n`.
    pub fn new(name: &str, envelopes: Vec<Envelope>) -> Self {
        let messages = envelopes
            .into_iter()
            .zip(1..)
            .map(|(envelope, uid)| MessageRecord { envelope, uid })
            .collect();
        Self {
            messages,
            name: name.to_owned(),
            validity: ValidityToken(Some(1)),
            ..Self::default()
        }
    }

    /// Returns the uids still present in the mailbox.
    pub fn uids(&self) -> Vec<Uid> {
        self.messages.iter().map(|message| message.uid).collect()
    }

    /// Returns the uids that were marked, in order.
    pub fn marked(&self) -> Vec<Uid> {
        self.calls
            .iter()
            .filter_map(|call| if let Call::Mark(uid) = call { Some(*uid) } else { None })
            .collect()
    }

    /// Returns `true` if the purge was requested.
    pub fn purged(&self) -> bool {
        self.calls.contains(&Call::Purge)
    }

    /// Fails if no mailbox is opened.
    fn check_selected(&self) -> Result<(), Error> {
        self.selected
            .as_ref()
            .map(|_| ())
            .ok_or_else(|| Error::Refused("no mailbox selected".to_owned()))
    }

    /// Fails if the opened mailbox cannot be modified.
    fn check_writable(&self) -> Result<(), Error> {
        self.check_selected()?;
        if self.read_only {
            return Err(Error::Refused("mailbox is read-only".to_owned()));
        }
        Ok(())
    }

    /// Opens the mailbox, read-only or not.
    fn open(&mut self, mailbox: &str, read_only: bool) -> Result<ValidityToken, Error> {
        if mailbox != self.name {
            return Err(Error::Refused(format!("no mailbox named {mailbox}")));
        }
        self.selected = Some(mailbox.to_owned());
        self.read_only = read_only;
        Ok(self.validity)
    }
}

impl MailboxSession for MemorySession {
    fn examine(&mut self, mailbox: &str) -> Result<ValidityToken, Error> {
        self.calls.push(Call::Examine(mailbox.to_owned()));
        self.open(mailbox, true)
    }

    fn mark_deleted(&mut self, uid: Uid) -> Result<(), Error> {
        self.calls.push(Call::Mark(uid));
        self.check_writable()?;
        if self.fail_mark == Some(uid) {
            return Err(Error::Refused(format!("cannot store flags on {uid}")));
        }
        self.flagged.insert(uid);
        Ok(())
    }

    fn purge(&mut self) -> Result<(), Error> {
        self.calls.push(Call::Purge);
        self.check_writable()?;
        if self.fail_purge {
            return Err(Error::Refused("expunge failed".to_owned()));
        }
        let flagged = &self.flagged;
        self.messages.retain(|message| !flagged.contains(&message.uid));
        self.flagged.clear();
        Ok(())
    }

    fn select(&mut self, mailbox: &str) -> Result<ValidityToken, Error> {
        self.calls.push(Call::Select(mailbox.to_owned()));
        self.open(mailbox, false)
    }

    fn stream_metadata(
        &mut self,
        range: UidRange,
        sink: &SyncSender<MessageRecord>,
    ) -> Result<(), Error> {
        self.calls.push(Call::Stream(range));
        self.check_selected()?;
        let mut sent = 0;
        for message in self.messages.iter().filter(|message| range.contains(message.uid)) {
            if self.fail_stream_after == Some(sent) {
                break;
            }
            sink.send(message.clone()).map_err(|_| Error::Disconnected)?;
            sent += 1;
        }
        if self.fail_stream_after == Some(sent) {
            return Err(Error::Refused(format!("connection lost after {sent} messages")));
        }
        Ok(())
    }
}
