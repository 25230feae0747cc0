//! Converts the `ENVELOPE` items returned by the server into owned
//! [`MessageRecord`]s.

use imap::types::Fetch;
use imap_proto::types::Envelope as ImapEnvelope;
use mail_parser::DateTime;

use crate::fingerprint::Envelope;
use crate::session::MessageRecord;

/// Builds a [`MessageRecord`] from a fetch response.
///
/// Returns [`None`] if the response lacks the uid or the envelope, which
/// happens with unsolicited `FETCH` responses (flag updates, for instance).
pub fn to_record(fetch: &Fetch) -> Option<MessageRecord> {
    Some(from_envelope(fetch.uid?, fetch.envelope()?))
}

/// Builds a [`MessageRecord`] from the envelope sent by the server.
fn from_envelope(uid: u32, envelope: &ImapEnvelope<'_>) -> MessageRecord {
    macro_rules! addresses {
        ($role:ident) => {
            envelope
                .$role
                .iter()
                .flatten()
                .map(|address| address_text(address.mailbox.as_deref(), address.host.as_deref()))
                .collect()
        };
    }

    let envelope = Envelope {
        bcc: addresses!(bcc),
        cc: addresses!(cc),
        date: normalise_date(&text(envelope.date.as_deref())),
        from: addresses!(from),
        in_reply_to: text(envelope.in_reply_to.as_deref()),
        message_id: envelope.message_id.as_deref().map(|id| text(Some(id))),
        reply_to: addresses!(reply_to),
        sender: addresses!(sender),
        subject: text(envelope.subject.as_deref()),
        to: addresses!(to),
    };
    MessageRecord { envelope, uid }
}

/// Formats an address as `mailbox@host`.
///
/// Group delimiters have no host and are kept as the bare group name.
fn address_text(mailbox: Option<&[u8]>, host: Option<&[u8]>) -> String {
    match (mailbox, host) {
        (Some(mailbox), Some(host)) => {
            format!("{}@{}", String::from_utf8_lossy(mailbox), String::from_utf8_lossy(host))
        }
        (Some(mailbox), None) => String::from_utf8_lossy(mailbox).into_owned(),
        (None, _) => String::new(),
    }
}

/// Rewrites an RFC 2822 date as RFC 3339, so the same instant always has the
/// same text.
///
/// Dates that cannot be parsed are returned unchanged.
fn normalise_date(date: &str) -> String {
    DateTime::parse_rfc822(date).map_or_else(|| date.to_owned(), |parsed| parsed.to_rfc3339())
}

/// Decodes an envelope field, `NIL` being the empty string.
fn text(value: Option<&[u8]>) -> String {
    value.map(|bytes| String::from_utf8_lossy(bytes).into_owned()).unwrap_or_default()
}
