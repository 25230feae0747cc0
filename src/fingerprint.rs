//! Computes the identity of an email from its envelope.
//!
//! Two emails are considered identical if, and only if, their
//! [`Fingerprint`]s are equal. The fingerprint is either the `Message-ID` of
//! the email, or a digest of the other envelope fields when there is no
//! `Message-ID` or when the user asked to ignore it.

use core::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest as _, Sha1};

/// Header-derived metadata of an email.
///
/// This is what the server returns for the `ENVELOPE` fetch item, decoded
/// into owned strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Addresses of the `Bcc` header, in header order.
    pub bcc: Vec<String>,
    /// Addresses of the `Cc` header, in header order.
    pub cc: Vec<String>,
    /// Textual timestamp of the email
    pub date: String,
    /// Addresses of the `From` header, in header order.
    pub from: Vec<String>,
    /// Value of the `In-Reply-To` header.
    pub in_reply_to: String,
    /// Value of the `Message-ID` header, if the server provided one.
    pub message_id: Option<String>,
    /// Addresses of the `Reply-To` header, in header order.
    pub reply_to: Vec<String>,
    /// Addresses of the `Sender` header, in header order.
    pub sender: Vec<String>,
    /// Subject of the email
    pub subject: String,
    /// Addresses of the `To` header, in header order.
    pub to: Vec<String>,
}

/// Identity of an email, used to detect duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strategy used to compute a [`Fingerprint`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Hash the envelope even if a `Message-ID` is available.
    ContentHash,
    /// Use the `Message-ID` verbatim, falling back to
    /// [`ContentHash`](Self::ContentHash) when it is missing or empty.
    #[default]
    MessageId,
}

/// Computes the [`Fingerprint`] of an envelope.
///
/// This is a pure function: the same envelope and mode always produce the
/// same fingerprint.
pub fn fingerprint(envelope: &Envelope, mode: Mode) -> Fingerprint {
    let message_id = envelope
        .message_id
        .as_deref()
        .filter(|id| mode == Mode::MessageId && !id.is_empty());
    if let Some(id) = message_id {
        return Fingerprint(id.to_owned());
    }
    let digest = Sha1::digest(content_key(envelope).as_bytes());
    Fingerprint(STANDARD.encode(digest))
}

/// Builds the text that is hashed in [`Mode::ContentHash`].
///
/// Every field is prefixed by its role tag and the fields are separated by
/// newlines, so moving an address from one role to another changes the key.
fn content_key(envelope: &Envelope) -> String {
    let roles: [(&str, &[String]); 6] = [
        ("from", &envelope.from),
        ("sender", &envelope.sender),
        ("reply-to", &envelope.reply_to),
        ("to", &envelope.to),
        ("cc", &envelope.cc),
        ("bcc", &envelope.bcc),
    ];

    let mut key = format!("date:{}\nsubject:{}", envelope.date, envelope.subject);
    for (tag, addresses) in roles {
        for address in addresses {
            key.push('\n');
            key.push_str(tag);
            key.push(':');
            key.push_str(address);
        }
    }
    key.push_str("\nin-reply-to:");
    key.push_str(&envelope.in_reply_to);
    key
}
