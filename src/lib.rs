//! Finds and removes duplicated emails in an IMAP mailbox.
//!
//! A mailbox is scanned with [`find_duplicates`](dedup::find_duplicates),
//! which identifies every email with a [`fingerprint`](fingerprint::fingerprint)
//! and returns the uids of the emails seen more than once. These can then be
//! deleted with [`remove`](removal::remove).

pub mod credentials;
pub mod dedup;
pub mod errors;
pub mod fetch;
pub mod fingerprint;
pub mod options;
pub mod removal;
pub mod session;
