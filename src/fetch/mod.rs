//! Access to a mailbox on an IMAP server.

pub mod connection;
pub mod envelope;
