//! Handles the credentials, by loading them from the `.env` file.
//!
//! You should have a `.env` file at the root with the following variables,
//! or export them in the environment:
//!
//! ```env
//! DOMAIN=imap.example.com
//! EMAIL=bob@example.com
//! PASSWORD=P@ssw0rd
//! ```
//!
//! `IMAP_PORT` and `IMAP_ENCRYPTION_PROTOCOL` (`TLS` or `STARTTLS`) are
//! optional.

use core::fmt;
use core::num::ParseIntError;
use std::env::var;

use dotenv::dotenv;

/// Credentials to interact with the email.
///
/// These credentials should be stored in the `.env` file.
#[derive(Debug)]
pub struct Credentials {
    /// Domain of the IMAP server
    domain: String,
    /// Email
    email: String,
    /// Imap encryption protocol
    imap_encryption_protocol: Encryption,
    /// Imap port
    ///
    /// This is set to the default port of the encryption protocol if none
    /// were provided.
    imap_port: u16,
    /// Email password
    password: String,
}

impl Credentials {
    /// Key id for the domain variable in the `.env` file.
    const DOMAIN: &'static str = "DOMAIN";
    /// Key id for the email variable in the `.env` file.
    const EMAIL: &'static str = "EMAIL";
    /// Key id for the imap encryption variable in the `.env` file.
    const IMAP_ENCRYPTION_PROTOCOL: &'static str = "IMAP_ENCRYPTION_PROTOCOL";
    /// Key id for the imap port variable in the `.env` file.
    const IMAP_PORT: &'static str = "IMAP_PORT";
    /// Key id for the password variable in the `.env` file.
    const PASSWORD: &'static str = "PASSWORD";

    /// Returns the domain name of the server, used to check its certificate.
    pub fn as_domain_name(&self) -> &str {
        &self.domain
    }

    /// Returns the login
    pub fn as_email(&self) -> &str {
        &self.email
    }

    /// Returns the encryption protocol to use
    pub const fn as_encryption(&self) -> Encryption {
        self.imap_encryption_protocol
    }

    /// Returns the address of the IMAP server.
    pub fn as_imap_socket_address(&self) -> (&str, u16) {
        (&self.domain, self.imap_port)
    }

    /// Returns the password
    pub fn as_password(&self) -> &str {
        &self.password
    }

    /// Loads the credentials from the `.env` file and the environment.
    pub fn load() -> Result<Self, Error> {
        load_dotenv()?;
        Self::from_lookup(|key| var(key).ok())
    }

    /// Loads the credentials from a lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let load_var = |key: &'static str| lookup(key).ok_or(Error::MissingVariable(key));

        let domain = load_var(Self::DOMAIN)?;
        let email = load_var(Self::EMAIL)?;
        let password = load_var(Self::PASSWORD)?;
        let imap_encryption_protocol = lookup(Self::IMAP_ENCRYPTION_PROTOCOL)
            .map_or(Ok(Encryption::Tls), |value| Encryption::parse(&value))?;
        let imap_port = lookup(Self::IMAP_PORT).map_or_else(
            || Ok(imap_encryption_protocol.default_port()),
            |value| value.parse().map_err(Error::InvalidPort),
        )?;

        Ok(Self { domain, email, imap_encryption_protocol, imap_port, password })
    }
}

/// Encryption of the connection to the IMAP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encryption {
    /// Plain connection upgraded with the `STARTTLS` command.
    StartTls,
    /// TLS from the start of the connection.
    Tls,
}

impl Encryption {
    /// Port used when `IMAP_PORT` is not set.
    pub const fn default_port(self) -> u16 {
        match self {
            Self::StartTls => 143,
            Self::Tls => 993,
        }
    }

    /// Parses the value of `IMAP_ENCRYPTION_PROTOCOL`, case-insensitively.
    fn parse(value: &str) -> Result<Self, Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "TLS" | "SSL" => Ok(Self::Tls),
            "STARTTLS" => Ok(Self::StartTls),
            _ => Err(Error::InvalidEncryption(value.to_owned())),
        }
    }
}

/// Loads the `.env` file into the environment, if there is one.
pub fn load_dotenv() -> Result<(), Error> {
    match dotenv() {
        Err(err) if !err.not_found() => Err(Error::InvalidFile(err)),
        Ok(_) | Err(_) => Ok(()),
    }
}

/// Errors that may occur while loading the credentials.
#[derive(Debug)]
pub enum Error {
    /// The encryption protocol is neither `TLS` nor `STARTTLS`.
    InvalidEncryption(String),
    /// `dotenv` failed to read the `.env` file.
    InvalidFile(dotenv::Error),
    /// The provided IMAP port is invalid
    InvalidPort(ParseIntError),
    /// The wanted variable is missing in the `.env` file.
    MissingVariable(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEncryption(value) => {
                write!(f, "unknown encryption protocol {value:?}, expected TLS or STARTTLS")
            }
            Self::InvalidFile(err) => write!(f, "cannot read .env file: {err}"),
            Self::InvalidPort(err) => write!(f, "invalid IMAP port: {err}"),
            Self::MissingVariable(key) => write!(f, "missing variable {key}"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[expect(clippy::expect_used, reason = "test")]
mod test {
    use std::collections::HashMap;

    use crate::credentials::{Credentials, Encryption, Error};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] =
        [("DOMAIN", "imap.example.com"), ("EMAIL", "bob@example.com"), ("PASSWORD", "P@ssw0rd")];

    #[test]
    fn defaults_to_tls() {
        let credentials = Credentials::from_lookup(lookup(&REQUIRED)).expect("valid credentials");
        assert_eq!(credentials.as_encryption(), Encryption::Tls);
        assert_eq!(credentials.as_imap_socket_address(), ("imap.example.com", 993));
        assert_eq!(credentials.as_email(), "bob@example.com");
        assert_eq!(credentials.as_password(), "P@ssw0rd");
    }

    #[test]
    fn starttls_uses_port_143() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("IMAP_ENCRYPTION_PROTOCOL", "starttls"));
        let credentials = Credentials::from_lookup(lookup(&pairs)).expect("valid credentials");
        assert_eq!(credentials.as_encryption(), Encryption::StartTls);
        assert_eq!(credentials.as_imap_socket_address().1, 143);
    }

    #[test]
    fn explicit_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("IMAP_PORT", "1993"));
        let credentials = Credentials::from_lookup(lookup(&pairs)).expect("valid credentials");
        assert_eq!(credentials.as_imap_socket_address().1, 1993);

        let mut invalid = REQUIRED.to_vec();
        invalid.push(("IMAP_PORT", "imap"));
        assert!(matches!(
            Credentials::from_lookup(lookup(&invalid)),
            Err(Error::InvalidPort(_))
        ));
    }

    #[test]
    fn missing_password() {
        assert!(matches!(
            Credentials::from_lookup(lookup(&REQUIRED[..2])),
            Err(Error::MissingVariable("PASSWORD"))
        ));
    }

    #[test]
    fn unknown_encryption() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("IMAP_ENCRYPTION_PROTOCOL", "carrier pigeon"));
        assert!(matches!(
            Credentials::from_lookup(lookup(&pairs)),
            Err(Error::InvalidEncryption(_))
        ));
    }
}
