//! Removes the duplicated emails of a mailbox.
//!
//! Make sure the IMAP server is set to actually delete, or move to the bin,
//! the emails that are flagged as deleted.

use std::process::ExitCode;

use mailbox_dedup::credentials::Credentials;
use mailbox_dedup::dedup::find_duplicates;
use mailbox_dedup::errors::Result;
use mailbox_dedup::fetch::connection::ImapSession;
use mailbox_dedup::options::Options;
use mailbox_dedup::removal::remove;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Scans the mailbox, then removes the duplicates unless in dry run.
fn run() -> Result {
    let credentials = Credentials::load()?;
    let options = Options::load()?;
    let mut session = ImapSession::with_credentials(&credentials)?;

    let duplicates =
        find_duplicates(&mut session, &options.mailbox, options.mode, options.verbosity)?;

    if options.dry_run {
        println!("would have removed {} messages", duplicates.uids.len());
        return Ok(());
    }

    println!("will remove {} messages", duplicates.uids.len());
    remove(&mut session, &options.mailbox, &duplicates.uids)?;
    println!("done");
    Ok(())
}
