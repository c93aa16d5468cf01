//! `devqueue platforms` command - Print every platform and its devices.

use std::io::{self, Write};

use colored::Colorize;
use devqueue::QueueManager;

use crate::error::CliResult;

/// Execute the `platforms` command.
pub fn execute(manager: &QueueManager) -> CliResult<()> {
    if let Some(reason) = manager.catalog().enumeration_error() {
        println!("{} Device enumeration failed: {}", "Warning:".yellow(), reason);
    }

    let mut stdout = io::stdout().lock();
    manager.write_platform_info(&mut stdout)?;
    stdout.flush()?;
    Ok(())
}
