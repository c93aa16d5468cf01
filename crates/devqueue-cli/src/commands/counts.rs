//! `devqueue counts` command - Print platform and per-class device counts.

use colored::Colorize;
use devqueue::{DeviceClass, QueueManager};

use super::class_label;
use crate::error::CliResult;

/// Execute the `counts` command.
pub fn execute(manager: &QueueManager) -> CliResult<()> {
    println!(
        "{} {}",
        format!("{:<13}", "platforms").bright_white(),
        manager.count_platforms()
    );
    for class in DeviceClass::ALL {
        println!("  {} {}", class_label(class), manager.count_devices(class));
    }
    Ok(())
}
