//! `devqueue check` command - Exercise the active-queue stack on one device.

use std::thread;

use colored::Colorize;
use devqueue::{DeviceClass, QueueManager};

use crate::error::{CliError, CliResult};

/// Outcome of one check step.
#[derive(Debug)]
pub struct Step {
    /// What was checked.
    pub name: &'static str,
    /// Failure detail, if any.
    pub failure: Option<String>,
}

impl Step {
    fn new(name: &'static str, result: Result<(), String>) -> Self {
        Self {
            name,
            failure: result.err(),
        }
    }

    /// True when the step passed.
    pub fn passed(&self) -> bool {
        self.failure.is_none()
    }
}

fn expect_count(manager: &QueueManager, expected: usize) -> Result<(), String> {
    let actual = manager.activated_count();
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected {} activated queue(s), found {}", expected, actual))
    }
}

/// Run the push/pop self-test against device `index` of `class`.
///
/// A failed push ends the run after that step. Once the push succeeds every
/// later step runs, including the pop, so the stack is left as it was found.
pub fn run(manager: &QueueManager, class: DeviceClass, index: usize) -> Vec<Step> {
    let mut steps = Vec::new();
    let base = manager.activated_count();

    let queue = match manager.push_queue(class, index) {
        Ok(queue) => {
            steps.push(Step::new("push", Ok(())));
            queue
        }
        Err(e) => {
            steps.push(Step::new("push", Err(e.to_string())));
            return steps;
        }
    };

    steps.push(Step::new("activated count", expect_count(manager, base + 1)));

    let current = manager
        .current_queue()
        .map_err(|e| e.to_string())
        .and_then(|current| {
            if current.same_instance(&queue) {
                Ok(())
            } else {
                Err(format!("current queue is {}", current.key()))
            }
        });
    steps.push(Step::new("current queue", current));

    steps.push(Step::new("wait", queue.wait().map_err(|e| e.to_string())));

    let other_thread = thread::scope(|s| {
        s.spawn(|| manager.activated_count())
            .join()
            .map_err(|_| "thread panicked".to_string())
    })
    .and_then(|count| {
        if count == 0 {
            Ok(())
        } else {
            Err(format!("another thread sees {} activated queue(s)", count))
        }
    });
    steps.push(Step::new("thread isolation", other_thread));

    steps.push(Step::new("pop", manager.pop_queue().map_err(|e| e.to_string())));
    steps.push(Step::new("restored count", expect_count(manager, base)));
    steps
}

/// Execute the `check` command.
pub fn execute(manager: &QueueManager, class: DeviceClass, index: usize) -> CliResult<()> {
    println!(
        "{} Checking queue stack on {} device {}",
        "→".bright_cyan(),
        class.to_string().bright_yellow(),
        index.to_string().bright_yellow()
    );

    let steps = run(manager, class, index);
    for step in &steps {
        match &step.failure {
            None => println!("  {} {}", "✓".bright_green(), step.name),
            Some(reason) => println!("  {} {}: {}", "✗".bright_red(), step.name, reason),
        }
    }

    match steps.iter().find(|step| !step.passed()) {
        Some(step) => Err(CliError::Check(step.name.to_string())),
        None => {
            println!("{} All checks passed", "✓".bright_green().bold());
            Ok(())
        }
    }
}
