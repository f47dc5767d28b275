//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

use crate::domain::{Step, StepOutcome, StepRecord};
use crate::infrastructure::traits::StatusReporter;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print success status indented (green checkmark with leading spaces)
pub fn success_detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✓".green(), msg);
}

/// Print skipped status (dim dash, indented)
pub fn skipped(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "-".dimmed(), msg);
}

/// Print failure status (red X, indented)
pub fn failure(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

/// Print labelled value (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color, for data)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Progress reporter for interactive launches.
///
/// Each step prints its banner, then a marked outcome line. The base
/// directory and the final pause have no banner of their own.
#[derive(Debug, Default)]
pub struct ConsoleReporter;

impl StatusReporter for ConsoleReporter {
    fn step_started(&self, step: Step) {
        match step {
            Step::ResolveBase | Step::Terminate => {}
            _ => header(step.banner()),
        }
    }

    fn step_finished(&self, record: &StepRecord) {
        match (&record.step, &record.outcome) {
            (Step::ResolveBase, StepOutcome::Done(dir)) => action("Base directory", dir),
            (_, StepOutcome::Done(msg)) => success_detail(msg),
            (_, StepOutcome::Skipped(msg)) => skipped(msg),
            (_, StepOutcome::Failed(msg)) => failure(msg),
        }
    }

    fn detail(&self, message: &str) {
        detail(message);
    }

    fn warning(&self, message: &str) {
        warning(message);
    }

    fn error(&self, message: &str) {
        error(message);
    }
}
