//! Styled terminal output
//!
//! Status messages go to stdout with a leading symbol; errors always go to
//! stderr. The pipeline log stream passes through unstyled.

use console::style;

use crate::sink::LogSink;

/// Output handler for consistent CLI formatting
#[derive(Debug, Clone, Copy)]
pub struct Output {
    verbose: bool,
    quiet: bool,
}

impl Output {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self { verbose, quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✔").green(), message);
        }
    }

    /// Errors are shown even in quiet mode
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✖").red().bold(), style(message).red());
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    /// Only shown with `-v`
    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("{} {}", style("ℹ").dim(), style(message).dim());
        }
    }

    pub fn step(&self, step: &str) {
        if !self.quiet {
            println!("{} {}", style("❯").cyan(), step);
        }
    }

    pub fn key_value(&self, key: &str, value: &str, highlight: bool) {
        if !self.quiet {
            let styled_value = if highlight {
                style(value).green().bold()
            } else {
                style(value).white()
            };
            println!("  {:<14} {}", style(key).dim(), styled_value);
        }
    }
}

/// Scanner output is the product of the step, so it is printed even in quiet mode
impl LogSink for Output {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}
