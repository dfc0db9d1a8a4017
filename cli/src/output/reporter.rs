//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly. When progress indicators are enabled, step
//! messages drive a spinner instead of printing a new line each time.

use indicatif::ProgressBar;
use owo_colors::OwoColorize as _;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` or updates the spinner
/// - `success()` prints `"  ✓ {message}"`
/// - `warn()` prints `"  ! {message}"`
///
/// All output is suppressed when `ctx.quiet`.
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: Option<ProgressBar>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a line-per-event reporter.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self { ctx, spinner: None }
    }

    /// Create a reporter that shows steps on a spinner when the terminal
    /// supports it.
    #[must_use]
    pub fn with_spinner(ctx: &'a OutputContext, msg: &str) -> Self {
        let spinner = ctx.show_progress().then(|| progress::spinner(msg));
        Self { ctx, spinner }
    }

    /// Clear the spinner, if any, without a final message.
    pub fn finish(&self) {
        if let Some(pb) = &self.spinner {
            pb.finish_and_clear();
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.set_message(message.to_string()),
            None => println!("  {} {message}", "→".style(self.ctx.styles.info)),
        }
    }

    fn success(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        match &self.spinner {
            Some(pb) => progress::finish_ok(pb, message),
            None => println!("  {} {message}", "✓".style(self.ctx.styles.success)),
        }
    }

    fn warn(&self, message: &str) {
        if self.ctx.quiet {
            return;
        }
        match &self.spinner {
            Some(pb) => pb.println(format!("  {} {message}", "!".style(self.ctx.styles.warning))),
            None => println!("  {} {message}", "!".style(self.ctx.styles.warning)),
        }
    }
}

impl Drop for TerminalReporter<'_> {
    fn drop(&mut self) {
        if let Some(pb) = self.spinner.as_ref().filter(|pb| !pb.is_finished()) {
            pb.finish_and_clear();
        }
    }
}
