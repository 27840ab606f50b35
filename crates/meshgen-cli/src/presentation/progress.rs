//! Terminal progress for a running generation.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use meshgen_core::GenerationEvent;

const TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}";

/// Progress bar fed from generation events; output lines are printed above it.
pub struct GenerationProgress {
    bar: ProgressBar,
}

impl GenerationProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
            bar.set_style(style.progress_chars("█▓░"));
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    /// A bar that draws nothing.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn handle(&self, event: &GenerationEvent) {
        match event {
            GenerationEvent::Progress { percent, message } => {
                self.bar.set_position(u64::from(*percent));
                self.bar.set_message(message.clone());
            }
            GenerationEvent::Log { line } => self.bar.println(line),
            GenerationEvent::Completed { .. } => self.bar.finish_with_message("Done"),
            GenerationEvent::Failed { reason } => {
                self.bar.abandon_with_message(reason.message.clone());
            }
        }
    }

    /// Print a message above the bar.
    pub fn note(&self, message: impl AsRef<str>) {
        self.bar.println(message);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for GenerationProgress {
    fn default() -> Self {
        Self::new()
    }
}
