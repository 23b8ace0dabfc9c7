//! # Progress Reporting Module
//!
//! Barra di avanzamento `indicatif` sugli step di un piano (un tick per ogni
//! invocazione ffmpeg). In modalità JSON o dry run la barra è nascosta.
//!
//! ```text
//! ⠋ [00:01:12] [=========>------------------------------] 1/2 second-pass encode
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for the steps of one plan
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a visible progress bar over `total_steps`
    pub fn new(total_steps: u64) -> Self {
        let bar = ProgressBar::new(total_steps);

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            bar.set_style(style.progress_chars("=>-"));
        }
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A progress manager that draws nothing
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    /// Announce the step about to run
    pub fn start_step(&self, label: &str) {
        self.bar.set_message(label.to_string());
    }

    /// Mark the current step as done
    pub fn finish_step(&self) {
        self.bar.inc(1);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Stop drawing, leaving the last state on screen
    pub fn abandon(&self, message: &str) {
        self.bar.abandon_with_message(message.to_string());
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}
