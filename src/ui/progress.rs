use crate::ui::icons::{CHECK, CROSS};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while a request is outstanding (fix generation, submission).
///
/// Output goes to stderr so rendered views on stdout stay pipeable. When
/// stderr is not a terminal, `indicatif` hides the bar on its own.
pub struct ActivitySpinner {
    bar: ProgressBar,
}

impl ActivitySpinner {
    /// Start ticking immediately with `message`.
    pub fn start(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    /// Stop ticking and leave a success line behind.
    pub fn success(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{}{}", CHECK, style(message).green()));
    }

    /// Stop ticking and leave a failure line behind.
    pub fn fail(&self, message: &str) {
        self.bar
            .finish_with_message(format!("{}{}", CROSS, style(message).red()));
    }
}

impl Drop for ActivitySpinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_finishes_on_success() {
        let spinner = ActivitySpinner::start("Generating fix...");
        spinner.success("Fix generated");
        assert!(spinner.bar.is_finished());
    }

    #[test]
    fn test_spinner_clears_on_drop() {
        let spinner = ActivitySpinner::start("Submitting...");
        let bar = spinner.bar.clone();
        drop(spinner);
        assert!(bar.is_finished());
    }
}
