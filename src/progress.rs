//! Progress feedback while test units run.
//!
//! Bars are drawn on stderr only when it is a terminal and quiet mode is
//! off (`--quiet` or the `TESTUP_QUIET` env var). Everywhere else a hidden
//! bar is handed out so callers never need to branch.

use indicatif::{ProgressBar, ProgressStyle};

pub const TEMPLATE_UNITS: &str = "🧪 {msg} {pos}/{len} units ({percent}%) - {elapsed}";
pub const TEMPLATE_WAIT: &str = "{spinner} {msg} ({elapsed})";

/// Configuration for progress display behavior
#[derive(Debug, Clone, Default)]
pub struct ProgressConfig {
    /// Whether to suppress all progress output
    pub quiet_mode: bool,
}

impl ProgressConfig {
    pub fn from_env(quiet: bool) -> Self {
        let env_quiet = std::env::var("TESTUP_QUIET").is_ok();
        Self {
            quiet_mode: quiet || env_quiet,
        }
    }

    pub fn should_show_progress(&self) -> bool {
        if self.quiet_mode {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stderr().is_terminal()
    }

    /// Bar over a known number of units
    pub fn create_bar(&self, len: u64) -> ProgressBar {
        if !self.should_show_progress() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::default_bar().template(TEMPLATE_UNITS) {
            pb.set_style(style.progress_chars("█▓▒░  "));
        }
        pb
    }

    /// Spinner for open-ended waits
    pub fn create_spinner(&self, msg: &str) -> ProgressBar {
        if !self.should_show_progress() {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template(TEMPLATE_WAIT) {
            pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
