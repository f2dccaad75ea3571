//! CLI command implementations.
//!
//! - **run**: discover, execute and report
//! - **list**: show what discovery finds
//! - **parse**: re-read transcripts from earlier runs
//! - **coverage**: API coverage for a finished run
//! - **host**: execute manifests handed off by a controller
//! - **init**: write a default `.testup.toml`

pub mod coverage;
pub mod host;
pub mod init;
pub mod list;
pub mod parse;
pub mod run;

pub use coverage::{coverage_report, CoverageCommand};
pub use host::serve_handoffs;
pub use init::init_config;
pub use list::list_tests;
pub use parse::{parse_results, ParseCommand};
pub use run::{run_tests, RunCommand};

use crate::config::{load_config, load_config_from, TestupConfig};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Explicit `--config` must load; otherwise search upward with defaults.
pub fn resolve_config(path: Option<&Path>) -> Result<TestupConfig> {
    match path {
        Some(path) => load_config_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(load_config()),
    }
}

/// Print `content`, or write it to `output` when given.
pub fn emit(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            log::info!("Output written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
