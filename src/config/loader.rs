use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use super::core::TestupConfig;
use crate::errors::{Error, IoResultExt, Result};

pub const CONFIG_FILE_NAME: &str = ".testup.toml";

/// Read config file contents
pub(crate) fn read_config_file(path: &Path) -> std::result::Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and validate config from TOML string
pub fn parse_and_validate_config(contents: &str) -> Result<TestupConfig> {
    let config = toml::from_str::<TestupConfig>(contents)?;

    if config.test_extension.trim().is_empty() {
        return Err(Error::config("test_extension must not be empty"));
    }
    if config.test_extension.starts_with('.') {
        return Err(Error::config(format!(
            "test_extension should be given without a leading dot: {}",
            config.test_extension
        )));
    }
    if !config.runner.command.contains("{file}") {
        log::warn!(
            "Runner command '{}' has no {{file}} placeholder",
            config.runner.command
        );
    }

    Ok(config)
}

/// Try loading config from a specific path, warning on anything but absence
pub(crate) fn try_load_config_from_path(config_path: &Path) -> Option<TestupConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            handle_read_error(config_path, &e);
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("Loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{}: {}. Using defaults.", config_path.display(), e);
            None
        }
    }
}

/// Handle file read errors with appropriate logging
pub(crate) fn handle_read_error(config_path: &Path, error: &std::io::Error) {
    // Only log actual errors, not "file not found"
    if error.kind() != std::io::ErrorKind::NotFound {
        log::warn!(
            "Failed to read config file {}: {}",
            config_path.display(),
            error
        );
    }
}

/// Generate directory ancestors up to a depth limit
pub fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Search upward from the current directory for `.testup.toml`.
///
/// Relative paths in the returned config are resolved against the directory
/// the file was found in.
pub fn load_config() -> TestupConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!(
                "Failed to get current directory: {}. Using default config.",
                e
            );
            return TestupConfig::default();
        }
    };

    directory_ancestors(current, MAX_TRAVERSAL_DEPTH)
        .find_map(|dir| {
            try_load_config_from_path(&dir.join(CONFIG_FILE_NAME))
                .map(|config| resolve_relative_paths(config, &dir))
        })
        .unwrap_or_else(|| {
            log::debug!(
                "No config found after checking {} directories. Using default config.",
                MAX_TRAVERSAL_DEPTH
            );
            TestupConfig::default()
        })
}

/// Load an explicitly requested config file; unlike discovery, failures are errors.
pub fn load_config_from(path: &Path) -> Result<TestupConfig> {
    if !path.is_file() {
        return Err(Error::config_with_path(
            format!("config file not found: {}", path.display()),
            path,
        ));
    }
    let contents = read_config_file(path).with_path("Failed to read config", path)?;
    let config = parse_and_validate_config(&contents)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(resolve_relative_paths(config, base))
}

pub(crate) fn resolve_relative_paths(mut config: TestupConfig, base: &Path) -> TestupConfig {
    let resolve = |p: &Path| {
        if p.is_relative() {
            base.join(p)
        } else {
            p.to_path_buf()
        }
    };
    config.tests_dir = resolve(&config.tests_dir);
    config.results_dir = resolve(&config.results_dir);
    config.coverage_list = config.coverage_list.as_deref().map(resolve);
    config.handoff.dir = resolve(&config.handoff.dir);
    config
}
