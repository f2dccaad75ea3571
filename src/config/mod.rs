//! Configuration loading for testup.
//!
//! Settings live in `.testup.toml`, found by walking up from the current
//! directory. Every field has a default so an empty file (or no file) is a
//! valid configuration.

mod core;
mod loader;

pub use core::{HandoffConfig, HostTarget, RunnerConfig, TestupConfig};
pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_FILE_NAME,
};

/// Contents written by `testup init`
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# TestUp Configuration

tests_dir = "tests"
results_dir = "results"
test_extension = "rb"
intro_file = "intro.html"
class_prefix = "TC_"
# coverage_list = "coverage.txt"

# "local" runs tests in this process, "handoff" hands a manifest to `testup host`
host = "local"

[runner]
command = "ruby {file} --name {test}"

[handoff]
dir = ".testup-handoff"
poll_interval_secs = 3
timeout_secs = 600
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    #[test]
    fn test_default_template_parses_to_defaults() {
        let config = parse_and_validate_config(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, TestupConfig::default());
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_and_validate_config("").unwrap();
        assert_eq!(config.test_extension, "rb");
        assert_eq!(config.host, HostTarget::Local);
        assert_eq!(config.handoff.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.handoff.timeout(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_handoff_host_and_no_timeout() {
        let config = parse_and_validate_config(
            r#"
host = "handoff"
[handoff]
timeout_secs = 0
poll_interval_secs = 0
"#,
        )
        .unwrap();
        assert_eq!(config.host, HostTarget::Handoff);
        assert_eq!(config.handoff.timeout(), None);
        assert_eq!(config.handoff.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        assert!(parse_and_validate_config("test_extension = \".rb\"").is_err());
        assert!(parse_and_validate_config("test_extension = \"\"").is_err());
    }

    #[test]
    fn test_rejects_unknown_host() {
        assert!(parse_and_validate_config("host = \"sketchy\"").is_err());
    }

    #[test]
    fn test_load_config_from_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "tests_dir = \"suite\"\ncoverage_list = \"/abs/list.txt\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.tests_dir, dir.path().join("suite"));
        assert_eq!(config.results_dir, dir.path().join("results"));
        assert_eq!(config.coverage_list, Some(PathBuf::from("/abs/list.txt")));
    }

    #[test]
    fn test_load_config_from_missing_file_is_config_error() {
        let err = load_config_from(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_directory_ancestors_respects_depth() {
        let dirs: Vec<_> = directory_ancestors(PathBuf::from("/a/b/c"), 2).collect();
        assert_eq!(dirs, vec![PathBuf::from("/a/b/c"), PathBuf::from("/a/b")]);
    }
}
