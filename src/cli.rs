use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "testup")]
#[command(about = "Test discovery, execution and API coverage reporting", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to the nearest .testup.toml)
    #[arg(long, global = true, env = "TESTUP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Discover and run tests, then report results
    Run {
        #[command(flatten)]
        selection: Selection,

        #[command(flatten)]
        output: OutputArgs,

        /// Stream per-file JSON events to stdout while tests run
        #[arg(long)]
        live: bool,

        /// Reference list of Class.method entries for API coverage
        #[arg(long = "coverage-list")]
        coverage_list: Option<PathBuf>,

        /// Override the configured host target
        #[arg(long, value_enum)]
        host: Option<HostArg>,

        /// Suppress progress bars
        #[arg(short, long)]
        quiet: bool,
    },

    /// List discovered categories and test units
    List {
        #[command(flatten)]
        selection: Selection,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Parse existing result transcripts
    Parse {
        /// Results files, or run directories containing them
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,

        /// Reference list for API coverage over the parsed results
        #[arg(long = "coverage-list")]
        coverage_list: Option<PathBuf>,
    },

    /// Compute API coverage from a results run directory
    Coverage {
        /// Reference list of Class.method entries
        list: PathBuf,

        /// Results run directory
        run_dir: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,
    },

    /// Serve handoff manifests written by a controller
    Host {
        /// Serve the pending manifest, if any, and exit
        #[arg(long)]
        once: bool,

        /// Suppress progress bars
        #[arg(short, long)]
        quiet: bool,
    },

    /// Initialize a .testup.toml configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Tests root (overrides config)
    #[arg(long = "tests-dir")]
    pub tests_dir: Option<PathBuf>,

    /// Only categories matching this glob
    #[arg(long)]
    pub category: Option<String>,

    /// Only units matching this glob
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "terminal")]
    pub format: OutputFormat,

    /// Output file (defaults to stdout; html defaults to results.html in the results root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    Json,
    Html,
    Terminal,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum HostArg {
    Local,
    Handoff,
}

impl From<HostArg> for crate::config::HostTarget {
    fn from(h: HostArg) -> Self {
        match h {
            HostArg::Local => crate::config::HostTarget::Local,
            HostArg::Handoff => crate::config::HostTarget::Handoff,
        }
    }
}

/// Default log filter for a `-v` count; `RUST_LOG` still wins.
pub fn log_level(verbosity: u8) -> log::LevelFilter {
    match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
