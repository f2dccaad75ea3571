use anyhow::Result;
use clap::Parser;
use std::path::Path;
use testup::cli::{log_level, Cli, Commands};
use testup::commands::{self, CoverageCommand, ParseCommand, RunCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    let all_passed = dispatch(cli.command, cli.config.as_deref())?;

    if !all_passed {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Returns false when tests failed, so the process can exit non-zero.
fn dispatch(command: Commands, config_path: Option<&Path>) -> Result<bool> {
    // Loaded per command: `init` runs before any config exists
    let config = || commands::resolve_config(config_path);
    match command {
        Commands::Run {
            selection,
            output,
            live,
            coverage_list,
            host,
            quiet,
        } => commands::run_tests(
            &config()?,
            RunCommand {
                selection,
                format: output.format,
                output: output.output,
                live,
                coverage_list,
                host: host.map(Into::into),
                quiet,
            },
        ),
        Commands::List { selection, format } => {
            commands::list_tests(&config()?, &selection, format)?;
            Ok(true)
        }
        Commands::Parse {
            paths,
            output,
            coverage_list,
        } => commands::parse_results(
            &config()?,
            ParseCommand {
                paths,
                format: output.format,
                output: output.output,
                coverage_list,
            },
        ),
        Commands::Coverage {
            list,
            run_dir,
            format,
        } => {
            commands::coverage_report(
                &config()?,
                CoverageCommand {
                    list,
                    run_dir,
                    format,
                },
            )?;
            Ok(true)
        }
        Commands::Host { once, quiet } => {
            commands::serve_handoffs(&config()?, once, quiet)?;
            Ok(true)
        }
        Commands::Init { force } => {
            commands::init_config(force)?;
            Ok(true)
        }
    }
}
