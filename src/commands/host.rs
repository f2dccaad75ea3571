use crate::config::TestupConfig;
use crate::handoff::Handoff;
use crate::progress::ProgressConfig;
use crate::runner::CommandLoader;
use anyhow::{Context, Result};
use crossbeam::channel::never;

/// Execute manifests as controllers hand them off. With `once`, serve the
/// pending manifest if there is one and return.
pub fn serve_handoffs(config: &TestupConfig, once: bool, quiet: bool) -> Result<()> {
    let loader = CommandLoader::from_template(&config.runner.command)?;
    let handoff = Handoff::new(&config.handoff.dir);
    let progress = ProgressConfig::from_env(quiet);

    if once {
        if !handoff.is_pending() {
            println!("No pending manifest in {}", handoff.dir().display());
            return Ok(());
        }
        let outcome = handoff
            .serve(&loader, progress.create_bar(0))
            .context("Failed to serve manifest")?;
        println!("Served {} units", outcome.units.len());
        return Ok(());
    }

    log::info!("Watching {} for manifests", handoff.dir().display());
    loop {
        handoff.wait_for_manifest(config.handoff.poll_interval(), None, &never())?;
        // A failed manifest is answered with the failure marker; keep watching
        match handoff.serve(&loader, progress.create_bar(0)) {
            Ok(outcome) => println!("Served {} units", outcome.units.len()),
            Err(e) => log::error!("Failed to serve manifest: {}", e),
        }
    }
}
