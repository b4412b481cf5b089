//! Reporter: announces this device to the coordinator once per boot
//!
//! Sequence:
//! 1. Skip everything if the completion marker exists
//! 2. Mount the boot partition if needed, read the coordinator address, unmount
//! 3. POST the hostname a fixed number of times
//! 4. Write the completion marker
//!
//! Only step 2 can fail the run. Delivery failures are logged and otherwise
//! ignored, so a supervisor never sees a reason to restart the reporter.

pub mod client;
pub mod discovery;
pub mod hostname;
pub mod marker;
pub mod mount;

pub use client::{AttemptFailure, AttemptOutcome, AttemptReport, CheckInClient};
pub use marker::CompletionMarker;
pub use mount::{BootMount, CommandRunner, SystemCommands};

use crate::common::{ReporterConfig, Result};

/// How a reporter run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSummary {
    /// Marker present; no network activity
    Skipped,
    /// Attempt loop ran to the end
    Completed(AttemptReport),
}

/// Run the reporter with the host's mount/umount commands.
pub async fn run(config: &ReporterConfig) -> Result<RunSummary> {
    run_with(config, SystemCommands).await
}

/// Run the reporter, executing mount commands through `runner`.
pub async fn run_with<R: CommandRunner>(config: &ReporterConfig, runner: R) -> Result<RunSummary> {
    let marker = CompletionMarker::new(&config.marker_path);
    if marker.is_set() {
        tracing::info!(
            "Completion marker {} present, nothing to do",
            marker.path().display()
        );
        return Ok(RunSummary::Skipped);
    }

    let address = match &config.mount {
        Some(mount_config) => {
            let mount = BootMount::with_runner(mount_config.clone(), runner);
            let mounted = mount.ensure_mounted().await?;
            let address = discovery::discover_address(&config.search_dirs, &config.address_file);
            mount.release(mounted).await;
            address?
        }
        None => discovery::discover_address(&config.search_dirs, &config.address_file)?,
    };
    let url = discovery::coordinator_url(&address)?;

    let host_name = hostname::local_hostname()?;
    tracing::debug!("Host name: {}", host_name);

    let client = CheckInClient::new(config.timeout(), config.attempts, config.retry_delay())?;
    let report = client.run(&url, &host_name).await;
    tracing::info!(
        "Finished {} attempts, {} succeeded",
        report.attempts(),
        report.successes()
    );

    if let Err(e) = marker.set() {
        tracing::warn!(
            "Could not write completion marker {}: {}",
            marker.path().display(),
            e
        );
    }

    Ok(RunSummary::Completed(report))
}
