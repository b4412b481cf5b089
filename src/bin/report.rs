//! Reporter binary, run once per boot on each Pi
//!
//! Exits 0 whenever the attempt loop ran (or was skipped because of the
//! completion marker), whatever the attempts returned. Fatal setup errors
//! exit with a code per cause; see [`hellopi::Error::exit_code`].

use clap::Parser;
use hellopi::common::{parse_millis, Config, Error, MountConfig, ReporterConfig};
use hellopi::reporter::{self, RunSummary};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hellopi-report")]
#[command(about = "Announce this Raspberry Pi's hostname to the classroom coordinator")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ./hellopi.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to search for the address file, in order (repeatable)
    #[arg(long = "search-dir")]
    search_dirs: Vec<PathBuf>,

    /// Name of the address file
    #[arg(long)]
    address_file: Option<String>,

    /// Number of submissions
    #[arg(long)]
    attempts: Option<u32>,

    /// Pause between submissions (e.g. 10s, 500ms)
    #[arg(long, value_parser = millis_arg)]
    retry_delay: Option<u64>,

    /// Network timeout per submission
    #[arg(long, value_parser = millis_arg)]
    timeout: Option<u64>,

    /// Completion marker path
    #[arg(long)]
    marker: Option<PathBuf>,

    /// Boot partition block device
    #[arg(long)]
    mount_device: Option<PathBuf>,

    /// Where the boot partition is mounted
    #[arg(long)]
    mount_point: Option<PathBuf>,

    /// Never mount the boot partition
    #[arg(long, conflicts_with_all = ["mount_device", "mount_point"])]
    no_mount: bool,

    /// Run mount/umount without sudo
    #[arg(long)]
    no_sudo: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Logging level
    #[arg(long)]
    log_level: Option<String>,
}

fn millis_arg(s: &str) -> Result<u64, String> {
    parse_millis(s).map_err(|e| e.to_string())
}

impl Cli {
    fn apply(self, config: &mut ReporterConfig) {
        if !self.search_dirs.is_empty() {
            config.search_dirs = self.search_dirs;
        }
        if let Some(name) = self.address_file {
            config.address_file = name;
        }
        if let Some(attempts) = self.attempts {
            config.attempts = attempts;
        }
        if let Some(delay) = self.retry_delay {
            config.retry_delay_ms = delay;
        }
        if let Some(timeout) = self.timeout {
            config.timeout_ms = timeout;
        }
        if let Some(marker) = self.marker {
            config.marker_path = marker;
        }
        if self.no_mount {
            config.mount = None;
        } else if self.mount_device.is_some() || self.mount_point.is_some() || self.no_sudo {
            let mount = config.mount.get_or_insert_with(MountConfig::default);
            if let Some(device) = self.mount_device {
                mount.device = device;
            }
            if let Some(point) = self.mount_point {
                mount.mount_point = point;
            }
            if self.no_sudo {
                mount.use_sudo = false;
            }
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
    }
}

fn init_tracing(level: &str, log_file: Option<&PathBuf>) -> hellopi::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.to_string().into());

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::log_file(path, e))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .map_err(|e| Error::Logging(e.to_string()))
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| Error::Logging(e.to_string())),
    }
}

fn fail(err: Error) -> ! {
    tracing::error!("{}", err);
    eprintln!("ERROR: {}", err);
    std::process::exit(err.exit_code());
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let mut cli = Cli::parse();

    let config = match Config::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(e),
    };
    let level = cli.log_level.take().unwrap_or(config.log_level);
    let mut reporter_config = config.reporter;
    cli.apply(&mut reporter_config);

    if let Err(e) = init_tracing(&level, reporter_config.log_file.as_ref()) {
        fail(e);
    }

    match reporter::run(&reporter_config).await {
        Ok(RunSummary::Skipped) => {}
        Ok(RunSummary::Completed(report)) => {
            tracing::debug!(
                "{} of {} attempts succeeded",
                report.successes(),
                report.attempts()
            );
        }
        Err(e) => fail(e),
    }
}
