//! Configuration for hellopi components
//!
//! Values come from an optional `hellopi.toml`, then `HELLOPI__SECTION__KEY`
//! environment variables. The binaries apply their command-line flags last.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::Result;

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "hellopi";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Coordinator-specific config
    #[serde(default)]
    pub coordinator: CoordinatorConfig,

    /// Reporter-specific config
    #[serde(default)]
    pub reporter: ReporterConfig,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load `hellopi.toml` (if present) and the environment. An explicit
    /// `path` must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("HELLOPI")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("reporter.search_dirs"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

/// Deployment profile. Selects the default database location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    pub fn default_db_path(&self) -> PathBuf {
        match self {
            Profile::Development => PathBuf::from("messages.db"),
            Profile::Production => PathBuf::from("/var/lib/hellopi/messages.db"),
        }
    }
}

/// Coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Interface to listen on
    pub host: IpAddr,

    /// HTTP port
    pub port: u16,

    /// Verbose logging
    pub debug: bool,

    /// Deployment profile
    pub profile: Profile,

    /// SQLite database file (profile default when unset)
    pub db_path: Option<PathBuf>,

    /// Remove known test entries on startup
    pub clean_test_entries: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5001,
            debug: false,
            profile: Profile::default(),
            db_path: None,
            clean_test_entries: true,
        }
    }
}

impl CoordinatorConfig {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn database_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| self.profile.default_db_path())
    }
}

/// Boot partition mount performed around address discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Block device holding the boot partition
    pub device: PathBuf,

    /// Directory the device is mounted on
    pub mount_point: PathBuf,

    /// Prefix mount/umount with sudo
    #[serde(default = "default_use_sudo")]
    pub use_sudo: bool,
}

fn default_use_sudo() -> bool {
    true
}

impl Default for MountConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/mmcblk0p1"),
            mount_point: PathBuf::from("/boot/firmware"),
            use_sudo: default_use_sudo(),
        }
    }
}

/// Reporter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// Directories searched, in order, for the address file
    pub search_dirs: Vec<PathBuf>,

    /// Name of the file holding the coordinator address
    pub address_file: String,

    /// Number of submissions per boot
    pub attempts: u32,

    /// Pause between attempts
    pub retry_delay_ms: u64,

    /// Per-request network timeout
    pub timeout_ms: u64,

    /// Completion marker; its presence skips all network activity
    pub marker_path: PathBuf,

    /// Boot partition mount, if any
    pub mount: Option<MountConfig>,

    /// Log file (stderr when unset)
    pub log_file: Option<PathBuf>,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        Self {
            search_dirs: vec![PathBuf::from("/boot"), PathBuf::from("/boot/firmware")],
            address_file: "hello_ip.txt".to_string(),
            attempts: 3,
            retry_delay_ms: 10_000,
            timeout_ms: 10_000,
            marker_path: PathBuf::from("/run/hellopi/reported"),
            mount: Some(MountConfig::default()),
            log_file: None,
        }
    }
}

impl ReporterConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
