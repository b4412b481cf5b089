//! Local hostname lookup

use crate::common::{Error, Result};
use std::path::{Path, PathBuf};

const HOSTNAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

/// This device's hostname, as the kernel reports it.
pub fn local_hostname() -> Result<String> {
    let files: Vec<PathBuf> = HOSTNAME_FILES.iter().map(PathBuf::from).collect();
    hostname_from(&files, std::env::var("HOSTNAME").ok())
}

fn hostname_from(files: &[PathBuf], env_fallback: Option<String>) -> Result<String> {
    files
        .iter()
        .filter_map(|path| read_name(path))
        .next()
        .or_else(|| env_fallback.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
        .ok_or_else(|| Error::Internal("could not determine hostname".into()))
}

fn read_name(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    let name = contents.lines().next()?.trim();
    (!name.is_empty()).then(|| name.to_string())
}
