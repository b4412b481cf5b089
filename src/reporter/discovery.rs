//! Coordinator address discovery
//!
//! The address lives in a small text file dropped on the SD card's boot
//! partition. The first candidate directory holding it wins.

use crate::common::{Error, Result};
use std::path::{Path, PathBuf};

/// Locate the address file in the first candidate directory that has it.
pub fn find_address_file(search_dirs: &[PathBuf], file_name: &str) -> Result<PathBuf> {
    search_dirs
        .iter()
        .map(|dir| dir.join(file_name))
        .find(|path| path.is_file())
        .ok_or_else(|| Error::AddressFileMissing {
            file: file_name.to_string(),
            searched: search_dirs.to_vec(),
        })
}

/// First line of the address file, trimmed: the coordinator's `host[:port]`.
pub fn read_coordinator_address(path: &Path) -> Result<String> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::AddressFileUnreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let address = contents.lines().next().unwrap_or_default().trim();
    if address.is_empty() {
        return Err(Error::AddressFileUnreadable {
            path: path.to_path_buf(),
            reason: "first line is empty".to_string(),
        });
    }

    Ok(address.to_string())
}

/// Find and read the address file in one step.
pub fn discover_address(search_dirs: &[PathBuf], file_name: &str) -> Result<String> {
    let path = find_address_file(search_dirs, file_name)?;
    let address = read_coordinator_address(&path)?;
    tracing::debug!("IP address found in {}", path.display());
    Ok(address)
}

/// URL the reporter posts to. A bare `host[:port]` gets `http://`.
pub fn coordinator_url(address: &str) -> Result<reqwest::Url> {
    let raw = if address.starts_with("http://") || address.starts_with("https://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    reqwest::Url::parse(&raw)
        .map_err(|e| Error::InvalidConfig(format!("coordinator address {:?}: {}", address, e)))
}
