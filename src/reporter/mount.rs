//! Boot partition mount around address discovery
//!
//! On some images the FAT boot partition is not mounted when the reporter
//! starts. We mount it just long enough to read the address file.

use crate::common::{Error, MountConfig, Result};
use std::ffi::OsString;
use std::path::Path;

/// Runs external commands. Swapped out in tests.
pub trait CommandRunner {
    /// Run `program` with `args`, returning Ok on a zero exit status and the
    /// reason otherwise.
    fn run(
        &self,
        program: &str,
        args: &[OsString],
    ) -> impl std::future::Future<Output = std::result::Result<(), String>> + Send;
}

/// Runs commands on the host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommands;

impl CommandRunner for SystemCommands {
    async fn run(&self, program: &str, args: &[OsString]) -> std::result::Result<(), String> {
        let status = tokio::process::Command::new(program)
            .args(args)
            .status()
            .await
            .map_err(|e| format!("{}: {}", program, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("{} exited with {}", program, status))
        }
    }
}

/// Mount point is absent or an empty directory
pub fn needs_mount(mount_point: &Path) -> bool {
    match std::fs::read_dir(mount_point) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

pub struct BootMount<R = SystemCommands> {
    config: MountConfig,
    runner: R,
}

impl<R: CommandRunner> BootMount<R> {
    pub fn with_runner(config: MountConfig, runner: R) -> Self {
        Self { config, runner }
    }

    async fn exec(&self, command: &str, args: Vec<OsString>) -> std::result::Result<(), String> {
        if self.config.use_sudo {
            let mut full = vec![OsString::from(command)];
            full.extend(args);
            self.runner.run("sudo", &full).await
        } else {
            self.runner.run(command, &args).await
        }
    }

    /// Mount the boot partition if it is not already there.
    /// Returns whether we mounted it (and so must unmount it).
    pub async fn ensure_mounted(&self) -> Result<bool> {
        if !needs_mount(&self.config.mount_point) {
            return Ok(false);
        }

        tracing::debug!(
            "Mounting {} on {}",
            self.config.device.display(),
            self.config.mount_point.display()
        );
        let args = vec![
            self.config.device.clone().into_os_string(),
            self.config.mount_point.clone().into_os_string(),
        ];
        self.exec("mount", args)
            .await
            .map_err(|reason| Error::MountFailed {
                mount_point: self.config.mount_point.clone(),
                reason,
            })?;
        Ok(true)
    }

    /// Undo [`ensure_mounted`](Self::ensure_mounted). Failure is only logged.
    pub async fn release(&self, mounted: bool) {
        if !mounted {
            return;
        }
        let args = vec![self.config.mount_point.clone().into_os_string()];
        if let Err(reason) = self.exec("umount", args).await {
            tracing::warn!(
                "Failed to unmount {}: {}",
                self.config.mount_point.display(),
                reason
            );
        }
    }
}
