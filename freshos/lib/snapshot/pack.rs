use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use tokio::process::Command;

use crate::{
    cli::AnsiStyles,
    config::{LOG_SERVICE, LOG_SERVICE_KILL_ATTEMPTS, LOG_SERVICE_KILL_PAUSE_MS, PACKED_DIRS},
    rules::CleanupRules,
    FreshosError, FreshosResult,
};

use super::{compress, ArchiveLayout};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

const PACK_WARNING: &str = "Creating the system image will cause all caches and some \
configuration files on your system to be deleted.";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Folds the running system below `root` into a new base image at `output`.
///
/// This is destructive for the live system: the cleanup rules run against `root` itself.
pub async fn pack(
    root: &Path,
    output: &Path,
    yes: bool,
    confirm: impl FnOnce(&str) -> io::Result<bool>,
) -> FreshosResult<Option<PathBuf>> {
    if output.exists() {
        return Err(FreshosError::FileExists(output.to_path_buf()));
    }

    if !yes {
        println!("{}", PACK_WARNING.invalid());
        if !confirm("Continue? [y/N]:")? {
            return Ok(None);
        }
    }

    stop_log_service().await;
    pack_tree(root, output).await.map(Some)
}

/// Purges `root` and compresses its system directories into `output`.
pub async fn pack_tree(root: &Path, output: &Path) -> FreshosResult<PathBuf> {
    CleanupRules::defaults().apply(root, false)?;

    let sources: Vec<PathBuf> = PACKED_DIRS
        .iter()
        .map(|dir| root.join(dir))
        .filter(|dir| dir.is_dir())
        .collect();

    if sources.is_empty() {
        return Err(FreshosError::FileNotFound(root.join(PACKED_DIRS[0])));
    }

    compress(&sources, output, ArchiveLayout::KeepDirectories).await
}

/// Asks the logging service to stop so that no log file changes while packing.
///
/// Best effort: the service may not exist or may already be gone.
pub async fn stop_log_service() {
    for _ in 0..LOG_SERVICE_KILL_ATTEMPTS {
        let mut command = Command::new("killall");
        command.arg(LOG_SERVICE);
        if let Err(e) = freshutils::status(&mut command).await {
            tracing::debug!("unable to signal {}: {}", LOG_SERVICE, e);
        }

        tokio::time::sleep(Duration::from_millis(LOG_SERVICE_KILL_PAUSE_MS)).await;
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_pack_refuses_existing_output() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let output = dir.path().join("01-core.sb");
        std::fs::write(&output, "hsqs")?;

        let result = pack(dir.path(), &output, true, |_| unreachable!()).await;
        assert!(matches!(result, Err(FreshosError::FileExists(_))));
        assert_eq!(std::fs::read_to_string(&output)?, "hsqs");
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_pack_declined() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        std::fs::create_dir_all(dir.path().join("var/log"))?;
        std::fs::write(dir.path().join("var/log/syslog"), "boot")?;
        let output = dir.path().join("01-core.sb");

        let packed = pack(dir.path(), &output, false, |hint| {
            assert_eq!(hint, "Continue? [y/N]:");
            Ok(false)
        })
        .await?;

        assert_eq!(packed, None);
        assert!(dir.path().join("var/log/syslog").exists());
        assert!(!output.exists());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_pack_tree_requires_system_dirs() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let out = TempDir::new()?;
        let result = pack_tree(root.path(), &out.path().join("01-core.sb")).await;
        assert!(matches!(result, Err(FreshosError::FileNotFound(_))));
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_pack_tree_cleans_and_compresses() -> anyhow::Result<()> {
        if super::super::require_tool(crate::config::MKSQUASHFS).is_err() {
            return Ok(());
        }

        let root = TempDir::new()?;
        std::fs::create_dir_all(root.path().join("etc"))?;
        std::fs::create_dir_all(root.path().join("var/log"))?;
        std::fs::write(root.path().join("etc/hostname"), "fresh\n")?;
        std::fs::write(root.path().join("etc/mtab"), "")?;
        std::fs::write(root.path().join("var/log/syslog"), "boot")?;

        let out = TempDir::new()?;
        let output = out.path().join("01-core.sb");
        pack_tree(root.path(), &output).await?;

        assert!(output.is_file());
        assert!(root.path().join("etc/hostname").exists());
        assert!(!root.path().join("etc/mtab").exists());
        assert!(!root.path().join("var/log/syslog").exists());
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_pack_tree_output_inside_packed_dir() -> anyhow::Result<()> {
        let Ok(unsquashfs) = super::super::require_tool("unsquashfs") else {
            return Ok(());
        };
        if super::super::require_tool(crate::config::MKSQUASHFS).is_err() {
            return Ok(());
        }

        let root = TempDir::new()?;
        std::fs::create_dir_all(root.path().join("root"))?;
        std::fs::write(root.path().join("root/.profile"), "umask 022\n")?;
        let output = root.path().join("root/01-core.sb");

        pack_tree(root.path(), &output).await?;

        let listing = freshutils::output(Command::new(unsquashfs).arg("-l").arg(&output)).await?;
        assert!(listing.contains("root/.profile"));
        assert!(!listing.contains(".freshos-"));
        assert!(!listing.contains("01-core.sb"));
        Ok(())
    }
}
