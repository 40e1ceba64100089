use std::{
    io,
    os::unix::fs::DirBuilderExt,
    path::{Path, PathBuf},
};

use crate::{
    config::{EXPORTED_BINARIES, EXPORTED_SHARE_FILES, TOOLS_SHARE_DIR},
    FreshosError, FreshosResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Subdirectory of an export holding the boot environment toolset.
pub const EXPORT_ASSETS_DIR: &str = "assets";

/// Script run by the boot environment when the machine goes down.
pub const SHUTDOWN_SCRIPT: &str = "shutdown";

/// The lifecycle tool, as shipped in the boot environment.
pub const LIFECYCLE_TOOL: &str = "savechanges";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Copies the toolset of the boot environment at `initramfs_root` into a new directory
/// `output`, ready to build another boot image from.
///
/// `output` must not exist. On failure the partially written directory is removed.
pub fn export(initramfs_root: &Path, output: &Path) -> FreshosResult<PathBuf> {
    if output.exists() {
        return Err(FreshosError::FileExists(output.to_path_buf()));
    }

    let output = std::path::absolute(output)?;
    match copy_toolset(initramfs_root, &output) {
        Ok(copied) => {
            tracing::info!("exported {} files to {}", copied, output.display());
            Ok(output)
        }
        Err(e) => {
            if let Err(cleanup) = std::fs::remove_dir_all(&output) {
                tracing::warn!("unable to remove {}: {}", output.display(), cleanup);
            }
            Err(e)
        }
    }
}

fn copy_toolset(initramfs_root: &Path, output: &Path) -> FreshosResult<usize> {
    let assets = output.join(EXPORT_ASSETS_DIR);
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o755)
        .create(&assets)?;

    let share = initramfs_root.join(TOOLS_SHARE_DIR);
    let bin = initramfs_root.join("bin");

    let copies = EXPORTED_SHARE_FILES
        .iter()
        .map(|name| (share.join(name), assets.join(name)))
        .chain(
            EXPORTED_BINARIES
                .iter()
                .map(|name| (bin.join(name), assets.join(name))),
        )
        .chain([
            (
                initramfs_root.join(SHUTDOWN_SCRIPT),
                assets.join(SHUTDOWN_SCRIPT),
            ),
            (share.join(LIFECYCLE_TOOL), output.join(LIFECYCLE_TOOL)),
        ]);

    let mut copied = 0;
    for (source, destination) in copies {
        copy_file(&source, &destination)?;
        copied += 1;
    }

    Ok(copied)
}

fn copy_file(source: &Path, destination: &Path) -> FreshosResult<()> {
    match std::fs::copy(source, destination) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(FreshosError::FileNotFound(source.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
