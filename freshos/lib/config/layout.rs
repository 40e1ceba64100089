use std::path::{Path, PathBuf};

use super::{DEFAULT_INITRAMFS_PATH, DEFAULT_MEMORY_DIR};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Mountpoint of the data device, relative to the memory directory.
pub const DATA_SUBDIR: &str = "data";

/// Mountpoint of the union root, relative to the memory directory.
pub const UNION_SUBDIR: &str = "union";

/// Parent of the per-bundle mountpoints, relative to the memory directory.
pub const BUNDLES_SUBDIR: &str = "bundles";

/// The writable upper layer, relative to the memory directory.
pub const CHANGES_SUBDIR: &str = "changes";

/// The overlayfs work directory, relative to the memory directory.
pub const WORKDIR_SUBDIR: &str = "workdir";

/// The boot argument file, relative to the memory directory.
pub const ARGUMENTS_FILENAME: &str = "arguments";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The fixed set of paths the boot stages and the snapshot tool agree on.
///
/// Everything hangs off one memory directory: `/memory` inside the boot environment, and
/// `/run/initramfs/memory` once the union root has taken over.
///
/// ```text
/// <memory>/
/// ├── arguments     # JSON hand-off between the boot stages
/// ├── data/         # the data device
/// ├── bundles/      # one read-only mountpoint per bundle
/// ├── changes/      # overlayfs upper directory
/// ├── workdir/      # overlayfs work directory
/// └── union/        # the merged root
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    memory: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Layout {
    /// Creates a layout rooted at the given memory directory.
    pub fn new(memory: impl Into<PathBuf>) -> Self {
        Self {
            memory: memory.into(),
        }
    }

    /// The layout used inside the boot environment.
    pub fn boot() -> Self {
        Self::new(DEFAULT_MEMORY_DIR)
    }

    /// The layout of the boot environment as seen from the running union root.
    pub fn live() -> Self {
        Self::new(live_path(DEFAULT_MEMORY_DIR))
    }

    /// The memory directory itself.
    pub fn memory(&self) -> &Path {
        &self.memory
    }

    /// Mountpoint of the data device.
    pub fn datamnt(&self) -> PathBuf {
        self.memory.join(DATA_SUBDIR)
    }

    /// Mountpoint of the union root.
    pub fn union(&self) -> PathBuf {
        self.memory.join(UNION_SUBDIR)
    }

    /// Parent directory of the bundle mountpoints.
    pub fn bundles(&self) -> PathBuf {
        self.memory.join(BUNDLES_SUBDIR)
    }

    /// The writable upper layer.
    pub fn changes(&self) -> PathBuf {
        self.memory.join(CHANGES_SUBDIR)
    }

    /// The overlayfs work directory.
    pub fn workdir(&self) -> PathBuf {
        self.memory.join(WORKDIR_SUBDIR)
    }

    /// The boot argument file.
    pub fn arguments(&self) -> PathBuf {
        self.memory.join(ARGUMENTS_FILENAME)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Maps an absolute path of the boot environment to where the running system sees it.
///
/// `/memory/data/live` becomes `/run/initramfs/memory/data/live`.
pub fn live_path(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let relative = path.strip_prefix("/").unwrap_or(path);
    DEFAULT_INITRAMFS_PATH.join(relative)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_layout_paths() {
        let layout = Layout::boot();
        assert_eq!(layout.memory(), Path::new("/memory"));
        assert_eq!(layout.datamnt(), PathBuf::from("/memory/data"));
        assert_eq!(layout.union(), PathBuf::from("/memory/union"));
        assert_eq!(layout.bundles(), PathBuf::from("/memory/bundles"));
        assert_eq!(layout.changes(), PathBuf::from("/memory/changes"));
        assert_eq!(layout.workdir(), PathBuf::from("/memory/workdir"));
        assert_eq!(layout.arguments(), PathBuf::from("/memory/arguments"));
    }

    #[test]
    fn test_live_path_prefixes_initramfs_root() {
        if std::env::var_os(super::super::INITRAMFS_ROOT_ENV_VAR).is_some() {
            return;
        }

        assert_eq!(
            live_path("/memory/data/live"),
            PathBuf::from("/run/initramfs/memory/data/live")
        );
        assert_eq!(
            Layout::live().changes(),
            PathBuf::from("/run/initramfs/memory/changes")
        );
    }
}
