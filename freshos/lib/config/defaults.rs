use std::{path::PathBuf, sync::LazyLock};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Kernel parameter holding `UUID/name` in one value.
pub const CMDLINE_TARGET_KEY: &str = "fresh_os";

/// Kernel parameter holding the UUID of the data device.
pub const CMDLINE_UUID_KEY: &str = "fresh_os.uuid";

/// Kernel parameter holding the name of the home directory or init script.
pub const CMDLINE_NAME_KEY: &str = "fresh_os.name";

/// Where the kernel exposes its command line.
pub const PROC_CMDLINE_PATH: &str = "/proc/cmdline";

/// The device identification tool.
pub const BLKID_PATH: &str = "/sbin/blkid";

/// Root of the in-memory state of the boot environment.
pub const DEFAULT_MEMORY_DIR: &str = "/memory";

/// Where the boot environment stays reachable once the union root is running.
pub const DEFAULT_INITRAMFS_ROOT: &str = "/run/initramfs";

/// Environment variable overriding [`DEFAULT_INITRAMFS_ROOT`].
pub const INITRAMFS_ROOT_ENV_VAR: &str = "FRESHOS_INITRAMFS_ROOT";

/// The init script looked up in a home directory or at the root of the data device.
pub const DEFAULT_INIT_SCRIPT: &str = "default.sh";

/// Shell used to execute init scripts.
pub const INIT_SHELL: &str = "/bin/sh";

/// The generated mount table stored in the home directory.
pub const FSTAB_FILENAME: &str = "fstab.txt";

/// Extension of bundle archives.
pub const BUNDLE_EXTENSION: &str = "sb";

/// Subdirectory of a home directory holding snapshot bundles.
pub const SNAPSHOTS_SUBDIR: &str = "snapshots";

/// The highest snapshot index.
pub const MAX_SNAPSHOT_INDEX: u32 = 28;

/// Filesystem types whose data mount gets remounted with ownership options on later boots.
pub const REMOUNT_FILESYSTEMS: &[&str] = &["exfat"];

/// Mount options of the data device once the owner of the home directory is known.
pub const DATA_MASK_OPTIONS: &str = "dmask=0027,fmask=0137";

/// Per-user directories that are kept on the data device across boots.
pub const PERSISTENT_USER_DIRS: &[&str] = &[
    "Desktop",
    "Documents",
    "Downloads",
    "Music",
    "Pictures",
    "Public",
    "Templates",
    "Videos",
    "VirtualBox VMs",
];

/// Directory in the boot environment holding the tools installed into every union root.
pub const TOOLS_SHARE_DIR: &str = "usr/share/fresh_os";

/// Tools copied into `/usr/bin` of the union root on every boot.
pub const INSTALLED_TOOLS: &[&str] = &[
    "dir2sb",
    "initramfs_pack",
    "initramfs_unpack",
    "rmsbdir",
    "savechanges",
    "sb",
    "sb2dir",
];

/// Helper scripts exported together with the boot environment.
pub const EXPORTED_SHARE_FILES: &[&str] = &[
    "dir2sb",
    "init.in",
    "initramfs_pack",
    "initramfs_unpack",
    "rmsbdir",
    "sb",
    "sb2dir",
];

/// Binaries of the boot environment that are exported.
pub const EXPORTED_BINARIES: &[&str] = &[
    "blkid",
    "busybox",
    "eject",
    "freshos-boot",
    "freshos-mount",
];

/// Top-level directories captured into a packed base image.
pub const PACKED_DIRS: &[&str] = &[
    "bin", "etc", "home", "lib", "lib64", "libx32", "opt", "root", "sbin", "srv", "usr", "var",
];

/// Default file name of a packed base image.
pub const DEFAULT_PACK_OUTPUT: &str = "01-core.sb";

/// Default directory name of an exported build system.
pub const DEFAULT_EXPORT_OUTPUT: &str = "mkinitramfs";

/// Logging service that keeps log files open while the system runs.
pub const LOG_SERVICE: &str = "systemd-journald";

/// How many times the logging service gets a termination request before packing.
pub const LOG_SERVICE_KILL_ATTEMPTS: usize = 5;

/// Pause between two termination requests, in milliseconds.
pub const LOG_SERVICE_KILL_PAUSE_MS: u64 = 500;

/// The squashfs compressor.
pub const MKSQUASHFS: &str = "mksquashfs";

/// Compression settings shared by snapshots and packed images.
pub const SQUASHFS_COMPRESSION_ARGS: &[&str] = &[
    "-comp",
    "xz",
    "-b",
    "1024K",
    "-Xbcj",
    "x86",
    "-always-use-fragments",
];

/// Timestamp format embedded in snapshot file names.
pub const SNAPSHOT_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The root of the boot environment as seen from the running system.
pub static DEFAULT_INITRAMFS_PATH: LazyLock<PathBuf> = LazyLock::new(|| {
    std::env::var_os(INITRAMFS_ROOT_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_INITRAMFS_ROOT))
});
