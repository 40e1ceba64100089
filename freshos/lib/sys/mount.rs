use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(target_os = "linux")]
use nix::mount::{mount, umount, MsFlags};
use tokio::process::Command;

use crate::{FreshosError, FreshosResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The mount program, used where the kernel interface is not enough (loop devices).
pub const MOUNT_PROGRAM: &str = "/bin/mount";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Everything needed to mount one filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountSpec {
    /// The device, archive or pseudo source (`overlay`).
    pub source: String,

    /// The mountpoint.
    pub target: PathBuf,

    /// The filesystem type.
    pub fstype: String,

    /// Mount options, `rw`/`ro` included.
    pub options: Vec<String>,

    /// Whether the source is a file that needs a loop device.
    pub loop_device: bool,
}

/// Mounts and unmounts filesystems.
///
/// The resolver and the bundle chain only talk to this trait, so their failure handling can
/// be exercised without touching the real mount table.
#[async_trait]
pub trait Mounter: Send + Sync {
    /// Mounts a filesystem.
    async fn mount(&self, spec: &MountSpec) -> FreshosResult<()>;

    /// Unmounts whatever is mounted at `target`.
    async fn unmount(&self, target: &Path) -> FreshosResult<()>;
}

/// The [`Mounter`] of the running kernel.
///
/// Block devices and overlays go straight to `mount(2)`. Bundle archives go through
/// `/bin/mount -o loop`, which takes care of allocating the loop device.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMounter;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl MountSpec {
    /// A block device mount.
    pub fn device(
        device: impl Into<String>,
        target: impl Into<PathBuf>,
        fstype: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            source: device.into(),
            target: target.into(),
            fstype: fstype.into(),
            options: options.into_iter().map(Into::into).collect(),
            loop_device: false,
        }
    }

    /// A read-only squashfs bundle mounted through a loop device.
    pub fn bundle(archive: &Path, target: impl Into<PathBuf>) -> Self {
        Self {
            source: archive.display().to_string(),
            target: target.into(),
            fstype: "squashfs".to_string(),
            options: vec!["ro".to_string()],
            loop_device: true,
        }
    }

    /// An overlay of `lowerdir` (highest precedence first) beneath one writable layer.
    pub fn overlay(
        lowerdir: impl Into<String>,
        upperdir: &Path,
        workdir: &Path,
        target: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: "overlay".to_string(),
            target: target.into(),
            fstype: "overlay".to_string(),
            options: vec![
                format!("lowerdir={}", lowerdir.into()),
                format!("upperdir={}", upperdir.display()),
                format!("workdir={}", workdir.display()),
            ],
            loop_device: false,
        }
    }

    /// The options joined the way `mount -o` expects them.
    pub fn options_string(&self) -> String {
        self.options.join(",")
    }

    /// Splits the options into kernel flags and filesystem-specific data.
    #[cfg(target_os = "linux")]
    fn flags_and_data(&self) -> (MsFlags, Option<String>) {
        let mut flags = MsFlags::empty();
        let mut data = Vec::new();
        for option in &self.options {
            match option.as_str() {
                "ro" => flags |= MsFlags::MS_RDONLY,
                "rw" => flags.remove(MsFlags::MS_RDONLY),
                "noatime" => flags |= MsFlags::MS_NOATIME,
                "nodev" => flags |= MsFlags::MS_NODEV,
                "nosuid" => flags |= MsFlags::MS_NOSUID,
                "noexec" => flags |= MsFlags::MS_NOEXEC,
                other => data.push(other),
            }
        }

        let data = (!data.is_empty()).then(|| data.join(","));
        (flags, data)
    }

    fn failed(&self, reason: impl ToString) -> FreshosError {
        FreshosError::MountFailed {
            source_path: self.source.clone(),
            target: self.target.clone(),
            reason: reason.to_string(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Mounter for SystemMounter {
    async fn mount(&self, spec: &MountSpec) -> FreshosResult<()> {
        tracing::debug!(
            "mounting {} on {} (type={}, options={})",
            spec.source,
            spec.target.display(),
            spec.fstype,
            spec.options_string()
        );

        if spec.loop_device {
            let mut options = vec!["loop".to_string()];
            options.extend(spec.options.iter().cloned());

            let mut command = Command::new(MOUNT_PROGRAM);
            command
                .arg("-o")
                .arg(options.join(","))
                .arg("-t")
                .arg(&spec.fstype)
                .arg(&spec.source)
                .arg(&spec.target);

            return freshutils::run(&mut command)
                .await
                .map_err(|e| spec.failed(e));
        }

        #[cfg(target_os = "linux")]
        {
            let (flags, data) = spec.flags_and_data();
            mount(
                Some(spec.source.as_str()),
                &spec.target,
                Some(spec.fstype.as_str()),
                flags,
                data.as_deref(),
            )
            .map_err(|errno| spec.failed(errno))
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(spec.failed("mounting is only supported on linux"))
        }
    }

    async fn unmount(&self, target: &Path) -> FreshosResult<()> {
        tracing::debug!("unmounting {}", target.display());

        #[cfg(target_os = "linux")]
        {
            umount(target).map_err(|errno| FreshosError::UnmountFailed {
                target: target.to_path_buf(),
                reason: errno.to_string(),
            })
        }

        #[cfg(not(target_os = "linux"))]
        {
            Err(FreshosError::UnmountFailed {
                target: target.to_path_buf(),
                reason: "unmounting is only supported on linux".to_string(),
            })
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
