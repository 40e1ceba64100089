use std::path::{Path, PathBuf};

use crate::{
    bundle::BundleChain,
    config::{Layout, DEFAULT_INIT_SCRIPT},
    sys::{MountSpec, Mounter},
    FreshosError, FreshosResult,
};

use super::{Device, DeviceProbe, Target};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Finds the data device and the entry point on it.
///
/// Candidates are tried in device path order. Each one is mounted on the staging path of the
/// layout and inspected; a rejected candidate is unmounted before the next one is tried, so
/// resolution ends with either exactly one data device mounted or none at all.
///
/// When the target names a UUID, every failure on that device is fatal. Without a UUID, a
/// candidate that does not mount or does not hold the target is skipped.
pub struct Resolver<'a> {
    mounter: &'a dyn Mounter,
    probe: &'a dyn DeviceProbe,
    layout: &'a Layout,
}

/// A successful resolution. The device stays mounted on the layout's data mount.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The data device.
    pub device: Device,

    /// Init script to execute instead of mounting bundles.
    pub init: Option<PathBuf>,

    /// Home directory holding the init script or the bundle chain.
    pub home: Option<PathBuf>,

    /// Bundles to mount, present when a home directory has no init script.
    pub chain: Option<BundleChain>,
}

enum Inspection {
    Found(Resolution),
    Rejected(String),
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl<'a> Resolver<'a> {
    /// Creates a resolver.
    pub fn new(mounter: &'a dyn Mounter, probe: &'a dyn DeviceProbe, layout: &'a Layout) -> Self {
        Self {
            mounter,
            probe,
            layout,
        }
    }

    /// Scans the devices for `target`.
    pub async fn resolve(&self, target: &Target) -> FreshosResult<Resolution> {
        let datamnt = self.layout.datamnt();
        std::fs::create_dir_all(&datamnt)?;

        let mut devices = self.probe.probe().await?;
        devices.sort();

        for device in devices {
            if !device.is_eligible() {
                tracing::debug!("skipping ineligible device {}", device.path());
                continue;
            }

            if let Some(uuid) = &target.uuid {
                if device.uuid() != Some(uuid.as_str()) {
                    continue;
                }
            }

            let spec = MountSpec::device(
                device.path(),
                &datamnt,
                device.fs_type().unwrap_or_default(),
                device.mount_options(),
            );

            if let Err(e) = self.mounter.mount(&spec).await {
                if target.is_pinned() {
                    return Err(e);
                }

                tracing::debug!("skipping {}: {}", device.path(), e);
                continue;
            }

            let inspection = match self.inspect(device, target) {
                Ok(inspection) => inspection,
                Err(e) => {
                    self.mounter.unmount(&datamnt).await?;
                    return Err(e);
                }
            };

            match inspection {
                Inspection::Found(resolution) => {
                    tracing::info!("found {} on {}", target.describe(), resolution.device.path());
                    return Ok(resolution);
                }
                Inspection::Rejected(reason) => {
                    self.mounter.unmount(&datamnt).await?;
                    if target.is_pinned() {
                        return Err(FreshosError::DataDeviceNotFound(reason));
                    }

                    tracing::debug!("rejected candidate: {}", reason);
                }
            }
        }

        Err(FreshosError::DataDeviceNotFound(target.describe()))
    }

    fn inspect(&self, device: Device, target: &Target) -> FreshosResult<Inspection> {
        let datamnt = self.layout.datamnt();

        let Some(name) = &target.name else {
            let init = datamnt.join(DEFAULT_INIT_SCRIPT);
            if init.is_file() {
                return Ok(found(device, Some(init), None, None));
            }

            return Ok(Inspection::Rejected(format!(
                "{} has no {}",
                device.path(),
                DEFAULT_INIT_SCRIPT
            )));
        };

        let path = match freshutils::normalize_relative_path(name) {
            Ok(relative) => datamnt.join(relative),
            Err(e) => {
                tracing::warn!("ignoring target name {:?}: {}", name, e);
                return Ok(Inspection::Rejected(format!("{}: {}", name, e)));
            }
        };

        if path.is_file() {
            let home = path.parent().map(Path::to_path_buf);
            return Ok(found(device, Some(path), home, None));
        }

        if path.is_dir() {
            let init = path.join(DEFAULT_INIT_SCRIPT);
            if init.is_file() {
                return Ok(found(device, Some(init), Some(path), None));
            }

            let chain = BundleChain::discover(&path, &self.layout.bundles())?;
            if chain.is_empty() {
                return Ok(Inspection::Rejected(format!(
                    "{} holds neither {} nor bundles",
                    path.display(),
                    DEFAULT_INIT_SCRIPT
                )));
            }

            return Ok(found(device, None, Some(path), Some(chain)));
        }

        Ok(Inspection::Rejected(format!(
            "{} not found on {}",
            name,
            device.path()
        )))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn found(
    device: Device,
    init: Option<PathBuf>,
    home: Option<PathBuf>,
    chain: Option<BundleChain>,
) -> Inspection {
    Inspection::Found(Resolution {
        device,
        init,
        home,
        chain,
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
