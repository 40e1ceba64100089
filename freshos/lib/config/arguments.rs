use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{device::Device, FreshosError, FreshosResult};

use super::Layout;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Prefix of the keys carrying device attributes.
pub const DEVICE_ATTRIBUTE_PREFIX: &str = "device_";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The record the first boot stage leaves behind for everything that runs later.
///
/// It is written once to `<memory>/arguments` and is the only contract between the first
/// stage, the second stage and the snapshot tool, so the field names are fixed:
///
/// ```json
/// {
///   "ld_linux": null,
///   "home": "/memory/data/live",
///   "memory": "/memory",
///   "datamnt": "/memory/data",
///   "union": "/memory/union",
///   "bundles": "/memory/bundles",
///   "changes": "/memory/changes",
///   "workdir": "/memory/workdir",
///   "device": "/dev/sda1",
///   "device_TYPE": "exfat",
///   "device_UUID": "64C4-1EBD"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootArguments {
    /// The dynamic loader the boot environment runs its programs through, if any.
    pub ld_linux: Option<String>,

    /// The resolved home directory.
    pub home: Option<PathBuf>,

    /// The memory directory.
    pub memory: PathBuf,

    /// Mountpoint of the data device.
    pub datamnt: PathBuf,

    /// Mountpoint of the union root.
    pub union: PathBuf,

    /// Parent of the bundle mountpoints.
    pub bundles: PathBuf,

    /// The writable upper layer.
    pub changes: PathBuf,

    /// The overlayfs work directory.
    pub workdir: PathBuf,

    /// The data device.
    pub device: String,

    /// Device attributes, keyed `device_<ATTRIBUTE>`.
    #[serde(flatten)]
    pub device_attributes: BTreeMap<String, String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl BootArguments {
    /// Builds the record for a resolved device and home directory.
    pub fn new(
        ld_linux: Option<String>,
        home: Option<PathBuf>,
        layout: &Layout,
        device: &Device,
    ) -> Self {
        let device_attributes = device
            .attributes()
            .iter()
            .map(|(key, value)| (format!("{}{}", DEVICE_ATTRIBUTE_PREFIX, key), value.clone()))
            .collect();

        Self {
            ld_linux,
            home,
            memory: layout.memory().to_path_buf(),
            datamnt: layout.datamnt(),
            union: layout.union(),
            bundles: layout.bundles(),
            changes: layout.changes(),
            workdir: layout.workdir(),
            device: device.path().to_string(),
            device_attributes,
        }
    }

    /// Returns a device attribute, e.g. `device_attribute("TYPE")`.
    pub fn device_attribute(&self, key: &str) -> Option<&str> {
        self.device_attributes
            .get(&format!("{}{}", DEVICE_ATTRIBUTE_PREFIX, key))
            .map(String::as_str)
    }

    /// The filesystem type of the data device.
    pub fn device_type(&self) -> Option<&str> {
        self.device_attribute("TYPE")
    }

    /// The home directory, or an error naming the argument file that lacks it.
    pub fn require_home(&self, source: &Path) -> FreshosResult<&Path> {
        self.home
            .as_deref()
            .ok_or_else(|| FreshosError::HomeNotConfigured(source.to_path_buf()))
    }

    /// Reads the record from a file.
    pub fn load(path: impl AsRef<Path>) -> FreshosResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FreshosError::FileNotFound(path.to_path_buf()),
            _ => e.into(),
        })?;

        Ok(serde_json::from_str(&contents)?)
    }

    /// Writes the record to a file.
    pub fn store(&self, path: impl AsRef<Path>) -> FreshosResult<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn sample_device() -> Device {
        Device::new(
            "/dev/sda1",
            [
                ("TYPE".to_string(), "exfat".to_string()),
                ("UUID".to_string(), "64C4-1EBD".to_string()),
            ],
        )
    }

    #[test]
    fn test_boot_arguments_field_names() -> anyhow::Result<()> {
        let arguments = BootArguments::new(
            None,
            Some(PathBuf::from("/memory/data/live")),
            &Layout::boot(),
            &sample_device(),
        );

        let value: serde_json::Value = serde_json::to_value(&arguments)?;
        assert_eq!(value["ld_linux"], serde_json::Value::Null);
        assert_eq!(value["home"], "/memory/data/live");
        assert_eq!(value["memory"], "/memory");
        assert_eq!(value["datamnt"], "/memory/data");
        assert_eq!(value["union"], "/memory/union");
        assert_eq!(value["bundles"], "/memory/bundles");
        assert_eq!(value["changes"], "/memory/changes");
        assert_eq!(value["workdir"], "/memory/workdir");
        assert_eq!(value["device"], "/dev/sda1");
        assert_eq!(value["device_TYPE"], "exfat");
        assert_eq!(value["device_UUID"], "64C4-1EBD");

        Ok(())
    }

    #[test]
    fn test_boot_arguments_store_and_load() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("arguments");

        let arguments = BootArguments::new(
            Some("/lib64/ld-linux-x86-64.so.2".to_string()),
            None,
            &Layout::boot(),
            &sample_device(),
        );
        arguments.store(&path)?;

        let loaded = BootArguments::load(&path)?;
        assert_eq!(loaded.device_type(), Some("exfat"));
        assert_eq!(loaded.device_attribute("UUID"), Some("64C4-1EBD"));
        assert!(matches!(
            loaded.require_home(&path),
            Err(FreshosError::HomeNotConfigured(_))
        ));

        Ok(())
    }

    #[test]
    fn test_boot_arguments_missing_file() {
        let result = BootArguments::load("/nonexistent/memory/arguments");
        assert!(matches!(result, Err(FreshosError::FileNotFound(_))));
    }
}
