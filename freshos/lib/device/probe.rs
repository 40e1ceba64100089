use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::process::Command;

use crate::{config::BLKID_PATH, parser::parse_tokens, FreshosError, FreshosResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A block device and the attributes `blkid` reported for it.
///
/// Attribute keys are upper-cased (`TYPE`, `UUID`, `LABEL`, ...). Devices order by path, which
/// gives the resolver a deterministic scan order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Device {
    path: String,
    attributes: BTreeMap<String, String>,
}

/// Enumerates the candidate block devices.
#[async_trait]
pub trait DeviceProbe: Send + Sync {
    /// Returns every device the system knows about, in any order.
    async fn probe(&self) -> FreshosResult<Vec<Device>>;
}

/// A [`DeviceProbe`] backed by the `blkid` tool.
#[derive(Debug, Clone)]
pub struct Blkid {
    program: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Device {
    /// Creates a device. Attribute keys are upper-cased.
    pub fn new(
        path: impl Into<String>,
        attributes: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        Self {
            path: path.into(),
            attributes: attributes
                .into_iter()
                .map(|(key, value)| (key.to_uppercase(), value))
                .collect(),
        }
    }

    /// The device node, e.g. `/dev/sda1`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All attributes.
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// A single attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// The filesystem type.
    pub fn fs_type(&self) -> Option<&str> {
        self.attribute("TYPE")
    }

    /// The filesystem UUID.
    pub fn uuid(&self) -> Option<&str> {
        self.attribute("UUID")
    }

    /// Whether the device can hold data at all: not a loop device, not swap, and both a type
    /// and a UUID are known.
    pub fn is_eligible(&self) -> bool {
        if self.path.starts_with("/dev/loop") {
            return false;
        }

        match (self.fs_type(), self.uuid()) {
            (Some(fs_type), Some(_)) => fs_type != "swap",
            _ => false,
        }
    }

    /// The options the data device gets mounted with.
    ///
    /// FAT filesystems get a permissive name check, mixed-case short names and UTF-8 names;
    /// everything else is mounted plain read-write.
    pub fn mount_options(&self) -> Vec<String> {
        let mut options = vec!["rw".to_string()];
        if self.fs_type() == Some("vfat") {
            options.extend(
                ["check=s", "shortname=mixed", "iocharset=utf8"]
                    .iter()
                    .map(|s| s.to_string()),
            );
        }
        options
    }
}

impl Blkid {
    /// Uses the `blkid` at the given path.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Parses `blkid` output: one device per line, `path: KEY="value" ...`.
///
/// Lines without a `:` are ignored. The result is sorted by device path.
pub fn parse_blkid_output(data: &str) -> Vec<Device> {
    let mut devices: Vec<Device> = data
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(path, attributes)| Device::new(path.trim(), parse_tokens(attributes)))
        .collect();

    devices.sort();
    devices
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Blkid {
    fn default() -> Self {
        Self::new(BLKID_PATH)
    }
}

#[async_trait]
impl DeviceProbe for Blkid {
    async fn probe(&self) -> FreshosResult<Vec<Device>> {
        let stdout = freshutils::output(&mut Command::new(&self.program))
            .await
            .map_err(|e| FreshosError::helper(e, "unable to list block devices"))?;

        let devices = parse_blkid_output(&stdout);
        tracing::debug!("blkid reported {} devices", devices.len());
        Ok(devices)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
