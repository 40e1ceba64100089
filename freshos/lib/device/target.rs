use std::collections::HashMap;

use crate::config::{CMDLINE_NAME_KEY, CMDLINE_TARGET_KEY, CMDLINE_UUID_KEY};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What the operator asked to boot.
///
/// Without a UUID every eligible device is searched; without a name the default init script
/// at the root of the device is the entry point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// UUID of the data device.
    pub uuid: Option<String>,

    /// Name of the init script or home directory on the data device.
    pub name: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Target {
    /// Derives the target from parsed kernel parameters.
    ///
    /// `fresh_os=UUID/name` sets both halves, split on the first `/`. `fresh_os.uuid` and
    /// `fresh_os.name` override the corresponding half. When a parameter repeats, the last
    /// occurrence wins; empty values count as absent.
    pub fn from_params(params: &[(String, String)]) -> Self {
        let params: HashMap<&str, &str> = params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        let non_empty = |key: &str| {
            params
                .get(key)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        let mut uuid = non_empty(CMDLINE_UUID_KEY);
        let mut name = non_empty(CMDLINE_NAME_KEY);

        if let Some((combined_uuid, combined_name)) = params
            .get(CMDLINE_TARGET_KEY)
            .and_then(|value| value.split_once('/'))
        {
            if uuid.is_none() && !combined_uuid.is_empty() {
                uuid = Some(combined_uuid.to_string());
            }
            if name.is_none() && !combined_name.is_empty() {
                name = Some(combined_name.to_string());
            }
        }

        Self { uuid, name }
    }

    /// Whether a device was explicitly requested; failures on it are then fatal.
    pub fn is_pinned(&self) -> bool {
        self.uuid.is_some()
    }

    /// A printable form, `UUID/name` with absent halves left empty.
    pub fn describe(&self) -> String {
        match (&self.uuid, &self.name) {
            (Some(uuid), Some(name)) => format!("{}/{}", uuid, name),
            (Some(uuid), None) => uuid.clone(),
            (None, Some(name)) => format!("/{}", name),
            (None, None) => "any device".to_string(),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
