//! `freshutils::path` is a module containing path utilities for the freshos project.

use typed_path::{Utf8UnixComponent, Utf8UnixPathBuf};

use crate::{FreshutilsError, FreshutilsResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Normalizes a path that must stay below some root directory.
///
/// Rules:
/// - `.` components and redundant separators are dropped
/// - `..` components pop the previous component
/// - a leading `/` is rejected, as is any `..` that would climb above the root
/// - an empty result is rejected
///
/// The data device names its home directory this way (`fresh_os.name=live/home`), and a
/// name must never resolve outside of the mounted device.
pub fn normalize_relative_path(path: &str) -> FreshutilsResult<String> {
    if path.is_empty() {
        return Err(FreshutilsError::PathValidation(
            "Path cannot be empty".to_string(),
        ));
    }

    let path = Utf8UnixPathBuf::from(path);
    let mut normalized: Vec<&str> = Vec::new();

    for component in path.components() {
        match component {
            Utf8UnixComponent::RootDir => {
                return Err(FreshutilsError::PathValidation(
                    "Path must be relative (must not start with '/')".to_string(),
                ));
            }
            Utf8UnixComponent::ParentDir => {
                if normalized.pop().is_none() {
                    return Err(FreshutilsError::PathValidation(
                        "Invalid path: cannot traverse above root directory".to_string(),
                    ));
                }
            }
            Utf8UnixComponent::CurDir => continue,
            Utf8UnixComponent::Normal(c) => {
                if !c.is_empty() {
                    normalized.push(c);
                }
            }
        }
    }

    if normalized.is_empty() {
        return Err(FreshutilsError::PathValidation(
            "Path resolves to the root directory".to_string(),
        ));
    }

    Ok(normalized.join("/"))
}

/// Escapes a single `fstab(5)` field.
///
/// Fields are separated by blanks, so a tab or a space inside a path must be written as its
/// octal escape (`\011`, `\040`).
pub fn escape_fstab_field(field: &str) -> String {
    field.replace('\t', r"\011").replace(' ', r"\040")
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
