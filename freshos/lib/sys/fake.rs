//! In-memory stand-ins for the mount table, used by unit tests.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{FreshosError, FreshosResult};

use super::{MountSpec, Mounter};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A [`Mounter`] that "mounts" a source by materializing a fixed file list under the target
/// and "unmounts" by emptying the target again.
#[derive(Debug, Default)]
pub(crate) struct FakeMounter {
    fixtures: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    state: Mutex<FakeMountState>,
}

#[derive(Debug, Default)]
struct FakeMountState {
    active: Vec<PathBuf>,
    history: Vec<MountSpec>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FakeMounter {
    /// Files (or directories, with a trailing `/`) that appear when `source` is mounted.
    pub(crate) fn with_fixture(mut self, source: &str, paths: &[&str]) -> Self {
        self.fixtures.insert(
            source.to_string(),
            paths.iter().map(|p| p.to_string()).collect(),
        );
        self
    }

    /// Makes every mount of `source` fail.
    pub(crate) fn failing(mut self, source: &str) -> Self {
        self.failing.insert(source.to_string());
        self
    }

    /// The targets currently mounted.
    pub(crate) fn active(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().active.clone()
    }

    /// Every mount attempted so far, failed ones included.
    pub(crate) fn history(&self) -> Vec<MountSpec> {
        self.state.lock().unwrap().history.clone()
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

#[async_trait]
impl Mounter for FakeMounter {
    async fn mount(&self, spec: &MountSpec) -> FreshosResult<()> {
        let mut state = self.state.lock().unwrap();
        state.history.push(spec.clone());

        if self.failing.contains(&spec.source) {
            return Err(FreshosError::MountFailed {
                source_path: spec.source.clone(),
                target: spec.target.clone(),
                reason: "wrong fs type, bad option, bad superblock".to_string(),
            });
        }

        for path in self.fixtures.get(&spec.source).into_iter().flatten() {
            let full = spec.target.join(path.trim_end_matches('/'));
            if path.ends_with('/') {
                std::fs::create_dir_all(&full)?;
            } else {
                if let Some(parent) = full.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&full, path.as_bytes())?;
            }
        }

        state.active.push(spec.target.clone());
        Ok(())
    }

    async fn unmount(&self, target: &Path) -> FreshosResult<()> {
        let mut state = self.state.lock().unwrap();
        let Some(position) = state.active.iter().position(|t| t == target) else {
            return Err(FreshosError::UnmountFailed {
                target: target.to_path_buf(),
                reason: "not mounted".to_string(),
            });
        };
        state.active.remove(position);

        for entry in std::fs::read_dir(target)? {
            let path = entry?.path();
            if path.is_dir() {
                std::fs::remove_dir_all(path)?;
            } else {
                std::fs::remove_file(path)?;
            }
        }

        Ok(())
    }
}
