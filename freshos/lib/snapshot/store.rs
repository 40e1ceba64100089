use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, TimeZone};

use crate::{
    bundle::{bundle_stem, parse_index},
    config::{live_path, BootArguments, Layout, BUNDLE_EXTENSION, MAX_SNAPSHOT_INDEX, SNAPSHOTS_SUBDIR, SNAPSHOT_TIMESTAMP_FORMAT},
    FreshosError, FreshosResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One snapshot bundle on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// File name inside the snapshot directory.
    pub file_name: String,

    /// Numeric prefix of the file name.
    pub index: Option<u32>,
}

/// The `snapshots` directory of the home directory the system booted from.
///
/// Nothing is cached: every query reads the directory again.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SnapshotStore {
    /// A store rooted at an explicit directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The store of the running system, located through the boot arguments.
    pub fn live() -> FreshosResult<Self> {
        let source = Layout::live().arguments();
        let arguments = BootArguments::load(&source)?;
        let home = arguments.require_home(&source)?;
        Ok(Self::new(live_path(home).join(SNAPSHOTS_SUBDIR)))
    }

    /// The snapshot directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a snapshot.
    pub fn path(&self, snapshot: &Snapshot) -> PathBuf {
        self.dir.join(&snapshot.file_name)
    }

    /// All snapshots in file name order. A missing directory holds no snapshot.
    pub fn list(&self) -> FreshosResult<Vec<Snapshot>> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        for entry in entries {
            let entry = entry?;
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };

            if bundle_stem(&file_name).is_none() || !entry.path().is_file() {
                continue;
            }

            snapshots.push(Snapshot {
                index: parse_index(&file_name),
                file_name,
            });
        }

        snapshots.sort_by(|a, b| a.file_name.cmp(&b.file_name));
        Ok(snapshots)
    }

    /// The index the next snapshot gets: one past the highest existing index.
    pub fn next_index(&self) -> FreshosResult<u32> {
        let highest = self.list()?.into_iter().filter_map(|s| s.index).max();
        match highest {
            None => Ok(1),
            Some(index) if index >= MAX_SNAPSHOT_INDEX => {
                Err(FreshosError::SnapshotIndexOutOfRange(index))
            }
            Some(index) => Ok(index + 1),
        }
    }

    /// The most recent snapshot: the highest index, or the last file name when no snapshot
    /// carries an index.
    pub fn latest(&self) -> FreshosResult<Snapshot> {
        let snapshots = self.list()?;
        let latest = snapshots
            .iter()
            .filter(|s| s.index.is_some())
            .max_by(|a, b| (a.index, &a.file_name).cmp(&(b.index, &b.file_name)))
            .or_else(|| snapshots.last())
            .cloned();

        latest.ok_or_else(|| FreshosError::SnapshotNotFound(self.dir.clone()))
    }

    /// Creates the snapshot directory when missing.
    pub fn ensure_dir(&self) -> FreshosResult<()> {
        match std::fs::metadata(&self.dir) {
            Ok(metadata) if metadata.is_dir() => Ok(()),
            Ok(_) => Err(FreshosError::NotADirectory(self.dir.clone())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                std::fs::create_dir_all(&self.dir)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Builds a snapshot file name, `NN-YYYYMMDDTHHMMSS.sb`.
pub fn snapshot_file_name<Tz: TimeZone>(index: u32, created: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "{:02}-{}.{}",
        index,
        created.format(SNAPSHOT_TIMESTAMP_FORMAT),
        BUNDLE_EXTENSION
    )
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
