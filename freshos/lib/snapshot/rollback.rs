use std::{io, path::PathBuf};

use crate::{cli::AnsiStyles, FreshosResult};

use super::{Snapshot, SnapshotStore};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Lists the snapshots of `store` in file name order.
pub fn list(store: &SnapshotStore) -> FreshosResult<Vec<Snapshot>> {
    store.list()
}

/// Deletes the most recent snapshot of `store`.
///
/// Returns the deleted path, or `None` when the confirmation was declined.
pub fn rollback(
    store: &SnapshotStore,
    yes: bool,
    confirm: impl FnOnce(&str) -> io::Result<bool>,
) -> FreshosResult<Option<PathBuf>> {
    let latest = store.latest()?;
    let path = store.path(&latest);

    let hint = format!(
        "{} [y/N]:",
        format!("Delete snapshot \"{}\"?", latest.file_name).invalid()
    );
    if !yes && !confirm(&hint)? {
        return Ok(None);
    }

    std::fs::remove_file(&path)?;
    tracing::info!("deleted snapshot {}", path.display());
    Ok(Some(path))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::FreshosError;

    use super::*;

    #[test]
    fn test_rollback_deletes_latest_only() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        for name in ["01-20240101T000000.sb", "02-20240102T000000.sb"] {
            std::fs::write(dir.path().join(name), "hsqs")?;
        }
        let store = SnapshotStore::new(dir.path());

        let declined = rollback(&store, false, |hint| {
            assert!(hint.contains("Delete snapshot \"02-20240102T000000.sb\"?"));
            assert!(hint.ends_with(" [y/N]:"));
            Ok(false)
        })?;
        assert_eq!(declined, None);
        assert_eq!(list(&store)?.len(), 2);

        let deleted = rollback(&store, true, |_| unreachable!())?;
        assert_eq!(deleted, Some(dir.path().join("02-20240102T000000.sb")));

        let names: Vec<_> = list(&store)?.into_iter().map(|s| s.file_name).collect();
        assert_eq!(names, vec!["01-20240101T000000.sb"]);
        Ok(())
    }

    #[test]
    fn test_rollback_without_snapshots() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let store = SnapshotStore::new(dir.path());
        assert!(matches!(
            rollback(&store, true, |_| Ok(true)),
            Err(FreshosError::SnapshotNotFound(_))
        ));
        Ok(())
    }
}
