use std::{
    io,
    path::{Path, PathBuf},
    process::Stdio,
};

use chrono::Local;
use freshutils::FreshutilsError;
use tempfile::TempDir;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    process::{Child, Command},
};

use crate::{
    rules::{CleanupRules, ExclusionRules},
    FreshosError, FreshosResult,
};

use super::{compress, require_tool, snapshot_file_name, ArchiveLayout, SnapshotStore};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Lists the writable layer: directories with a trailing `/`, everything else as is.
const FIND_ARGS: &[&str] = &[
    "(", "-type", "d", "-printf", "%p/\n", ",", "-not", "-type", "d", "-print", ")",
];

/// Copies every path read from stdin, relative to the working directory, into `$0`.
const COPY_SCRIPT: &str =
    r#"while IFS= read -r FILE; do cp --parents -af "$FILE" "$0" || exit 1; done"#;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Options of [`save`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveOptions {
    /// Skip the cleanup rules on the captured tree.
    pub no_cleanup: bool,

    /// Do not ask for confirmation.
    pub yes: bool,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Captures the writable layer `changes` as the next snapshot of `store`.
///
/// `confirm` is asked unless [`SaveOptions::yes`] is set; declining returns `Ok(None)` without
/// touching anything. The capture happens in a fresh temporary directory that is always
/// removed afterwards.
pub async fn save(
    store: &SnapshotStore,
    changes: &Path,
    options: SaveOptions,
    confirm: impl FnOnce(&str) -> io::Result<bool>,
) -> FreshosResult<Option<PathBuf>> {
    let index = store.next_index()?;
    let file_name = snapshot_file_name(index, &Local::now());
    let output = store.dir().join(&file_name);

    if !options.yes && !confirm(&format!("Create snapshot \"{}\"? [y/N]:", file_name))? {
        return Ok(None);
    }

    store.ensure_dir()?;

    let staging = TempDir::new()?;
    let captured = capture_changes(changes, staging.path(), &ExclusionRules).await?;
    tracing::info!("captured {} paths from {}", captured, changes.display());

    if !options.no_cleanup {
        CleanupRules::defaults().apply(staging.path(), true)?;
    }

    compress(
        &[staging.path().to_path_buf()],
        &output,
        ArchiveLayout::Contents,
    )
    .await?;

    Ok(Some(output))
}

/// Copies every non-excluded path of `changes` into `destination`, keeping relative paths
/// and metadata. Returns how many paths were handed to the copier.
pub async fn capture_changes(
    changes: &Path,
    destination: &Path,
    rules: &ExclusionRules,
) -> FreshosResult<usize> {
    let mut find = Command::new(require_tool("find")?);
    find.args(FIND_ARGS)
        .current_dir(changes)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    let mut copy = Command::new("sh");
    copy.arg("-c")
        .arg(COPY_SCRIPT)
        .arg(destination)
        .current_dir(changes)
        .stdin(Stdio::piped())
        .stdout(Stdio::null());

    let mut lister = spawn(&mut find)?;
    let mut copier = spawn(&mut copy)?;

    let (Some(listing), Some(mut paths)) = (lister.stdout.take(), copier.stdin.take()) else {
        return Err(FreshosError::custom(anyhow::anyhow!(
            "helper pipes are not connected"
        )));
    };

    let mut rows = BufReader::new(listing).split(b'\n');
    let mut count = 0;
    let mut broken = false;
    while let Some(row) = rows.next_segment().await? {
        let Some(path) = relative_path(&row) else {
            continue;
        };

        if rules.is_excluded(&String::from_utf8_lossy(path)) {
            continue;
        }

        let written = match paths.write_all(path).await {
            Ok(()) => paths.write_all(b"\n").await,
            Err(e) => Err(e),
        };
        match written {
            Ok(()) => count += 1,
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                broken = true;
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    drop(paths);
    drop(rows);

    let listed = lister.wait().await?;
    let copied = copier.wait().await?;

    if !broken && !listed.success() {
        return Err(FreshosError::HelperFailed {
            program: "find".to_string(),
            status: freshutils::exit_code(listed),
            context: "unable to list changes".to_string(),
        });
    }

    if !copied.success() || broken {
        return Err(FreshosError::HelperFailed {
            program: "cp".to_string(),
            status: freshutils::exit_code(copied),
            context: "unable to save changes".to_string(),
        });
    }

    Ok(count)
}

/// Strips the `./` prefix and any trailing `\r` from a listing row. Rows outside of the
/// working directory are dropped.
fn relative_path(row: &[u8]) -> Option<&[u8]> {
    let path = row.strip_prefix(b"./")?;
    Some(path.strip_suffix(b"\r").unwrap_or(path))
}

fn spawn(command: &mut Command) -> FreshosResult<Child> {
    command.spawn().map_err(|source| {
        FreshosError::Utils(FreshutilsError::SpawnFailed {
            program: freshutils::program_name(command),
            source,
        })
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
