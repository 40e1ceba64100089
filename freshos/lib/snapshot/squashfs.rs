use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::process::Command;

use crate::{
    config::{MKSQUASHFS, SQUASHFS_COMPRESSION_ARGS},
    FreshosError, FreshosResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How the sources are laid out in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// The content of a single source directory becomes the archive root.
    Contents,

    /// Every source directory keeps its own name below the archive root.
    KeepDirectories,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Locates a helper program on `PATH`.
pub fn require_tool(program: &str) -> FreshosResult<PathBuf> {
    which::which(program).map_err(|e| {
        tracing::debug!("{} not found: {}", program, e);
        FreshosError::FileNotFound(PathBuf::from(program))
    })
}

/// Compresses `sources` into a new squashfs archive at `output`.
///
/// The archive is first written next to `output` under a temporary name, then moved into
/// place without replacing anything: an existing `output` fails with
/// [`FreshosError::FileExists`] and leaves no partial file behind.
pub async fn compress(
    sources: &[PathBuf],
    output: &Path,
    layout: ArchiveLayout,
) -> FreshosResult<PathBuf> {
    let Some(file_name) = output.file_name() else {
        return Err(FreshosError::custom(anyhow::anyhow!(
            "invalid archive path {}",
            output.display()
        )));
    };

    let program = require_tool(MKSQUASHFS)?;

    let parent = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(".freshos-")
        .tempdir_in(parent)?;
    let partial = staging.path().join(file_name);

    let mut command = Command::new(program);
    command
        .args(sources)
        .arg(&partial)
        .args(SQUASHFS_COMPRESSION_ARGS)
        .arg(match layout {
            ArchiveLayout::Contents => "-noappend",
            ArchiveLayout::KeepDirectories => "-keep-as-directory",
        });

    // mksquashfs takes the exclude list last
    if let Some(nested) = nested_in_sources(staging.path(), sources)? {
        tracing::debug!("excluding staging directory {}", nested.display());
        command.arg("-e").arg(nested);
    }

    tracing::info!("compressing {} sources into {}", sources.len(), output.display());
    freshutils::run(&mut command)
        .await
        .map_err(|e| FreshosError::helper(e, format!("unable to create {}", output.display())))?;

    TempPath::from_path(&partial)
        .persist_noclobber(output)
        .map_err(|e| match e.error.kind() {
            std::io::ErrorKind::AlreadyExists => FreshosError::FileExists(output.to_path_buf()),
            _ => FreshosError::Io(e.error),
        })?;

    Ok(output.to_path_buf())
}

/// Returns the absolute path of `staging` when it lies below one of `sources`, so that the
/// archive does not pick up its own partial output.
pub fn nested_in_sources(staging: &Path, sources: &[PathBuf]) -> FreshosResult<Option<PathBuf>> {
    let staging = std::fs::canonicalize(staging)?;
    for source in sources {
        let Ok(source) = std::fs::canonicalize(source) else {
            continue;
        };

        if staging.starts_with(&source) {
            return Ok(Some(staging));
        }
    }

    Ok(None)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_require_tool() {
        assert!(require_tool("sh").is_ok());
        assert!(matches!(
            require_tool("freshos-no-such-tool"),
            Err(FreshosError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_nested_staging_is_detected() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        let packed = root.path().join("root");
        let elsewhere = root.path().join("srv");
        std::fs::create_dir_all(&packed)?;
        std::fs::create_dir_all(&elsewhere)?;

        let staging = tempfile::Builder::new()
            .prefix(".freshos-")
            .tempdir_in(&packed)?;

        let nested = nested_in_sources(staging.path(), &[elsewhere.clone(), packed.clone()])?;
        assert_eq!(nested, Some(std::fs::canonicalize(staging.path())?));

        let missing = root.path().join("opt");
        assert_eq!(nested_in_sources(staging.path(), &[elsewhere, missing])?, None);
        Ok(())
    }

    #[test_log::test(tokio::test)]
    async fn test_compress_rejects_output_without_file_name() {
        let result = compress(&[], Path::new("/"), ArchiveLayout::Contents).await;
        assert!(matches!(
            result,
            Err(FreshosError::Custom(ref e)) if e.to_string() == "invalid archive path /"
        ));
    }

    #[test_log::test(tokio::test)]
    async fn test_compress_refuses_to_overwrite() -> anyhow::Result<()> {
        if require_tool(MKSQUASHFS).is_err() {
            return Ok(());
        }

        let source = TempDir::new()?;
        std::fs::write(source.path().join("hostname"), "fresh\n")?;
        let out_dir = TempDir::new()?;
        let output = out_dir.path().join("01-test.sb");

        compress(&[source.path().to_path_buf()], &output, ArchiveLayout::Contents).await?;
        assert!(std::fs::metadata(&output)?.len() > 0);

        let again =
            compress(&[source.path().to_path_buf()], &output, ArchiveLayout::Contents).await;
        assert!(matches!(again, Err(FreshosError::FileExists(_))));

        let leftovers = std::fs::read_dir(out_dir.path())?.count();
        assert_eq!(leftovers, 1);
        Ok(())
    }
}
