use std::path::{Path, PathBuf};

use crate::{
    config::{BUNDLE_EXTENSION, SNAPSHOTS_SUBDIR},
    FreshosResult,
};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Where a bundle comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// A bundle directly inside the home directory.
    Base,

    /// A bundle inside the `snapshots` subdirectory.
    Snapshot,
}

/// One read-only filesystem layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    path: PathBuf,
    mountpoint: PathBuf,
    index: Option<u32>,
    kind: BundleKind,
}

/// The bundles of a home directory in enumeration order: base bundles first, then snapshots,
/// each group sorted by file name.
///
/// The union precedence is the reverse of this order, so the newest snapshot always shadows
/// everything below it and the base bundles form the foundation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleChain {
    bundles: Vec<Bundle>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Bundle {
    /// The archive file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the archive gets mounted.
    pub fn mountpoint(&self) -> &Path {
        &self.mountpoint
    }

    /// The numeric prefix of the file name, if any.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Whether this is a base bundle or a snapshot.
    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    /// The file name of the archive.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl BundleChain {
    /// Enumerates the bundles of `home`. Mountpoints are derived below `bundles_dir`.
    ///
    /// A missing `snapshots` subdirectory simply contributes no bundles.
    pub fn discover(home: &Path, bundles_dir: &Path) -> FreshosResult<Self> {
        let mut bundles = scan(home, bundles_dir, BundleKind::Base)?;

        let snapshots = home.join(SNAPSHOTS_SUBDIR);
        if snapshots.is_dir() {
            bundles.extend(scan(
                &snapshots,
                &bundles_dir.join(SNAPSHOTS_SUBDIR),
                BundleKind::Snapshot,
            )?);
        }

        tracing::debug!("found {} bundles in {}", bundles.len(), home.display());
        Ok(Self { bundles })
    }

    /// Whether the chain holds no bundle.
    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// The number of bundles.
    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    /// The bundles in enumeration order, which is also the mount order.
    pub fn bundles(&self) -> &[Bundle] {
        &self.bundles
    }

    /// The bundles from highest to lowest union precedence.
    pub fn precedence(&self) -> impl Iterator<Item = &Bundle> {
        self.bundles.iter().rev()
    }

    /// The overlayfs `lowerdir` value: mountpoints from highest to lowest precedence.
    pub fn lowerdir(&self) -> String {
        self.precedence()
            .map(|bundle| bundle.mountpoint.display().to_string())
            .collect::<Vec<_>>()
            .join(":")
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the stem of a bundle file name, `None` when the name is not a bundle.
///
/// Only the lowercase extension counts, so `a.sb` and `a.SB` never share a mountpoint. A bare
/// `.sb` is not a bundle.
pub fn bundle_stem(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    (!stem.is_empty() && extension == BUNDLE_EXTENSION).then_some(stem)
}

/// Parses the numeric index in front of the first `-` of a bundle name.
///
/// `02-20240102T000000.sb` has index 2; `core.sb` and `x1-core.sb` have none.
pub fn parse_index(file_name: &str) -> Option<u32> {
    let stem = bundle_stem(file_name).unwrap_or(file_name);
    let prefix = stem.split_once('-').map_or(stem, |(prefix, _)| prefix);
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    prefix.parse().ok()
}

fn scan(dir: &Path, mount_root: &Path, kind: BundleKind) -> FreshosResult<Vec<Bundle>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            tracing::warn!("skipping non UTF-8 file name in {}", dir.display());
            continue;
        };

        if bundle_stem(&name).is_some() && entry.path().is_file() {
            names.push(name);
        }
    }

    names.sort();

    Ok(names
        .into_iter()
        .filter_map(|name| {
            let stem = bundle_stem(&name)?.to_string();
            Some(Bundle {
                path: dir.join(&name),
                mountpoint: mount_root.join(stem),
                index: parse_index(&name),
                kind,
            })
        })
        .collect())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn touch(path: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"hsqs")?;
        Ok(())
    }

    #[test]
    fn test_newest_snapshot_has_highest_precedence() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        touch(home.path().join("02-extra.sb"))?;
        touch(home.path().join("01-core.sb"))?;
        touch(home.path().join("snapshots/02-20240102T000000.sb"))?;
        touch(home.path().join("snapshots/01-20240101T000000.sb"))?;

        let chain = BundleChain::discover(home.path(), Path::new("/memory/bundles"))?;
        let order: Vec<_> = chain.precedence().map(Bundle::file_name).collect();
        assert_eq!(
            order,
            vec![
                "02-20240102T000000.sb",
                "01-20240101T000000.sb",
                "02-extra.sb",
                "01-core.sb",
            ]
        );

        assert_eq!(
            chain.lowerdir(),
            "/memory/bundles/snapshots/02-20240102T000000:\
             /memory/bundles/snapshots/01-20240101T000000:\
             /memory/bundles/02-extra:/memory/bundles/01-core"
        );

        let kinds: Vec<_> = chain.bundles().iter().map(Bundle::kind).collect();
        assert_eq!(
            kinds,
            vec![
                BundleKind::Base,
                BundleKind::Base,
                BundleKind::Snapshot,
                BundleKind::Snapshot
            ]
        );
        Ok(())
    }

    #[test]
    fn test_discover_skips_non_bundles() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        touch(home.path().join(".sb"))?;
        touch(home.path().join("notes.txt"))?;
        touch(home.path().join("default.sh"))?;
        std::fs::create_dir(home.path().join("dir.sb"))?;
        touch(home.path().join("legacy.sb"))?;

        let chain = BundleChain::discover(home.path(), Path::new("/memory/bundles"))?;
        assert_eq!(chain.len(), 1);

        let bundle = &chain.bundles()[0];
        assert_eq!(bundle.file_name(), "legacy.sb");
        assert_eq!(bundle.mountpoint(), Path::new("/memory/bundles/legacy"));
        assert_eq!(bundle.index(), None);
        Ok(())
    }

    #[test]
    fn test_uppercase_extension_does_not_share_mountpoint() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        touch(home.path().join("a.sb"))?;
        touch(home.path().join("a.SB"))?;
        touch(home.path().join("snapshots/01-20240101T000000.Sb"))?;

        let chain = BundleChain::discover(home.path(), Path::new("/memory/bundles"))?;
        let mounts: Vec<_> = chain
            .bundles()
            .iter()
            .map(|bundle| (bundle.file_name(), bundle.mountpoint().to_path_buf()))
            .collect();
        assert_eq!(
            mounts,
            vec![("a.sb".to_string(), PathBuf::from("/memory/bundles/a"))]
        );
        Ok(())
    }

    #[test]
    fn test_empty_home_gives_empty_chain() -> anyhow::Result<()> {
        let home = TempDir::new()?;
        let chain = BundleChain::discover(home.path(), Path::new("/memory/bundles"))?;
        assert!(chain.is_empty());
        assert_eq!(chain.lowerdir(), "");
        Ok(())
    }

    #[test]
    fn test_parse_index() {
        assert_eq!(parse_index("01-core.sb"), Some(1));
        assert_eq!(parse_index("28-20240101T000000.sb"), Some(28));
        assert_eq!(parse_index("7.sb"), Some(7));
        assert_eq!(parse_index("core.sb"), None);
        assert_eq!(parse_index("x1-core.sb"), None);
        assert_eq!(parse_index("-core.sb"), None);
    }

    #[test]
    fn test_bundle_stem() {
        assert_eq!(bundle_stem("01-core.sb"), Some("01-core"));
        assert_eq!(bundle_stem("archive.tar.sb"), Some("archive.tar"));
        assert_eq!(bundle_stem("01-core.SB"), None);
        assert_eq!(bundle_stem(".sb"), None);
        assert_eq!(bundle_stem("core"), None);
        assert_eq!(bundle_stem("core.sqfs"), None);
    }
}
