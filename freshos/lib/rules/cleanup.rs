use std::{
    io,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use glob::{MatchOptions, Pattern};

use crate::{sys::is_whiteout, FreshosResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Known-transient artifacts. A trailing `/` marks an entry whose whole tree is removed.
pub const CLEANUP_RULES: &str = r#"
/etc/.pwd.lock
/etc/apt/sources.list~
/etc/console-setup/cached*
/etc/fstab
/etc/mtab
/etc/ssh/ssh_host*
/etc/systemd/system/timers.target.wants/

# per-user state
/home/*/.bash_history
/home/*/.cache/
/home/*/.local/share/klipper/
/home/*/.python_history
/home/*/.ssh/
/home/*/.sudo_as_admin_successful
/home/*/.Xauthority
/home/*/.xsession-errors
/root/.wget-hsts
/root/.bash_history
/root/.cache/
/root/.python_history
/root/.ssh/
/root/.Xauthority
/root/.xsession-errors

/var/backups/*
/var/cache/man/*/
/var/cache/apparmor/*/
/var/cache/apt/archives/*.deb
/var/cache/apt/*.bin
/var/cache/debconf/*
/var/cache/debconf/*-old
/var/cache/fontconfig/*
/var/cache/ldconfig/*
/var/lib/apt/extended_states
/var/lib/apt/lists/deb.*
/var/lib/connman/*/
/var/lib/dhcp/dhclient.leases
/var/lib/dpkg/*-old
/var/lib/systemd/random-seed
/var/log/*
/var/log/*/*
/var/log/*/*/*
/var/log/journal/*/
"#;

static DEFAULT_RULES: LazyLock<CleanupRules> = LazyLock::new(|| CleanupRules::parse(CLEANUP_RULES));

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// One cleanup entry, relative to the tree it is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRule {
    pattern: String,
    recursive: bool,
}

/// Purges known-transient artifacts from a tree.
///
/// File entries only ever remove regular files and whiteouts. Recursive entries also remove
/// symlinks and whole directory trees. Both kinds expand `*` the way a shell does, without
/// matching names that start with a dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRules {
    rules: Vec<CleanupRule>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl CleanupRule {
    /// The glob, without leading `/`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether matches are removed with everything below them.
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }
}

impl CleanupRules {
    /// Parses one rule per line. Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Self {
        let rules = text
            .lines()
            .map(str::trim_start)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| {
                let line = line.trim_start_matches('/');
                let recursive = line.ends_with('/');
                CleanupRule {
                    pattern: line.trim_end_matches('/').to_string(),
                    recursive,
                }
            })
            .filter(|rule| !rule.pattern.is_empty())
            .collect();

        Self { rules }
    }

    /// The built-in rule set.
    pub fn defaults() -> &'static CleanupRules {
        &DEFAULT_RULES
    }

    /// The parsed rules, in declaration order.
    pub fn rules(&self) -> &[CleanupRule] {
        &self.rules
    }

    /// Applies the rules below `base` and returns how many entries were removed.
    ///
    /// With `ignore_whiteouts`, whiteout markers are left alone: a snapshot must keep them to
    /// record deletions of lower-layer files.
    pub fn apply(&self, base: &Path, ignore_whiteouts: bool) -> FreshosResult<usize> {
        let mut files = Vec::new();
        let mut trees = Vec::new();

        for rule in &self.rules {
            let matches = expand(base, &rule.pattern)?;
            if rule.recursive {
                trees.extend(matches);
            } else {
                files.extend(matches);
            }
        }

        files.sort();
        trees.sort();

        let mut removed = 0;
        for path in files {
            let Some(metadata) = symlink_metadata(&path)? else {
                continue;
            };

            if metadata.file_type().is_file() || (!ignore_whiteouts && is_whiteout(&metadata)) {
                std::fs::remove_file(&path)?;
                tracing::debug!("removed {}", path.display());
                removed += 1;
            }
        }

        for path in trees {
            let Some(metadata) = symlink_metadata(&path)? else {
                continue;
            };

            let file_type = metadata.file_type();
            if file_type.is_dir() {
                std::fs::remove_dir_all(&path)?;
            } else if file_type.is_file()
                || file_type.is_symlink()
                || (!ignore_whiteouts && is_whiteout(&metadata))
            {
                std::fs::remove_file(&path)?;
            } else {
                continue;
            }

            tracing::debug!("removed {}", path.display());
            removed += 1;
        }

        tracing::info!("cleanup removed {} entries below {}", removed, base.display());
        Ok(removed)
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

fn expand(base: &Path, pattern: &str) -> FreshosResult<Vec<PathBuf>> {
    if !pattern.contains('*') {
        return Ok(vec![base.join(pattern)]);
    }

    let full = format!(
        "{}/{}",
        Pattern::escape(base.to_string_lossy().trim_end_matches('/')),
        pattern
    );
    let options = MatchOptions {
        require_literal_leading_dot: true,
        ..MatchOptions::new()
    };

    let mut matches = Vec::new();
    for entry in glob::glob_with(&full, options)? {
        match entry {
            Ok(path) => matches.push(path),
            Err(e) => tracing::warn!("skipping unreadable {}: {}", e.path().display(), e),
        }
    }

    Ok(matches)
}

fn symlink_metadata(path: &Path) -> FreshosResult<Option<std::fs::Metadata>> {
    match std::fs::symlink_metadata(path) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn populate(base: &Path, paths: &[&str]) -> anyhow::Result<()> {
        for path in paths {
            let full = base.join(path.trim_end_matches('/'));
            if path.ends_with('/') {
                std::fs::create_dir_all(full)?;
            } else {
                std::fs::create_dir_all(full.parent().unwrap())?;
                std::fs::write(full, "x")?;
            }
        }
        Ok(())
    }

    #[test]
    fn test_parse_rules() {
        let rules = CleanupRules::parse("# comment\n\n  /etc/fstab\n/home/*/.cache/\n/\n");
        assert_eq!(
            rules.rules(),
            &[
                CleanupRule {
                    pattern: "etc/fstab".to_string(),
                    recursive: false,
                },
                CleanupRule {
                    pattern: "home/*/.cache".to_string(),
                    recursive: true,
                },
            ]
        );
    }

    #[test_log::test]
    fn test_default_rules_purge_transient_files() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        populate(
            root.path(),
            &[
                "etc/fstab",
                "etc/hostname",
                "etc/ssh/ssh_host_ed25519_key",
                "etc/ssh/sshd_config",
                "home/alice/.bash_history",
                "home/alice/.cache/thumbnails/a.png",
                "home/alice/Documents/report.txt",
                "var/cache/apt/archives/vim.deb",
                "var/cache/apt/archives/partial/",
                "var/log/syslog",
                "var/log/apt/history.log",
                "var/log/journal/0123/system.journal",
                "var/log/.keep",
            ],
        )?;

        let removed = CleanupRules::defaults().apply(root.path(), false)?;

        for gone in [
            "etc/fstab",
            "etc/ssh/ssh_host_ed25519_key",
            "home/alice/.bash_history",
            "home/alice/.cache",
            "var/cache/apt/archives/vim.deb",
            "var/log/syslog",
            "var/log/apt/history.log",
            "var/log/journal/0123",
        ] {
            assert!(!root.path().join(gone).exists(), "{gone} should be removed");
        }

        for kept in [
            "etc/hostname",
            "etc/ssh/sshd_config",
            "home/alice/Documents/report.txt",
            "var/cache/apt/archives/partial",
            "var/log/apt",
            "var/log/journal",
            "var/log/.keep",
        ] {
            assert!(root.path().join(kept).exists(), "{kept} should be kept");
        }

        assert_eq!(removed, 9);
        Ok(())
    }

    #[test]
    fn test_file_rules_keep_directories_and_symlinks() -> anyhow::Result<()> {
        let root = TempDir::new()?;
        populate(root.path(), &["etc/mtab/", "root/.ssh/id_rsa"])?;
        std::os::unix::fs::symlink("/proc/self/mounts", root.path().join("etc/fstab"))?;

        CleanupRules::defaults().apply(root.path(), false)?;

        assert!(root.path().join("etc/mtab").is_dir());
        assert!(root.path().join("etc/fstab").symlink_metadata().is_ok());
        assert!(!root.path().join("root/.ssh").exists());
        Ok(())
    }

    #[test]
    fn test_whiteouts_respect_ignore_flag() -> anyhow::Result<()> {
        if !nix::unistd::geteuid().is_root() {
            return Ok(());
        }

        let root = TempDir::new()?;
        populate(root.path(), &["etc/"])?;
        let marker = root.path().join("etc/mtab");
        crate::sys::make_whiteout(&marker)?;

        CleanupRules::defaults().apply(root.path(), true)?;
        assert!(marker.symlink_metadata().is_ok());

        CleanupRules::defaults().apply(root.path(), false)?;
        assert!(marker.symlink_metadata().is_err());
        Ok(())
    }
}
