use std::sync::LazyLock;

use regex::Regex;

use crate::config::INSTALLED_TOOLS;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Fragments matched against paths relative to the writable layer. Directories carry a
/// trailing `/`.
pub const EXCLUDED_PATTERNS: &[&str] = &[
    r"^$",
    r"/$",
    // overlayfs and aufs bookkeeping
    r"\.wh\.\.wh\.orph/",
    r"^\.wh\.\.pwd\.lock$",
    r"^\.wh\.\.wh\.plnk/",
    r"^\.wh\.\.wh\.aufs$",
    r"^var/cache/",
    r"^var/backups/",
    r"^var/tmp/",
    r"^var/log/",
    r"^var/lib/apt/",
    r"^var/lib/dhcp/",
    r"^var/lib/systemd/",
    r"^sbin/fsck\.aufs$",
    r"^etc/resolv\.conf$",
    r"^root/\.Xauthority$",
    r"^root/\.xsession-errors$",
    r"^etc/mtab$",
    r"^etc/fstab$",
    r"^boot/",
    r"^dev/",
    r"^mnt/",
    r"^proc/",
    r"^run/",
    r"^sys/",
    r"^tmp/",
];

static EXCLUSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    let tools = INSTALLED_TOOLS
        .iter()
        .map(|tool| format!("^usr/bin/{}$", regex::escape(tool)));

    let alternation = EXCLUDED_PATTERNS
        .iter()
        .map(|pattern| pattern.to_string())
        .chain(tools)
        .collect::<Vec<_>>()
        .join("|");

    Regex::new(&alternation).unwrap()
});

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Decides which paths of the writable layer never make it into a snapshot.
///
/// The rules are compiled once into a single alternation and shared by every instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExclusionRules;

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl ExclusionRules {
    /// Whether a relative path is ephemeral.
    pub fn is_excluded(&self, path: &str) -> bool {
        EXCLUSION_REGEX.is_match(path)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_paths_are_excluded() {
        let rules = ExclusionRules;
        for path in [
            "var/log/foo.txt",
            "var/cache/apt/pkgcache.bin",
            "tmp/session",
            "etc/fstab",
            "etc/resolv.conf",
            ".wh..wh.orph/x",
            "home/alice/.wh..wh.orph/x",
            "usr/bin/savechanges",
            "home/alice/",
            "",
        ] {
            assert!(rules.is_excluded(path), "{path:?} should be excluded");
        }
    }

    #[test]
    fn test_user_changes_are_kept() {
        let rules = ExclusionRules;
        for path in [
            "home/alice/Documents/report.txt",
            "etc/hostname",
            "usr/bin/savechanges2",
            "usr/local/bin/sb",
            "home/alice/var/log/notes",
            "etc/fstab.d/extra",
        ] {
            assert!(!rules.is_excluded(path), "{path:?} should be kept");
        }
    }
}
