use std::path::{Path, PathBuf};

use nix::unistd::{chown, Gid, Uid};

use crate::{
    config::{live_path, DATA_MASK_OPTIONS, DEFAULT_INIT_SCRIPT, FSTAB_FILENAME, PERSISTENT_USER_DIRS},
    FreshosResult,
};

use super::{read_passwd, Account};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Virtual filesystems every generated mount table starts with.
pub const STATIC_FSTAB: &str = "proc /proc proc defaults 0 0\n\
                                sysfs /sys sysfs defaults 0 0\n\
                                devpts /dev/pts devpts gid=5,mode=620 0 0\n\
                                tmpfs /dev/shm tmpfs defaults 0 0\n";

/// The program the generated init script hands over to.
pub const MOUNT_STAGE_PROGRAM: &str = "freshos-mount";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// What [`initialize`] generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialization {
    /// The generated mount table.
    pub fstab: PathBuf,

    /// The generated init script.
    pub script: PathBuf,

    /// Mount options of the data device embedded in the script.
    pub data_options: String,

    /// The account owning the data device, the lowest `(uid, gid)` found.
    pub owner: Option<Account>,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Prepares a freshly mounted home directory for persistent use.
///
/// For every account of `<union>/etc/passwd` that also has a directory under `<union>/home`,
/// each well-known per-user directory present there gets a persistent twin under
/// `<home>/home/<user>/`, owned by that account and bind-mounted over the original by the
/// generated mount table. The init script written next to it makes every later boot go
/// straight to [`MOUNT_STAGE_PROGRAM`].
pub fn initialize(union: &Path, home: &Path) -> FreshosResult<Initialization> {
    let accounts = read_passwd(union.join("etc/passwd"))?;

    let mut owners = Vec::new();
    let mut records = Vec::new();
    for user in home_users(&union.join("home"))? {
        let Some(account) = accounts.get(&user) else {
            continue;
        };

        owners.push(*account);
        for dir in PERSISTENT_USER_DIRS {
            if !union.join("home").join(&user).join(dir).is_dir() {
                continue;
            }

            let persistent = home.join("home").join(&user).join(dir);
            std::fs::create_dir_all(&persistent)?;
            if let Err(errno) = chown(
                &persistent,
                Some(Uid::from_raw(account.uid)),
                account.gid.map(Gid::from_raw),
            ) {
                tracing::warn!("unable to chown {}: {}", persistent.display(), errno);
            }

            records.push(bind_record(home, &user, dir));
        }
    }

    let mut fstab_data = STATIC_FSTAB.to_string();
    for record in &records {
        fstab_data.push_str(record);
        fstab_data.push('\n');
    }

    let fstab = home.join(FSTAB_FILENAME);
    std::fs::write(&fstab, fstab_data)?;
    tracing::info!("wrote {} with {} bind mounts", fstab.display(), records.len());

    let owner = owners.into_iter().min();
    let data_options = data_options(owner);

    let script = home.join(DEFAULT_INIT_SCRIPT);
    std::fs::write(&script, render_init_script(&data_options))?;
    tracing::info!("wrote {}", script.display());

    Ok(Initialization {
        fstab,
        script,
        data_options,
        owner,
    })
}

/// Mount options of the data device for the given owner.
pub fn data_options(owner: Option<Account>) -> String {
    match owner {
        None => DATA_MASK_OPTIONS.to_string(),
        Some(Account { uid, gid: None }) => format!("uid={},{}", uid, DATA_MASK_OPTIONS),
        Some(Account {
            uid,
            gid: Some(gid),
        }) => format!("uid={},gid={},{}", uid, gid, DATA_MASK_OPTIONS),
    }
}

/// The init script written into an initialized home directory.
pub fn render_init_script(data_options: &str) -> String {
    format!(
        "#!/bin/sh\n\
         # Generated on first boot. Remounts the data device and stacks the bundles.\n\
         exec {} --data-options '{}'\n",
        MOUNT_STAGE_PROGRAM, data_options
    )
}

fn bind_record(home: &Path, user: &str, dir: &str) -> String {
    let escaped = freshutils::escape_fstab_field(dir);
    format!(
        "{}/home/{}/{} /home/{}/{} none bind,x-gvfs-hide 0 0",
        live_path(home).display(),
        user,
        escaped,
        user,
        escaped
    )
}

fn home_users(home_root: &Path) -> FreshosResult<Vec<String>> {
    if !home_root.is_dir() {
        return Ok(Vec::new());
    }

    let mut users = Vec::new();
    for entry in std::fs::read_dir(home_root)? {
        let entry = entry?;
        if !entry.path().is_dir() {
            continue;
        }

        if let Some(user) = entry.file_name().to_str() {
            users.push(user.to_string());
        }
    }

    users.sort();
    Ok(users)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn union_fixture() -> anyhow::Result<TempDir> {
        let union = TempDir::new()?;
        std::fs::create_dir_all(union.path().join("etc"))?;
        std::fs::write(
            union.path().join("etc/passwd"),
            "root:x:0:0:root:/root:/bin/bash\n\
             alice:x:1000:1000::/home/alice:/bin/bash\n\
             bob:x:1001:staff::/home/bob:/bin/sh\n",
        )?;

        for dir in [
            "home/alice/Documents",
            "home/alice/VirtualBox VMs",
            "home/alice/Projects",
            "home/bob/Desktop",
            "home/ghost/Documents",
        ] {
            std::fs::create_dir_all(union.path().join(dir))?;
        }
        std::fs::write(union.path().join("home/alice/Music"), "not a directory")?;
        Ok(union)
    }

    #[test_log::test]
    fn test_initialize_generates_fstab_and_script() -> anyhow::Result<()> {
        let union = union_fixture()?;
        let home = TempDir::new()?;

        let init = initialize(union.path(), home.path())?;

        assert!(home.path().join("home/alice/Documents").is_dir());
        assert!(home.path().join("home/alice/VirtualBox VMs").is_dir());
        assert!(home.path().join("home/bob/Desktop").is_dir());
        assert!(!home.path().join("home/alice/Projects").exists());
        assert!(!home.path().join("home/alice/Music").exists());
        assert!(!home.path().join("home/ghost").exists());

        let live = live_path(home.path());
        let fstab = std::fs::read_to_string(&init.fstab)?;
        let expected = format!(
            "{STATIC_FSTAB}\
             {live}/home/alice/Documents /home/alice/Documents none bind,x-gvfs-hide 0 0\n\
             {live}/home/alice/VirtualBox\\040VMs /home/alice/VirtualBox\\040VMs none bind,x-gvfs-hide 0 0\n\
             {live}/home/bob/Desktop /home/bob/Desktop none bind,x-gvfs-hide 0 0\n",
            live = live.display()
        );
        assert_eq!(fstab, expected);

        assert_eq!(
            init.owner,
            Some(Account {
                uid: 1000,
                gid: Some(1000)
            })
        );
        assert_eq!(init.data_options, "uid=1000,gid=1000,dmask=0027,fmask=0137");

        let script = std::fs::read_to_string(home.path().join("default.sh"))?;
        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script
            .contains("exec freshos-mount --data-options 'uid=1000,gid=1000,dmask=0027,fmask=0137'"));
        Ok(())
    }

    #[test]
    fn test_initialize_without_users() -> anyhow::Result<()> {
        let union = TempDir::new()?;
        std::fs::create_dir_all(union.path().join("etc"))?;
        std::fs::write(union.path().join("etc/passwd"), "root:x:0:0:root:/root:/bin/bash\n")?;
        let home = TempDir::new()?;

        let init = initialize(union.path(), home.path())?;
        assert_eq!(std::fs::read_to_string(&init.fstab)?, STATIC_FSTAB);
        assert_eq!(init.owner, None);
        assert_eq!(init.data_options, "dmask=0027,fmask=0137");
        Ok(())
    }

    #[test]
    fn test_data_options_without_gid() {
        assert_eq!(
            data_options(Some(Account { uid: 1001, gid: None })),
            "uid=1001,dmask=0027,fmask=0137"
        );
    }
}
