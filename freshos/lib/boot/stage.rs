use std::{
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tokio::process::Command;

use crate::{
    bundle::{mount_chain, BundleChain},
    cli::print_step,
    config::{
        BootArguments, Layout, FSTAB_FILENAME, INIT_SHELL, INSTALLED_TOOLS, REMOUNT_FILESYSTEMS,
    },
    device::{DeviceProbe, Resolver, Target},
    sys::{MountSpec, Mounter},
    FreshosError, FreshosResult,
};

use super::{initialize, Initialization};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The command forcing a reboot once a home directory has been initialized.
pub const REBOOT_COMMAND: &[&str] = &["reboot", "-f"];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// How the first stage ended.
#[derive(Debug)]
pub enum FirstStageOutcome {
    /// An init script was executed and exited with `status`.
    Executed {
        /// The script.
        script: PathBuf,

        /// Its exit status.
        status: i32,
    },

    /// A home directory was mounted and initialized; the machine must reboot.
    Initialized(Initialization),
}

/// Everything the first stage needs from the outside world.
pub struct FirstStage<'a> {
    /// Mounts the data device, the bundles and the union.
    pub mounter: &'a dyn Mounter,

    /// Enumerates block devices.
    pub probe: &'a dyn DeviceProbe,

    /// Well-known paths of the boot environment.
    pub layout: &'a Layout,

    /// Dynamic loader prefixed to the init script, if any.
    pub ld_linux: Option<String>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FirstStage<'_> {
    /// Resolves `target`, records the boot arguments and either runs the init script found or
    /// mounts and initializes the home directory found.
    pub async fn run(&self, target: &Target) -> FreshosResult<FirstStageOutcome> {
        print_step("Looking for data ..");
        let resolution = Resolver::new(self.mounter, self.probe, self.layout)
            .resolve(target)
            .await?;
        print_step(format!("Found on {}", resolution.device.path()));

        let arguments = BootArguments::new(
            self.ld_linux.clone(),
            resolution.home.clone(),
            self.layout,
            &resolution.device,
        );
        arguments.store(self.layout.arguments())?;

        if let Some(script) = resolution.init {
            println!("Execute the setup script {}", script.display());
            let status = run_init_script(&script, self.ld_linux.as_deref()).await?;
            return Ok(FirstStageOutcome::Executed { script, status });
        }

        let (Some(home), Some(chain)) = (resolution.home, resolution.chain) else {
            return Err(FreshosError::DataDeviceNotFound(target.describe()));
        };

        print_step("Mounting bundles");
        let union = mount_chain(self.mounter, self.layout, &chain, |bundle| {
            print_step(bundle.file_name())
        })
        .await?;

        let initialization = initialize(&union, &home)?;
        print_step("Initialization completed");
        println!(
            "The startup file has been generated at \"{}\"",
            initialization.script.display()
        );

        Ok(FirstStageOutcome::Initialized(initialization))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Mounts the bundle chain of the recorded home directory on later boots.
///
/// The data device is first remounted with `data_options` when its filesystem needs explicit
/// ownership options. After the union is up, the generated mount table and the lifecycle
/// tools from `tools_dir` are installed into it.
pub async fn second_stage(
    mounter: &dyn Mounter,
    arguments: &BootArguments,
    data_options: Option<&str>,
    tools_dir: &Path,
) -> FreshosResult<PathBuf> {
    let layout = Layout::new(&arguments.memory);
    let home = arguments.require_home(&layout.arguments())?;

    if let Some(options) = data_options {
        let remount = arguments
            .device_type()
            .is_some_and(|fs_type| REMOUNT_FILESYSTEMS.iter().any(|t| *t == fs_type));
        if remount {
            remount_data(mounter, arguments, options).await?;
        }
    }

    let chain = BundleChain::discover(home, &arguments.bundles)?;

    print_step("Mounting bundles");
    let union = mount_chain(mounter, &layout, &chain, |bundle| {
        print_step(bundle.file_name())
    })
    .await?;

    install_fstab(home, &union)?;
    install_tools(tools_dir, &union)?;
    Ok(union)
}

/// Remounts the data device with new options.
pub async fn remount_data(
    mounter: &dyn Mounter,
    arguments: &BootArguments,
    options: &str,
) -> FreshosResult<()> {
    mounter.unmount(&arguments.datamnt).await?;
    let spec = MountSpec::device(
        arguments.device.as_str(),
        &arguments.datamnt,
        arguments.device_type().unwrap_or_default(),
        options.split(',').filter(|option| !option.is_empty()),
    );
    mounter.mount(&spec).await?;

    tracing::info!("remounted {} with {}", arguments.device, options);
    Ok(())
}

/// Copies the generated mount table of `home` to `<union>/etc/fstab`.
pub fn install_fstab(home: &Path, union: &Path) -> FreshosResult<()> {
    let source = home.join(FSTAB_FILENAME);
    if !source.is_file() {
        tracing::warn!("no mount table at {}", source.display());
        return Ok(());
    }

    let etc = union.join("etc");
    std::fs::create_dir_all(&etc)?;
    std::fs::copy(&source, etc.join("fstab"))?;
    Ok(())
}

/// Installs the lifecycle tools into `<union>/usr/bin` with mode 0755.
///
/// A tool missing from `tools_dir` is logged and skipped.
pub fn install_tools(tools_dir: &Path, union: &Path) -> FreshosResult<()> {
    let bin = union.join("usr/bin");
    std::fs::create_dir_all(&bin)?;

    for tool in INSTALLED_TOOLS {
        let source = tools_dir.join(tool);
        let destination = bin.join(tool);
        if let Err(e) = std::fs::copy(&source, &destination) {
            tracing::warn!("unable to install {}: {}", source.display(), e);
            continue;
        }

        std::fs::set_permissions(&destination, std::fs::Permissions::from_mode(0o755))?;
    }

    Ok(())
}

/// Executes an init script with the shell, through the dynamic loader when one is given.
pub async fn run_init_script(script: &Path, ld_linux: Option<&str>) -> FreshosResult<i32> {
    let mut command = match ld_linux {
        Some(ld_linux) => {
            let mut command = Command::new(ld_linux);
            command.arg(INIT_SHELL);
            command
        }
        None => Command::new(INIT_SHELL),
    };
    command.arg(script);

    Ok(freshutils::status(&mut command).await?)
}

/// Forces an immediate reboot.
pub async fn reboot() -> FreshosResult<()> {
    let mut command = Command::new(REBOOT_COMMAND[0]);
    command.args(&REBOOT_COMMAND[1..]);
    freshutils::run(&mut command)
        .await
        .map_err(|e| FreshosError::helper(e, "unable to reboot"))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
