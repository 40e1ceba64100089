use std::path::PathBuf;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};

use crate::config::{DEFAULT_EXPORT_OUTPUT, DEFAULT_MEMORY_DIR, DEFAULT_PACK_OUTPUT, PROC_CMDLINE_PATH};

use super::styles;

//-------------------------------------------------------------------------------------------------
// Types
//-------------------------------------------------------------------------------------------------

/// savechanges - Capture, list, roll back and pack the changes made to a freshos system.
///
/// Without a subcommand, the changes of the writable layer are saved as a new snapshot.
#[derive(Debug, Parser)]
#[command(name = "savechanges", author, about, version, styles=styles::styles())]
pub struct SavechangesArgs {
    /// The subcommand to run
    #[command(subcommand)]
    pub subcommand: Option<SavechangesSubcommand>,

    /// Do not perform cleanup (saving only)
    #[arg(long)]
    pub no_cleanup: bool,

    /// Automatic yes to prompts
    #[arg(short, long, global = true)]
    pub yes: bool,
}

/// Operations besides saving
#[derive(Debug, Subcommand)]
pub enum SavechangesSubcommand {
    /// List all snapshots
    #[command(name = "list", short_flag = 'l', long_flag = "list")]
    List,

    /// Delete the most recent snapshot
    #[command(name = "rollback", short_flag = 'r', long_flag = "rollback")]
    Rollback,

    /// Pack the whole system into a new base image
    #[command(name = "pack", short_flag = 'p', long_flag = "pack")]
    Pack {
        /// Where to write the image
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_PACK_OUTPUT)]
        output: PathBuf,
    },

    /// Export the files needed to build a new boot environment
    #[command(name = "export", short_flag = 'e', long_flag = "export")]
    Export {
        /// Directory to create
        #[arg(short, long, value_name = "DIR", default_value = DEFAULT_EXPORT_OUTPUT)]
        output: PathBuf,
    },
}

/// freshos-boot - Find the data device and start the system it holds
#[derive(Debug, Parser)]
#[command(name = "freshos-boot", author, about, version, styles=styles::styles())]
pub struct BootArgs {
    /// Dynamic loader used to run the init script
    #[arg(value_name = "LD_INTERPRETER")]
    pub ld_linux: Option<String>,

    /// Kernel command line to read the target from
    #[arg(long, value_name = "PATH", default_value = PROC_CMDLINE_PATH)]
    pub cmdline: PathBuf,

    /// Root of the boot environment state
    #[arg(long, value_name = "DIR", default_value = DEFAULT_MEMORY_DIR)]
    pub memory: PathBuf,
}

/// freshos-mount - Mount the bundle chain of the home directory found at boot
#[derive(Debug, Parser)]
#[command(name = "freshos-mount", author, about, version, styles=styles::styles())]
pub struct MountArgs {
    /// Options to remount the data device with
    #[arg(long, value_name = "OPTIONS")]
    pub data_options: Option<String>,

    /// Root of the boot environment state
    #[arg(long, value_name = "DIR", default_value = DEFAULT_MEMORY_DIR)]
    pub memory: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl SavechangesArgs {
    /// Rejects `--no-cleanup` given in front of a subcommand.
    pub fn validate(self) -> Result<Self, clap::Error> {
        if self.no_cleanup && self.subcommand.is_some() {
            return Err(Self::command().error(
                ErrorKind::ArgumentConflict,
                "--no-cleanup only applies when saving changes",
            ));
        }

        Ok(self)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
