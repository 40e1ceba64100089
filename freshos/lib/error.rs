use std::{
    error::Error,
    fmt::{self, Display},
    path::PathBuf,
};

use freshutils::FreshutilsError;
use nix::errno::Errno;
use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a freshos-related operation.
pub type FreshosResult<T> = Result<T, FreshosError>;

/// An error that occurred while booting or while managing snapshots.
#[derive(pretty_error_debug::Debug, Error)]
pub enum FreshosError {
    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// An error that can represent any error.
    #[error(transparent)]
    Custom(#[from] AnyError),

    /// An error raised by one of the freshutils helpers.
    #[error(transparent)]
    Utils(#[from] FreshutilsError),

    /// The boot argument file could not be encoded or decoded.
    #[error("boot arguments error: {0}")]
    Json(#[from] serde_json::Error),

    /// A cleanup rule is not a valid glob pattern.
    #[error("invalid cleanup pattern: {0}")]
    CleanupPattern(#[from] glob::PatternError),

    /// A raw system call failed.
    #[error("system call failed: {0}")]
    Sys(#[from] Errno),

    /// No eligible device holds the requested target.
    #[error("data partition not found: {0}")]
    DataDeviceNotFound(String),

    /// A mount operation failed.
    #[error("failed to mount {source_path} on {target}: {reason}")]
    MountFailed {
        /// What was being mounted.
        source_path: String,

        /// Where it was being mounted.
        target: PathBuf,

        /// Why it failed.
        reason: String,
    },

    /// An unmount operation failed.
    #[error("failed to unmount {target}: {reason}")]
    UnmountFailed {
        /// The mountpoint.
        target: PathBuf,

        /// Why it failed.
        reason: String,
    },

    /// The union mount could not be assembled.
    #[error("union file system mount failed: {0}")]
    UnionMountFailed(String),

    /// The boot arguments do not name a home directory.
    #[error("no home directory recorded in {0}")]
    HomeNotConfigured(PathBuf),

    /// There is no snapshot to operate on.
    #[error("no snapshot found in {0}")]
    SnapshotNotFound(PathBuf),

    /// The next snapshot index would leave the supported range.
    #[error(".sb file index \"{0}\" out of range (1-28), no changes made.")]
    SnapshotIndexOutOfRange(u32),

    /// A file required by an operation is missing.
    #[error("file \"{0}\" not found")]
    FileNotFound(PathBuf),

    /// The output path of an operation already exists.
    #[error("file \"{0}\" exists")]
    FileExists(PathBuf),

    /// A path that must be a directory is something else.
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),

    /// The command must run with elevated privileges.
    #[error("Please use sudo or run the script as root.")]
    PermissionDenied,

    /// A helper program exited with a non-zero status.
    #[error("{program} failed with status {status}: {context}")]
    HelperFailed {
        /// The program that failed.
        program: String,

        /// Its exit status.
        status: i32,

        /// What the program was doing.
        context: String,
    },
}

/// An error that can represent any error.
#[derive(Debug)]
pub struct AnyError {
    error: anyhow::Error,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl FreshosError {
    /// Wraps a failure that has no dedicated variant.
    pub fn custom(error: impl Into<anyhow::Error>) -> FreshosError {
        FreshosError::Custom(AnyError {
            error: error.into(),
        })
    }

    /// Wraps a failed helper invocation with what it was supposed to do.
    pub fn helper(error: FreshutilsError, context: impl Into<String>) -> FreshosError {
        match error {
            FreshutilsError::ProcessFailed { program, status } => FreshosError::HelperFailed {
                program,
                status,
                context: context.into(),
            },
            other => FreshosError::Utils(other),
        }
    }

    /// Returns the OS error code used as the exit status of the command line tools.
    pub fn errno(&self) -> i32 {
        let errno = match self {
            FreshosError::Io(e) => return e.raw_os_error().unwrap_or(Errno::EIO as i32),
            FreshosError::Sys(errno) => *errno,
            FreshosError::Utils(FreshutilsError::PathValidation(_)) => Errno::EINVAL,
            FreshosError::Utils(FreshutilsError::SpawnFailed { source, .. }) => {
                return source.raw_os_error().unwrap_or(Errno::EIO as i32)
            }
            FreshosError::Utils(_) => Errno::EIO,
            FreshosError::Custom(_) => Errno::EIO,
            FreshosError::Json(_) => Errno::EINVAL,
            FreshosError::CleanupPattern(_) => Errno::EINVAL,
            FreshosError::DataDeviceNotFound(_) => Errno::ENOENT,
            FreshosError::MountFailed { .. } => Errno::EIO,
            FreshosError::UnmountFailed { .. } => Errno::EIO,
            FreshosError::UnionMountFailed(_) => Errno::EIO,
            FreshosError::HomeNotConfigured(_) => Errno::ENOENT,
            FreshosError::SnapshotNotFound(_) => Errno::ENOENT,
            FreshosError::SnapshotIndexOutOfRange(_) => Errno::EINVAL,
            FreshosError::FileNotFound(_) => Errno::ENOENT,
            FreshosError::FileExists(_) => Errno::EEXIST,
            FreshosError::NotADirectory(_) => Errno::ENOTDIR,
            FreshosError::PermissionDenied => Errno::EACCES,
            FreshosError::HelperFailed { .. } => Errno::EIO,
        };

        errno as i32
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Display for AnyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl Error for AnyError {}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
