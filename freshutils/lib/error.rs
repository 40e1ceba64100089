//! `freshutils::error` is a module containing error utilities for the freshos project.

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a freshutils-related operation.
pub type FreshutilsResult<T> = Result<T, FreshutilsError>;

/// An error that occurred in one of the freshutils helpers.
#[derive(pretty_error_debug::Debug, Error)]
pub enum FreshutilsError {
    /// An error that occurred when validating paths
    #[error("path validation error: {0}")]
    PathValidation(String),

    /// A child process could not be started.
    #[error("failed to start {program}: {source}")]
    SpawnFailed {
        /// The program that was being started.
        program: String,

        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A child process exited with a non-zero status.
    #[error("{program} exited with status {status}")]
    ProcessFailed {
        /// The program that failed.
        program: String,

        /// The exit status, or `-1` if the process was killed by a signal.
        status: i32,
    },
}
