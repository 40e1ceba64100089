//! `freshutils::process` wraps the handful of ways freshos talks to helper programs.
//!
//! Every helper is a black box: only its exit status and, for some of them, its stdout
//! matter. These functions turn both into typed results.

use std::process::{ExitStatus, Stdio};

use tokio::process::Command;

use crate::{FreshutilsError, FreshutilsResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the program name of a command, for error messages.
pub fn program_name(command: &Command) -> String {
    command.as_std().get_program().to_string_lossy().into_owned()
}

/// Converts an exit status into a plain code. Signals map to `-1`.
pub fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

/// Runs a command to completion and returns its exit code without judging it.
pub async fn status(command: &mut Command) -> FreshutilsResult<i32> {
    let program = program_name(command);
    let status = command
        .status()
        .await
        .map_err(|source| FreshutilsError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

    tracing::debug!("{} exited with {}", program, status);
    Ok(exit_code(status))
}

/// Runs a command to completion and fails unless it exits with status zero.
pub async fn run(command: &mut Command) -> FreshutilsResult<()> {
    let program = program_name(command);
    match status(command).await? {
        0 => Ok(()),
        status => Err(FreshutilsError::ProcessFailed { program, status }),
    }
}

/// Runs a command, captures its stdout and fails unless it exits with status zero.
///
/// stderr is discarded; the helpers used here print diagnostics nobody reads at boot.
pub async fn output(command: &mut Command) -> FreshutilsResult<String> {
    let program = program_name(command);
    let output = command
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .map_err(|source| FreshutilsError::SpawnFailed {
            program: program.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(FreshutilsError::ProcessFailed {
            program,
            status: exit_code(output.status),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
