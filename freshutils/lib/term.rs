//! Module containing terminal utilities

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Determines if stdout is a terminal that understands ANSI escape sequences.
///
/// The boot console has no `TERM` most of the time, so a missing `TERM` counts as capable;
/// only an explicit `TERM=dumb` turns styling off.
pub fn is_ansi_terminal() -> bool {
    let stdout_is_tty = unsafe { libc::isatty(libc::STDOUT_FILENO) == 1 };
    if !stdout_is_tty {
        return false;
    }

    match std::env::var("TERM") {
        Ok(term) if term == "dumb" => {
            tracing::debug!("TERM=dumb, disabling ansi styling");
            false
        }
        _ => true,
    }
}
