//! The `key[=value]` token parser.
//!
//! The kernel command line and the per-device output of `blkid` share one grammar; this
//! module parses both.

mod cmdline;
mod tokens;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use cmdline::*;
pub use tokens::*;
