//! Thin, typed wrappers around the kernel-facing primitives freshos needs.
//!
//! - [`Mounter`] / [`SystemMounter`] - mount and unmount
//! - [`is_whiteout`] - overlayfs whiteout detection
//! - [`ensure_root`] - the privilege check of the mutating snapshot commands
//!
//! Process spawning lives in [`freshutils::process`].

mod mount;
mod node;
mod privilege;

#[cfg(test)]
pub(crate) mod fake;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use mount::*;
pub use node::*;
pub use privilege::*;
