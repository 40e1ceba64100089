//! The two rule sets applied to captured trees.
//!
//! [`ExclusionRules`] filters the change list while a snapshot is captured. [`CleanupRules`]
//! deletes known-transient artifacts from a staging tree or from the live root.

mod cleanup;
mod exclude;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use cleanup::*;
pub use exclude::*;
