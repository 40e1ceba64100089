//! Configuration shared by the boot stages and the snapshot tool.
//!
//! There is no configuration file: the kernel command line picks the target, the well-known
//! paths are fixed by [`Layout`], and the first boot stage records what it resolved in
//! [`BootArguments`] for every later stage to read.

mod arguments;
mod defaults;
mod layout;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use arguments::*;
pub use defaults::*;
pub use layout::*;
