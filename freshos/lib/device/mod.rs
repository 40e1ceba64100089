//! Block device discovery and resolution of the requested data device.

mod probe;
mod resolve;
mod target;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use probe::*;
pub use resolve::*;
pub use target::*;
