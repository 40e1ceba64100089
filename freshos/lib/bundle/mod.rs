//! Bundle enumeration and the union mount built from it.

mod chain;
mod mount;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use chain::*;
pub use mount::*;
