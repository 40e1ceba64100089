//! Command-line arguments, terminal styles and confirmation prompts of the freshos tools.

mod args;
mod prompt;
mod styles;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use args::*;
pub use prompt::*;
pub use styles::*;
