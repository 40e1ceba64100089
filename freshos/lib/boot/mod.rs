//! The two boot stages and the initialization of a fresh home directory.
//!
//! The first stage ([`FirstStage`]) runs from the minimal boot environment, finds the data
//! device and either hands over to an init script or prepares the home directory it found.
//! The second stage ([`second_stage`]) is what the generated init script runs on every later
//! boot.

mod initialize;
mod passwd;
mod stage;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use initialize::*;
pub use passwd::*;
pub use stage::*;
