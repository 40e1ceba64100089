//! The snapshot lifecycle behind the `savechanges` tool.
//!
//! A snapshot is the writable layer of the union root, filtered by the exclusion rules, purged
//! by the cleanup rules and compressed into the next numbered bundle of the home directory.
//! [`rollback`] deletes the latest one, [`pack`] folds the whole running system into a new base
//! image and [`export`] copies the boot environment toolset out for rebuilding an image.

mod export;
mod pack;
mod rollback;
mod save;
mod squashfs;
mod store;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use export::*;
pub use pack::*;
pub use rollback::*;
pub use save::*;
pub use squashfs::*;
pub use store::*;
