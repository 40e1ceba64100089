use nix::unistd::geteuid;

use crate::{FreshosError, FreshosResult};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Fails with [`FreshosError::PermissionDenied`] unless the effective user is root.
pub fn ensure_root() -> FreshosResult<()> {
    if geteuid().is_root() {
        Ok(())
    } else {
        Err(FreshosError::PermissionDenied)
    }
}
