use std::{
    fs::Metadata,
    os::unix::fs::{FileTypeExt, MetadataExt},
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Whether an entry is an overlayfs whiteout: a character device with device number 0/0.
pub fn is_whiteout(metadata: &Metadata) -> bool {
    metadata.file_type().is_char_device() && metadata.rdev() == 0
}

/// Creates an overlayfs whiteout at `path`. Needs `CAP_MKNOD`.
#[cfg(test)]
pub(crate) fn make_whiteout(path: impl AsRef<std::path::Path>) -> crate::FreshosResult<()> {
    use nix::sys::stat::{makedev, mknod, Mode, SFlag};

    mknod(
        path.as_ref(),
        SFlag::S_IFCHR,
        Mode::from_bits_truncate(0o600),
        makedev(0, 0),
    )?;
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
