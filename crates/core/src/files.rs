//! Owner-only file writes for secrets and profiles

use std::fs;
use std::io;
use std::path::Path;

/// Write `contents` to `path`, readable and writable by the owner only.
/// Existing files are truncated and have their mode reset.
#[cfg(unix)]
pub(crate) fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    // mode() only applies on creation
    file.set_permissions(fs::Permissions::from_mode(0o600))?;
    file.write_all(contents.as_bytes())
}

#[cfg(not(unix))]
pub(crate) fn write_private(path: &Path, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}
