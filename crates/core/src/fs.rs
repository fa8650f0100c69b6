//! Local file writing.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// How [`write_file`] treats an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Create or truncate
    #[default]
    Overwrite,
    /// Create or append
    Append,
}

/// Writes `content` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`Error::Io`] as soon as any step fails.
pub fn write_file(path: &Path, content: impl AsRef<[u8]>, mode: WriteMode) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    match mode {
        WriteMode::Overwrite => options.write(true).truncate(true),
        WriteMode::Append => options.append(true),
    };

    let content = content.as_ref();
    let mut file = options.open(path).map_err(|e| Error::io("open", path, e))?;
    file.write_all(content)
        .and_then(|()| file.flush())
        .map_err(|e| Error::io("write", path, e))?;

    debug!(path = %path.display(), bytes = content.len(), ?mode, "Wrote file");
    Ok(())
}

/// Copies `from` to `to`, creating missing parent directories of `to`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the copy fails.
pub fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| Error::io("create directory", parent, e))?;
    }
    fs::copy(from, to).map_err(|e| Error::io("copy", from, e))?;
    Ok(())
}

/// Removes a directory tree if it exists.
///
/// # Errors
///
/// Returns [`Error::Io`] when the directory exists but cannot be removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io("remove directory", path, e)),
    }
}
