//! File system helpers.

use crate::Result;
use std::path::Path;
use tempfile::NamedTempFile;

/// The most elements reserved up front for a length read from a file.
pub(crate) const MAX_PREALLOCATION: usize = 1 << 20;

/// Caps a length read from a file header before it is used as a capacity.
///
/// The real size shows up when the data is read, and a corrupt length fails there instead of
/// aborting on allocation.
pub(crate) fn capacity_hint(len: u64) -> usize {
    usize::try_from(len)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATION)
}

/// Creates a temporary file in the same directory as `path`, so that persisting it is a rename.
///
/// The file is removed when dropped unless it is persisted.
pub(crate) fn temporary_file(path: &Path, extension: &str) -> Result<NamedTempFile> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let temporary = tempfile::Builder::new()
        .prefix(".las2hdf-")
        .suffix(&format!(".{extension}.tmp"))
        .tempfile_in(directory)?;
    Ok(temporary)
}

/// Moves a finished temporary file over `path`.
pub(crate) fn persist(temporary: NamedTempFile, path: &Path) -> Result<()> {
    let _ = temporary.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Returns true if the path's extension matches, ignoring case.
pub(crate) fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension))
}
