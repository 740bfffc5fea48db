use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replaces the contents of `path` with `contents` by writing a temporary file
/// next to it and renaming it over the original. A crash midway leaves either
/// the old file or the new one, never a mix. The original's permissions are
/// carried over.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    if let Ok(metadata) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
