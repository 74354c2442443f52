//! Atomic file replacement.

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write `contents` to `path` so that readers observe either the old file or
/// the complete new one.
///
/// The data goes to a temporary file in the destination directory which is
/// then renamed over the target.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  std::fs::create_dir_all(dir)?;

  let mut tmp = NamedTempFile::new_in(dir)?;
  tmp.write_all(contents)?;
  tmp.flush()?;
  tmp.as_file().sync_all()?;
  tmp.persist(path).map_err(|e| e.error)?;
  Ok(())
}
