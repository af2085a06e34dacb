//! Small file-system helpers

use crate::error::{OfficeError, OfficeResult};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub fn read_bytes(path: &Path) -> OfficeResult<Vec<u8>> {
    Ok(fs::read(path)?)
}

/// Drain a reader to its end
pub fn read_all<R: Read>(mut reader: R) -> OfficeResult<Vec<u8>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Write `bytes` to `dir/name`, creating `dir` first
pub fn save_file(bytes: &[u8], dir: &Path, name: &str) -> OfficeResult<PathBuf> {
    mkdirs(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "file saved");
    Ok(path)
}

pub fn save_file_at(bytes: &[u8], path: &Path) -> OfficeResult<()> {
    fs::write(path, bytes)?;
    Ok(())
}

pub fn exists(path: &Path) -> bool {
    path.exists()
}

/// Create an empty file unless something is already there
pub fn touch(path: &Path) -> OfficeResult<()> {
    if exists(path) {
        return Ok(());
    }
    fs::File::create(path)?;
    Ok(())
}

pub fn mkdirs(path: &Path) -> OfficeResult<()> {
    if exists(path) {
        return Ok(());
    }
    fs::create_dir_all(path)?;
    Ok(())
}

/// Append to a file, creating it when missing
pub fn append(path: &Path, content: &[u8]) -> OfficeResult<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content)?;
    Ok(())
}

/// Join path segments as text, keeping whichever separator is already there.
///
/// A trailing `/` (or `\`) on the left absorbs one leading copy of the same
/// separator on the right. Otherwise `/` is added unless the right side
/// already starts with a separator.
pub fn join<S: AsRef<str>>(parts: &[S]) -> String {
    let mut iter = parts.iter().map(AsRef::as_ref);
    let mut uri = iter.next().unwrap_or_default().to_string();

    for part in iter {
        if uri.ends_with('/') {
            uri.push_str(part.strip_prefix('/').unwrap_or(part));
        } else if uri.ends_with('\\') {
            uri.push_str(part.strip_prefix('\\').unwrap_or(part));
        } else if part.starts_with('/') || part.starts_with('\\') {
            uri.push_str(part);
        } else {
            uri.push('/');
            uri.push_str(part);
        }
    }

    uri
}

pub fn user_home() -> OfficeResult<PathBuf> {
    dirs::home_dir()
        .ok_or_else(|| OfficeError::Io(std::io::Error::other("home directory not found")))
}
