use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::common::error::error;

pub fn absolute_path(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        return path;
    }
    match std::env::current_dir() {
        Ok(dir) => dir.join(path),
        Err(_) => path,
    }
}

/// Replaces the content of `path` so that readers see either the old or the new file.
pub fn write_atomically(path: &Path, data: &[u8]) -> crate::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(directory)?;
    file.write_all(data)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

/// Exclusive lock of a file, held until the guard is dropped.
///
/// The lock is a `<path>.lock` file created with `O_EXCL`.
pub struct FileLock {
    path: PathBuf,
}

impl FileLock {
    pub fn acquire(target: &Path) -> crate::Result<FileLock> {
        let mut path = target.as_os_str().to_owned();
        path.push(".lock");
        let path = PathBuf::from(path);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                log::debug!("Acquired lock {}", path.display());
                Ok(FileLock { path })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => error(format!(
                "{} is locked by another process (remove {} if no such process is running)",
                target.display(),
                path.display()
            )),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Cannot remove lock {}: {e}", self.path.display());
        }
    }
}
