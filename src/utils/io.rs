use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Buffered writer that only appears at `target` once committed.
///
/// Data goes to a temp file in the target's directory; `commit` renames it
/// into place. Dropping without committing removes the temp file, so an
/// aborted run never leaves a file that looks complete.
pub struct AtomicFile {
    target: PathBuf,
    writer: BufWriter<NamedTempFile>,
}

impl AtomicFile {
    pub fn create(target: &Path, buffer_size: usize) -> io::Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;
        let temp = NamedTempFile::new_in(&dir)?;

        Ok(Self {
            target: target.to_path_buf(),
            writer: BufWriter::with_capacity(buffer_size, temp),
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Flushes, syncs and renames into place. Returns the final size in bytes.
    pub fn commit(self) -> io::Result<u64> {
        let temp = self.writer.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        temp.persist(&self.target).map_err(|e| e.error)?;
        Ok(fs::metadata(&self.target)?.len())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Removes a file if present, ignoring "not found".
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_commit_moves_into_place() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.tab");

        let mut file = AtomicFile::create(&target, 1024).unwrap();
        writeln!(file, "# a\tb").unwrap();
        assert!(!target.exists());

        let size = file.commit().unwrap();
        assert_eq!(size, 6);
        assert_eq!(fs::read_to_string(&target).unwrap(), "# a\tb\n");
    }

    #[test]
    fn test_drop_without_commit_leaves_nothing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.tab");

        {
            let mut file = AtomicFile::create(&target, 1024).unwrap();
            writeln!(file, "partial").unwrap();
        }

        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_remove_if_exists() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone");
        assert!(remove_if_exists(&path).is_ok());
        fs::write(&path, "x").unwrap();
        remove_if_exists(&path).unwrap();
        assert!(!path.exists());
    }
}
