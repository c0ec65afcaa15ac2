// src/io/sink.rs

//! File-backed byte sink for encoded streams.

use crate::utils::error::Result;
use log::debug;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only buffered writer over a freshly created file.
pub struct FileSink {
    inner: BufWriter<File>,
    path: PathBuf,
}

impl FileSink {
    /// Creates (or truncates) the file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        debug!("Opened output sink {}", path.display());
        Ok(Self {
            inner: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ims");
        let mut sink = FileSink::create(&path).unwrap();
        sink.write_all(b"IMS").unwrap();
        sink.flush().unwrap();
        assert_eq!(sink.path(), path.as_path());
        assert_eq!(std::fs::read(&path).unwrap(), b"IMS");
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no_such_dir").join("out.ims");
        assert!(FileSink::create(&path).is_err());
    }
}
