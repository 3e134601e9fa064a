//! File-backed resources.
//!
//! Opening is the acquisition step; releasing flushes (writers) and drops
//! the handle. Both types tolerate a second release.

use crate::Release;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use warden_core::error::{WardenError, WardenResult};
use warden_core::Cause;

/// Buffered line reader over a file.
pub struct FileReader {
    path: PathBuf,
    reader: Option<BufReader<File>>,
}

impl FileReader {
    pub fn open(path: impl AsRef<Path>) -> WardenResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        tracing::debug!(path = %path.display(), "opened for reading");
        Ok(Self {
            path,
            reader: Some(BufReader::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next line without its terminator, or `None` at end of file.
    pub fn read_line(&mut self) -> WardenResult<Option<String>> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| WardenError::AlreadyReleased(self.path.display().to_string()))?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

impl Release for FileReader {
    fn release(&mut self) -> Result<(), Cause> {
        if self.reader.take().is_some() {
            tracing::debug!(path = %self.path.display(), "closed reader");
        }
        Ok(())
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("FileReader({})", self.path.display()))
    }
}

/// Buffered writer over a file. Created (or truncated) on open.
pub struct FileWriter {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl FileWriter {
    pub fn create(path: impl AsRef<Path>) -> WardenResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        tracing::debug!(path = %path.display(), "opened for writing");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&mut self, line: &str) -> WardenResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| WardenError::AlreadyReleased(self.path.display().to_string()))?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl Release for FileWriter {
    /// Flushes buffered bytes and syncs to disk. Write errors that were
    /// deferred by buffering surface here as release failures.
    fn release(&mut self) -> Result<(), Cause> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };
        writer.flush().map_err(WardenError::from)?;
        writer.get_ref().sync_all().map_err(WardenError::from)?;
        tracing::debug!(path = %self.path.display(), "closed writer");
        Ok(())
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Owned(format!("FileWriter({})", self.path.display()))
    }
}
