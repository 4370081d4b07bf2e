use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

/// Failure to place the storage file or an exported document on disk.
#[derive(Debug, Error)]
pub enum PersistIoError {
    #[error("cannot use {0} as a destination directory")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates the storage or export directory if needed. An existing file at
/// that path is an error.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistIoError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistIoError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistIoError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistIoError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Replaces `{dir}/{filename}` in one rename from a sibling temp file. The
/// storage map file and every `.tex`/`.pdf` export go through it, so another
/// process reading the store sees either the old map or the new one.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Text content: the RON store and LaTeX exports.
    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistIoError> {
        self.write_bytes(filename, content.as_bytes())
    }

    /// Decoded PDF bytes.
    pub fn write_bytes(&self, filename: &str, content: &[u8]) -> Result<PathBuf, PersistIoError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistIoError::Io(e.error))?;
        Ok(target)
    }
}
