//! Sequential writer for a page's temp file.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Writer for a `.part` temp file. Bytes only become visible under the final
/// name once `finalize` renames the temp file.
pub struct PageWriter {
    file: File,
    temp_path: PathBuf,
    written: u64,
}

impl PageWriter {
    /// Create a new temp file at `temp_path` (e.g. `Abbasiya.html.part`).
    /// Overwrites a stale temp file left by an interrupted run.
    pub fn create(temp_path: &Path) -> Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)
            .with_context(|| format!("failed to create temp file: {}", temp_path.display()))?;
        Ok(PageWriter {
            file,
            temp_path: temp_path.to_path_buf(),
            written: 0,
        })
    }

    pub fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.file
            .write_all(data)
            .with_context(|| format!("write to {} failed", self.temp_path.display()))?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Sync file data to disk. Call before `finalize` for durability.
    pub fn sync(&self) -> Result<()> {
        self.file.sync_all().context("storage sync failed")?;
        Ok(())
    }

    /// Path to the current temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Rename the temp file onto `final_path`, closing it first. Returns the
    /// number of bytes written.
    pub fn finalize(self, final_path: &Path) -> Result<u64> {
        let PageWriter {
            file,
            temp_path,
            written,
        } = self;
        drop(file);

        std::fs::rename(&temp_path, final_path).with_context(|| {
            format!(
                "failed to rename {} to {}",
                temp_path.display(),
                final_path.display()
            )
        })?;
        Ok(written)
    }
}
