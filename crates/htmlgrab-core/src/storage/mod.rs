//! Disk I/O for fetched pages.
//!
//! Pages are written to a `.part` sibling, synced, and renamed onto the
//! final path, so an interrupted run never leaves a truncated file under a
//! name the skip-if-exists check would accept.

mod writer;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub use writer::PageWriter;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `a.html` → `a.html.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes `html` verbatim to `final_path`, creating parent directories as
/// needed. Returns the number of bytes written.
pub fn write_page(final_path: &Path, html: &str) -> Result<u64> {
    if let Some(parent) = final_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut writer = PageWriter::create(&temp_path(final_path))?;
    writer.write_all(html.as_bytes())?;
    writer.sync()?;
    writer.finalize(final_path)
}
