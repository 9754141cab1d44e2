//! Dataset input: a CSV file with a header row and a URL column.

use std::io;
use std::path::{Path, PathBuf};

/// Default dataset file name inside a dataset directory.
pub const DEFAULT_DATASET_FILE: &str = "dataset.csv";

/// Default header of the URL column.
pub const DEFAULT_URL_COLUMN: &str = "url";

/// One fetch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlRecord {
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to open dataset {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dataset {} has no `{column}` column (found: {found})", path.display())]
    MissingColumn {
        path: PathBuf,
        column: String,
        found: String,
    },

    #[error("malformed dataset {} near line {line}", path.display())]
    Csv {
        path: PathBuf,
        line: u64,
        #[source]
        source: csv::Error,
    },
}

/// Reads URL records from `reader` in file order.
///
/// The column is located by exact header name before any row is read. Cells
/// are trimmed; rows with an empty URL are dropped.
pub fn read_records<R: io::Read>(
    reader: R,
    column: &str,
    path: &Path,
) -> Result<Vec<UrlRecord>, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let csv_err = |line: u64, source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        line,
        source,
    };

    let headers = rdr.headers().map_err(|e| csv_err(1, e))?.clone();
    let index = headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| DatasetError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
            found: headers.iter().collect::<Vec<_>>().join(", "),
        })?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result.map_err(|e| {
            let line = e.position().map_or(0, |p| p.line());
            csv_err(line, e)
        })?;
        match row.get(index) {
            Some(url) if !url.is_empty() => records.push(UrlRecord {
                url: url.to_string(),
            }),
            _ => {
                let line = row.position().map_or(0, |p| p.line());
                tracing::debug!(line, "skipping dataset row without a url");
            }
        }
    }
    Ok(records)
}

/// Reads URL records from the CSV file at `path`.
pub fn read_dataset(path: &Path, column: &str) -> Result<Vec<UrlRecord>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(io::BufReader::new(file), column, path)?;
    tracing::info!(path = %path.display(), records = records.len(), "dataset loaded");
    Ok(records)
}

/// Reads `file_name` inside the dataset directory `dir`.
pub fn load_dataset(dir: &Path, file_name: &str, column: &str) -> Result<Vec<UrlRecord>, DatasetError> {
    read_dataset(&dir.join(file_name), column)
}
