//! On-disk dataset snapshots.
//!
//! One CSV file per dataset key under the cache directory. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so readers never observe a partially written snapshot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{Number, Value};
use tempfile::NamedTempFile;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use super::registry::DatasetKey;
use super::table::{Table, cell_text};

/// Errors raised by cache reads and writes.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cache CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to replace cache file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// File-backed store of the last good snapshot per dataset.
#[derive(Debug, Clone)]
pub struct DatasetCache {
    dir: PathBuf,
    expiry: Option<Duration>,
}

impl DatasetCache {
    /// Creates a cache rooted at `dir`. Entries older than `expiry` are
    /// treated as absent; `None` keeps entries forever.
    pub fn new(dir: impl Into<PathBuf>, expiry: Option<Duration>) -> Self {
        Self {
            dir: dir.into(),
            expiry,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: DatasetKey) -> PathBuf {
        self.dir.join(format!("{key}.csv"))
    }

    /// Loads the snapshot for `key`.
    ///
    /// Returns `Ok(None)` when there is no entry or the entry has expired.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the file exists but cannot be read or parsed.
    pub fn load(&self, key: DatasetKey) -> Result<Option<Table>, CacheError> {
        let path = self.path_for(key);

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        if self.is_expired(&metadata) {
            debug!(dataset = %key, path = %path.display(), "cache entry expired");
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)?;

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(record?.iter().map(parse_cell).collect());
        }

        Ok(Some(Table::new(columns, rows)))
    }

    /// Writes `table` as the snapshot for `key`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the directory cannot be created or the file
    /// cannot be written or renamed into place.
    pub fn store(&self, key: DatasetKey, table: &Table) -> Result<PathBuf, CacheError> {
        fs::create_dir_all(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;

        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            if !table.columns().is_empty() {
                writer.write_record(table.columns())?;
                for row in table.rows() {
                    writer.write_record(row.iter().map(cell_text))?;
                }
            }
            writer.flush().map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        }

        tmp.persist(&path)?;
        debug!(dataset = %key, rows = table.len(), path = %path.display(), "cache entry written");
        Ok(path)
    }

    /// Removes the entry for `key`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Io` for failures other than the file being absent.
    pub fn invalidate(&self, key: DatasetKey) -> Result<bool, CacheError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// When the entry for `key` was last written, if it exists.
    pub fn cached_at(&self, key: DatasetKey) -> Option<OffsetDateTime> {
        fs::metadata(self.path_for(key))
            .and_then(|m| m.modified())
            .ok()
            .map(OffsetDateTime::from)
    }

    fn is_expired(&self, metadata: &fs::Metadata) -> bool {
        let Some(expiry) = self.expiry else {
            return false;
        };
        metadata
            .modified()
            .ok()
            .and_then(|modified| modified.elapsed().ok())
            .is_some_and(|age| age > expiry)
    }
}

/// Types a CSV cell: empty is null, then integer, then float, else text.
///
/// A number is only used when it renders back to the same text, so codes
/// such as `0123` or `1e3` stay strings.
fn parse_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = raw.parse::<i64>()
        && n.to_string() == raw
    {
        return Value::from(n);
    }
    if let Some(n) = raw.parse::<f64>().ok().and_then(Number::from_f64)
        && n.to_string() == raw
    {
        return Value::Number(n);
    }
    Value::String(raw.to_string())
}
