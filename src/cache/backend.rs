//! Storage Backend Module
//!
//! Raw string key-value storage under the cache store. Backends know nothing
//! about entries, TTLs or serialization.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{CacheError, Result};

// == Storage Backend ==
/// A string key-value store the cache can persist into.
pub trait StorageBackend: Send + Sync + fmt::Debug {
    /// Reads a raw value, `Ok(None)` when absent.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Writes or replaces a raw value.
    ///
    /// Fails with `CacheError::StoreQuota` when the value does not fit.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;

    /// Removes a value, returning whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool>;

    /// Lists every stored key.
    fn keys(&self) -> Result<Vec<String>>;
}

// == Memory Backend ==
/// In-process backend with an optional byte quota, counting key and value
/// lengths the way browser storage does.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
    used_bytes: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: Option<usize>) -> Self {
        Self {
            quota_bytes,
            ..Self::default()
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let previous = self
            .entries
            .get(key)
            .map(|old| key.len() + old.len())
            .unwrap_or(0);
        let needed = self.used_bytes - previous + key.len() + value.len();

        if let Some(quota) = self.quota_bytes {
            if needed > quota {
                return Err(CacheError::StoreQuota(format!(
                    "{} bytes needed, quota is {}",
                    needed, quota
                )));
            }
        }

        self.entries.insert(key.to_string(), value.to_string());
        self.used_bytes = needed;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        match self.entries.remove(key) {
            Some(old) => {
                self.used_bytes -= key.len() + old.len();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.keys().cloned().collect())
    }
}

// == File Backend ==
/// Persistent backend storing each key as `<dir>/<key>.json`.
///
/// Writes go through a [`NamedTempFile`] in the same directory, so readers
/// never see a half-written entry.
#[derive(Debug)]
pub struct FileBackend {
    dir: PathBuf,
}

const FILE_EXTENSION: &str = "json";

impl FileBackend {
    /// Opens (and creates if needed) a backend directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| storage_error(&dir, e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let safe = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !safe {
            return Err(CacheError::Storage(format!(
                "key '{}' is not a valid file name",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.{}", key, FILE_EXTENSION)))
    }
}

impl StorageBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            // Non-UTF-8 contents are a corrupt entry, not a missing one
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                Err(CacheError::StoreCorruption(format!("{}: {}", path.display(), e)))
            }
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        // Temp file lives in the same directory so persist is an atomic rename
        let mut tmp =
            NamedTempFile::new_in(&self.dir).map_err(|e| storage_error(&self.dir, e))?;
        tmp.write_all(value.as_bytes())
            .map_err(|e| storage_error(tmp.path(), e))?;
        tmp.persist(&path).map_err(|e| storage_error(&path, e.error))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(storage_error(&path, e)),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        let dir = fs::read_dir(&self.dir).map_err(|e| storage_error(&self.dir, e))?;

        let keys = dir
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(FILE_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();

        Ok(keys)
    }
}

fn storage_error(path: &Path, e: io::Error) -> CacheError {
    CacheError::Storage(format!("{}: {}", path.display(), e))
}
