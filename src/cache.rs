use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PathwayError, Result};

/// Storage for the raw pathway document. Presence alone decides whether the
/// document is fetched again; contents are never checked for freshness.
pub trait DocumentCache {
    fn exists(&self) -> bool;
    fn read(&self) -> Result<String>;
    fn write(&self, contents: &str) -> Result<()>;
}

/// A single file on disk holding the document verbatim.
#[derive(Clone, Debug)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> PathwayError {
        PathwayError::Cache {
            path: self.path.clone(),
            source,
        }
    }
}

impl DocumentCache for FileCache {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path).map_err(|err| self.io_error(err))
    }

    fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        fs::write(&self.path, contents).map_err(|err| self.io_error(err))
    }
}

/// In-process cache, used where no filesystem should be touched.
#[derive(Debug, Default)]
pub struct MemoryCache {
    contents: RefCell<Option<String>>,
    writes: RefCell<usize>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: RefCell::new(Some(contents.into())),
            writes: RefCell::new(0),
        }
    }

    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }
}

impl DocumentCache for MemoryCache {
    fn exists(&self) -> bool {
        self.contents.borrow().is_some()
    }

    fn read(&self) -> Result<String> {
        self.contents.borrow().clone().ok_or_else(|| PathwayError::Cache {
            path: PathBuf::from("<memory>"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "cache is empty"),
        })
    }

    fn write(&self, contents: &str) -> Result<()> {
        *self.contents.borrow_mut() = Some(contents.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cache_round_trips_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("nested").join("hsa05010.xml"));
        assert!(!cache.exists());
        cache.write("<pathway/>\n").unwrap();
        assert!(cache.exists());
        assert_eq!(cache.read().unwrap(), "<pathway/>\n");
    }

    #[test]
    fn file_cache_read_of_missing_file_is_cache_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("missing.xml"));
        assert!(matches!(cache.read(), Err(PathwayError::Cache { .. })));
    }

    #[test]
    fn memory_cache_counts_writes() {
        let cache = MemoryCache::new();
        assert!(!cache.exists());
        assert!(cache.read().is_err());
        cache.write("doc").unwrap();
        assert!(cache.exists());
        assert_eq!(cache.read().unwrap(), "doc");
        assert_eq!(cache.write_count(), 1);
    }
}
