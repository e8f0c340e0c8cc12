//! Load-once holder for the cutoff dataset.
//!
//! The dataset is parsed on first use and shared as an `Arc` until someone
//! calls [`DatasetCache::invalidate`] or [`DatasetCache::reload`]. A failed
//! load leaves the cache empty, so a half-read file is never served.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::{cutoff::dataset::Dataset, error::Result};

/// Where a dataset comes from
pub trait DatasetSource {
    fn load(&self) -> Result<Dataset>;

    fn describe(&self) -> String;
}

/// CSV file on disk
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
}

impl CsvFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for CsvFile {
    fn load(&self) -> Result<Dataset> {
        Dataset::load(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

pub struct DatasetCache<S = CsvFile> {
    source: S,
    slot: Mutex<Option<Arc<Dataset>>>,
}

impl DatasetCache<CsvFile> {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(CsvFile::new(path))
    }
}

impl<S: DatasetSource> DatasetCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached dataset, loading it on first use
    pub fn get(&self) -> Result<Arc<Dataset>> {
        let mut slot = self.lock();
        if let Some(existing) = slot.as_ref() {
            debug!("Dataset cache hit for {}", self.source.describe());
            return Ok(Arc::clone(existing));
        }

        let dataset = Arc::new(self.source.load()?);
        info!(
            "Cached {} cutoff rows from {}",
            dataset.len(),
            self.source.describe()
        );
        *slot = Some(Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the cached dataset; the next `get` reads the source again
    pub fn invalidate(&self) {
        if self.lock().take().is_some() {
            info!("Invalidated dataset cache for {}", self.source.describe());
        }
    }

    pub fn reload(&self) -> Result<Arc<Dataset>> {
        self.invalidate();
        self.get()
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Dataset>>> {
        // The slot only ever holds a fully built Arc, so a poisoned guard is
        // still consistent.
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
