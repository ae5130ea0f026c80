use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::loader::load_file;
use super::model::TransactionDataset;

// ---------------------------------------------------------------------------
// DatasetStore – load once, re-read only on request
// ---------------------------------------------------------------------------

/// Holds the immutable source table for the lifetime of the process.
///
/// The file is read once in [`DatasetStore::open`]. Every caller shares the
/// same `Arc`; nothing re-reads the file except an explicit
/// [`DatasetStore::reload`].
#[derive(Debug)]
pub struct DatasetStore {
    source: PathBuf,
    dataset: Arc<TransactionDataset>,
}

impl DatasetStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let source = path.as_ref().to_path_buf();
        let dataset = load_file(&source)
            .with_context(|| format!("loading {}", source.display()))?;
        log::info!(
            "Loaded {} transactions from {}",
            dataset.len(),
            source.display()
        );
        Ok(Self {
            source,
            dataset: Arc::new(dataset),
        })
    }

    /// Shared handle to the current table.
    pub fn dataset(&self) -> Arc<TransactionDataset> {
        Arc::clone(&self.dataset)
    }

    /// Path the table was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Re-read the source file. On failure the previous table stays loaded
    /// and the error is returned. Handles obtained before a successful
    /// reload keep pointing at the old table.
    pub fn reload(&mut self) -> Result<()> {
        match load_file(&self.source) {
            Ok(dataset) => {
                log::info!(
                    "Reloaded {} transactions from {}",
                    dataset.len(),
                    self.source.display()
                );
                self.dataset = Arc::new(dataset);
                Ok(())
            }
            Err(e) => {
                log::error!("Reload of {} failed: {e:#}", self.source.display());
                Err(e.context(format!("reloading {}", self.source.display())))
            }
        }
    }
}
