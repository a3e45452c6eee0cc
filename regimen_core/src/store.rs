//! Ledger persistence with file locking.
//!
//! The engine never writes; this is the collaborator that owns the ledger
//! on disk. Unlike disposable preferences, a medication history is never
//! silently replaced: a corrupt file is an error, not a reset.

use crate::{Error, Ledger, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Source and sink for the full ledger
pub trait LedgerStore {
    fn load(&self) -> Result<Ledger>;
    fn save(&self, ledger: &Ledger) -> Result<()>;
}

/// JSON document store with shared/exclusive locking
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/ledger.json`
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join("ledger.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the ledger, modify it, and save it back
    pub fn update<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Ledger) -> Result<T>,
    {
        let mut ledger = self.load()?;
        let value = f(&mut ledger)?;
        self.save(&ledger)?;
        Ok(value)
    }
}

impl LedgerStore for JsonFileStore {
    /// Returns an empty ledger if the file doesn't exist yet
    fn load(&self) -> Result<Ledger> {
        if !self.path.exists() {
            tracing::info!("No ledger file at {:?}, starting empty", self.path);
            return Ok(Ledger::default());
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let ledger: Ledger = serde_json::from_str(&contents).map_err(|e| {
            tracing::error!("Ledger file {:?} is not valid: {}", self.path, e);
            Error::Json(e)
        })?;

        tracing::debug!(
            "Loaded {} medications from {:?}",
            ledger.medications.len(),
            self.path
        );
        Ok(ledger)
    }

    /// Atomically writes via temp file, fsync, and rename
    fn save(&self, ledger: &Ledger) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(ledger)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!(
            "Saved {} medications to {:?}",
            ledger.medications.len(),
            self.path
        );
        Ok(())
    }
}
