use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::errors::{ScanError, ScanResult};
use crate::terms::TermSet;

/// Persistent home of the user's term set.
///
/// The store is authoritative: callers never buffer writes, and concurrent
/// saves resolve as last write wins.
pub trait TermStore {
    /// Reads the current term set
    fn load(&self) -> ScanResult<TermSet>;

    /// Replaces the stored term set and notifies subscribers
    fn save(&self, terms: &TermSet) -> ScanResult<()>;

    /// Stream of term sets: the current set right away, then one per save
    fn subscribe(&self) -> ScanResult<Receiver<TermSet>>;
}

/// Fan-out of saved term sets to live subscribers
#[derive(Debug, Default)]
struct Subscribers {
    senders: Mutex<Vec<Sender<TermSet>>>,
}

impl Subscribers {
    fn add(&self, current: TermSet) -> Receiver<TermSet> {
        let (tx, rx) = mpsc::channel();
        // The receiver is alive here, so this send cannot fail.
        let _ = tx.send(current);
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn publish(&self, terms: &TermSet) {
        let mut senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| tx.send(terms.clone()).is_ok());
        debug!("Published term set to {} subscribers", senders.len());
    }
}

/// Term store backed by a JSON array on disk
#[derive(Debug)]
pub struct JsonTermStore {
    path: PathBuf,
    subscribers: Subscribers,
}

impl JsonTermStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscribers: Subscribers::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TermStore for JsonTermStore {
    fn load(&self) -> ScanResult<TermSet> {
        if !self.path.exists() {
            debug!("No terms file at {}, starting empty", self.path.display());
            return Ok(TermSet::new());
        }

        let data = std::fs::read_to_string(&self.path)?;
        let terms: TermSet = serde_json::from_str(&data).map_err(|e| {
            ScanError::store_error(format!("{}: {}", self.path.display(), e))
        })?;
        debug!("Loaded {} terms from {}", terms.len(), self.path.display());
        Ok(terms)
    }

    fn save(&self, terms: &TermSet) -> ScanResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        // Write next to the target, then atomically swap it in
        let mut tmp = NamedTempFile::new_in(&dir)?;
        serde_json::to_writer_pretty(&mut tmp, terms)?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .map_err(|e| ScanError::store_error(format!("{}: {}", self.path.display(), e)))?;

        info!("Saved {} terms to {}", terms.len(), self.path.display());
        self.subscribers.publish(terms);
        Ok(())
    }

    fn subscribe(&self) -> ScanResult<Receiver<TermSet>> {
        Ok(self.subscribers.add(self.load()?))
    }
}

/// Term store kept in memory, for tests and throwaway sessions
#[derive(Debug, Default)]
pub struct MemoryTermStore {
    terms: Mutex<TermSet>,
    subscribers: Subscribers,
}

impl MemoryTermStore {
    pub fn new(terms: TermSet) -> Self {
        Self {
            terms: Mutex::new(terms),
            subscribers: Subscribers::default(),
        }
    }
}

impl TermStore for MemoryTermStore {
    fn load(&self) -> ScanResult<TermSet> {
        Ok(self
            .terms
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, terms: &TermSet) -> ScanResult<()> {
        *self.terms.lock().unwrap_or_else(PoisonError::into_inner) = terms.clone();
        self.subscribers.publish(terms);
        Ok(())
    }

    fn subscribe(&self) -> ScanResult<Receiver<TermSet>> {
        Ok(self.subscribers.add(self.load()?))
    }
}
