use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Tracks matcher-cache and scanning counters
#[derive(Debug, Clone)]
pub struct ScanMetrics {
    // Matcher cache metrics
    cache_entries: Arc<AtomicU64>,
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,
    sequential_fallbacks: Arc<AtomicU64>,

    // Scan metrics
    documents_scanned: Arc<AtomicU64>,
    bytes_scanned: Arc<AtomicU64>,
    matches_found: Arc<AtomicU64>,
}

impl ScanMetrics {
    /// Creates a new ScanMetrics instance
    pub fn new() -> Self {
        Self {
            cache_entries: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
            sequential_fallbacks: Arc::new(AtomicU64::new(0)),
            documents_scanned: Arc::new(AtomicU64::new(0)),
            bytes_scanned: Arc::new(AtomicU64::new(0)),
            matches_found: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Records a matcher cache lookup
    pub fn record_cache_operation(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            let entries = self.cache_entries.fetch_add(1, Ordering::Relaxed) + 1;
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
            debug!("Matcher cache miss, {} entries compiled", entries);
        }
    }

    /// Records a compilation that had to use the sequential strategy
    pub fn record_fallback(&self) {
        self.sequential_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one completed scan
    pub fn record_scan(&self, bytes: usize, matches: usize) {
        self.documents_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes as u64, Ordering::Relaxed);
        self.matches_found
            .fetch_add(matches as u64, Ordering::Relaxed);
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Gets a snapshot of all counters
    pub fn get_stats(&self) -> ScanStats {
        ScanStats {
            cache_entries: self.cache_entries.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            sequential_fallbacks: self.sequential_fallbacks.load(Ordering::Relaxed),
            documents_scanned: self.documents_scanned.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            matches_found: self.matches_found.load(Ordering::Relaxed),
        }
    }

    /// Logs current statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Scan stats:\n\
             Matchers compiled: {}\n\
             Cache hits/misses: {}/{}\n\
             Sequential fallbacks: {}\n\
             Documents scanned: {} ({} bytes)\n\
             Matches found: {}",
            stats.cache_entries,
            stats.cache_hits,
            stats.cache_misses,
            stats.sequential_fallbacks,
            stats.documents_scanned,
            stats.bytes_scanned,
            stats.matches_found
        );
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of scan counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanStats {
    pub cache_entries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub sequential_fallbacks: u64,
    pub documents_scanned: u64,
    pub bytes_scanned: u64,
    pub matches_found: u64,
}
