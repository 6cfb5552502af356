use std::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

use crate::document::Document;
use crate::errors::ScanResult;
use crate::lines::LineIndex;
use crate::metrics::ScanMetrics;
use crate::navigation::Navigator;
use crate::recognize::{ImageHandle, Recognizer};
use crate::render::{render_document, StyledRun};
use crate::results::Analysis;
use crate::search::{scan, TermMatcher};
use crate::store::TermStore;
use crate::terms::TermSet;

/// Scans `text` and maps every match to its line
pub fn analyze(matcher: &TermMatcher, text: &str) -> Analysis {
    let spans = scan(matcher, text);
    let index = LineIndex::new(text);
    Analysis {
        match_lines: index.match_lines(&spans),
        line_count: index.len(),
        spans,
    }
}

/// The latest term set and document, plus everything derived from them.
///
/// Derived results are recomputed whenever either input changes and left alone
/// when an update carries the same contents. A recompute replaces the analysis
/// and rebuilds the navigator; nothing from the previous pair is reused.
pub struct ScanSession {
    terms: TermSet,
    document: Option<Document>,
    matcher: TermMatcher,
    analysis: Analysis,
    navigator: Navigator,
    metrics: ScanMetrics,
    updates: Option<Receiver<TermSet>>,
}

impl ScanSession {
    pub fn new(terms: TermSet) -> Self {
        Self::with_metrics(terms, ScanMetrics::new())
    }

    pub fn with_metrics(terms: TermSet, metrics: ScanMetrics) -> Self {
        let matcher = TermMatcher::with_metrics(&terms, metrics.clone());
        Self {
            terms,
            document: None,
            matcher,
            analysis: Analysis::default(),
            navigator: Navigator::default(),
            metrics,
            updates: None,
        }
    }

    /// Replaces the term set. Returns whether anything was recomputed.
    pub fn set_terms(&mut self, terms: TermSet) -> bool {
        if terms.fingerprint() == self.terms.fingerprint() {
            debug!("Term set unchanged, keeping current results");
            return false;
        }
        self.matcher = TermMatcher::with_metrics(&terms, self.metrics.clone());
        self.terms = terms;
        self.refresh();
        true
    }

    /// Replaces the document. Returns whether anything was recomputed.
    pub fn set_document(&mut self, document: Document) -> bool {
        if self
            .document
            .as_ref()
            .is_some_and(|current| current.fingerprint() == document.fingerprint())
        {
            debug!("Document unchanged, keeping current results");
            return false;
        }
        self.document = Some(document);
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        self.analysis = match &self.document {
            Some(document) => analyze(&self.matcher, document.text()),
            None => Analysis::default(),
        };
        self.navigator = Navigator::new(self.analysis.match_lines.clone());
        debug!(
            "Recomputed analysis: {} matches over {} lines",
            self.analysis.match_count(),
            self.analysis.line_count
        );
    }

    /// Recognizes an image and makes its text the current document.
    ///
    /// On failure the previous document, results and cursor are kept.
    pub fn recognize(
        &mut self,
        recognizer: &dyn Recognizer,
        image: &ImageHandle,
    ) -> ScanResult<&Analysis> {
        let text = match recognizer.recognize(image) {
            Ok(text) => text,
            Err(e) => {
                warn!("Keeping previous results: {}", e);
                return Err(e);
            }
        };
        info!(
            "Recognized {} bytes from {}",
            text.len(),
            image.path().display()
        );
        self.set_document(Document::new(text));
        Ok(&self.analysis)
    }

    /// Follows a term store: applies its current set now and later updates on
    /// [`sync_terms`](Self::sync_terms)
    pub fn attach_store(&mut self, store: &dyn TermStore) -> ScanResult<()> {
        self.updates = Some(store.subscribe()?);
        self.sync_terms();
        Ok(())
    }

    /// Applies the newest term set received from the attached store
    pub fn sync_terms(&mut self) -> bool {
        let latest = match &self.updates {
            Some(updates) => updates.try_iter().last(),
            None => None,
        };
        match latest {
            Some(terms) => self.set_terms(terms),
            None => false,
        }
    }

    /// Highlighted runs for every line of the current document
    pub fn render(&self) -> Vec<Vec<StyledRun>> {
        match &self.document {
            Some(document) => render_document(document.text(), &self.analysis.spans),
            None => Vec::new(),
        }
    }

    pub fn first(&mut self) -> Option<usize> {
        self.navigator.first()
    }

    pub fn next(&mut self) -> Option<usize> {
        self.navigator.next()
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.navigator.previous()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn analysis(&self) -> &Analysis {
        &self.analysis
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn terms(&self) -> &TermSet {
        &self.terms
    }

    pub fn metrics(&self) -> &ScanMetrics {
        &self.metrics
    }
}
