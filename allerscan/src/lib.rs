pub mod config;
pub mod document;
pub mod errors;
pub mod interactive;
pub mod lines;
pub mod metrics;
pub mod navigation;
pub mod recognize;
pub mod render;
pub mod results;
pub mod search;
pub mod session;
pub mod store;
pub mod terms;

pub use config::{CliOverrides, ScanConfig};
pub use document::Document;
pub use errors::{ScanError, ScanResult};
pub use lines::LineIndex;
pub use navigation::Navigator;
pub use recognize::{create_recognizer, ImageHandle, Recognizer, RecognizerKind};
pub use render::{render_document, render_line, StyledRun};
pub use results::{Analysis, MatchSpan};
pub use search::{compile, scan, TermMatcher};
pub use session::{analyze, ScanSession};
pub use store::{JsonTermStore, MemoryTermStore, TermStore};
pub use terms::{Term, TermSet};
