//! Term compilation and scanning.
//!
//! ```rust,ignore
//! let matcher = compile(&terms);
//! let spans = scan(&matcher, document.text());
//! ```
//!
//! `compile` never fails: blank terms were already dropped by `TermSet`, an
//! empty set yields a matcher with no terms, and a term list too large for a
//! single alternation falls back to sequential matching.
pub mod engine;
pub mod matcher;

pub use engine::{compile, scan};
pub use matcher::{MatchStrategy, TermMatcher};
