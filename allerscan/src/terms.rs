use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single allergen term: trimmed, never blank.
///
/// Terms order case-insensitively, with the exact text as tie-breaker, which is
/// the order used whenever terms are listed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    // Field order matters for the derived Ord.
    folded: String,
    text: String,
}

impl Term {
    /// Creates a term from user input, or `None` if it is blank after trimming
    pub fn new(raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            folded: fold_case(text),
            text: text.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Case-folded form, used to collapse terms that differ only in case
    pub fn folded(&self) -> &str {
        &self.folded
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Simple case fold of one character.
///
/// Agrees with the `regex` crate's case-insensitive matching: every character
/// folds to exactly one character, so folding never changes how many characters
/// a match covers.
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    let folded = match (lower.next(), lower.next()) {
        (Some(single), None) => single,
        // No single-character lowering (e.g. U+0130), only matches itself
        _ => c,
    };
    match folded {
        'ς' => 'σ',
        'ſ' => 's',
        'ϐ' => 'β',
        'ϑ' => 'θ',
        'ϕ' => 'φ',
        'ϖ' => 'π',
        'ϰ' => 'κ',
        'ϱ' => 'ρ',
        'ϵ' => 'ε',
        'ẛ' => 'ṡ',
        'µ' => 'μ',
        '\u{0345}' | '\u{1FBE}' => 'ι',
        '\u{1C80}' => 'в',
        '\u{1C81}' => 'д',
        '\u{1C82}' => 'о',
        '\u{1C83}' => 'с',
        '\u{1C84}' | '\u{1C85}' => 'т',
        '\u{1C86}' => 'ъ',
        '\u{1C87}' => 'ѣ',
        '\u{1C88}' => '\u{A64B}',
        other => other,
    }
}

/// Simple case fold of a whole string, see [`fold_char`]
pub fn fold_case(text: &str) -> String {
    text.chars().map(fold_char).collect()
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// The user's set of allergen terms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct TermSet {
    terms: BTreeSet<Term>,
}

impl TermSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term. Returns false if the term is blank or already present.
    pub fn insert(&mut self, raw: &str) -> bool {
        match Term::new(raw) {
            Some(term) => self.terms.insert(term),
            None => false,
        }
    }

    /// Removes a term by its trimmed text. Returns whether it was present.
    pub fn remove(&mut self, raw: &str) -> bool {
        match Term::new(raw) {
            Some(term) => self.terms.remove(&term),
            None => false,
        }
    }

    pub fn contains(&self, raw: &str) -> bool {
        Term::new(raw).is_some_and(|term| self.terms.contains(&term))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Iterates terms in display order
    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.iter()
    }

    /// Stable hash of the set's contents
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for term in &self.terms {
            term.text.hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TermSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = TermSet::new();
        for raw in iter {
            set.insert(raw.as_ref());
        }
        set
    }
}

impl From<Vec<String>> for TermSet {
    fn from(raw: Vec<String>) -> Self {
        raw.into_iter().collect()
    }
}

impl From<TermSet> for Vec<String> {
    fn from(set: TermSet) -> Self {
        set.terms.into_iter().map(|t| t.text).collect()
    }
}
