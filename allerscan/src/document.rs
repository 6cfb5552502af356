use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Text recognized from one image.
///
/// Immutable once built. Line breaks are normalized to `\n` on construction so
/// every line boundary is exactly one byte wide.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    text: String,
    fingerprint: u64,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        let text = match normalize_line_breaks(&text) {
            Cow::Borrowed(_) => text,
            Cow::Owned(normalized) => normalized,
        };
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        Self {
            fingerprint: hasher.finish(),
            text,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Hash of the document's text
    pub fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}

/// Rewrites `\r\n` and lone `\r` as `\n`
pub fn normalize_line_breaks(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}
