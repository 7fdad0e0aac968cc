//! Term counting over visible page text
//!
//! Counting is exact-token: the text is case-folded and split, and a token
//! only counts when it equals a configured term. Punctuation is not stripped,
//! so `again.` never matches `again`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::AddAssign;

/// Dense mapping from every configured term to its occurrence count
///
/// The key set is fixed at construction and always equals the configured term
/// set, including terms that never occur, so consecutive snapshots of the same
/// site share one schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WordDictionary(BTreeMap<String, u64>);

impl WordDictionary {
    /// Creates a dictionary with every term mapped to zero
    pub fn zeroed<S: AsRef<str>>(terms: &[S]) -> Self {
        Self(
            terms
                .iter()
                .map(|t| (t.as_ref().to_string(), 0))
                .collect(),
        )
    }

    /// Count for `term`, or None if the term is not part of the schema
    pub fn get(&self, term: &str) -> Option<u64> {
        self.0.get(term).copied()
    }

    /// Terms in this dictionary, sorted
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    fn bump(&mut self, term: &str) {
        if let Some(count) = self.0.get_mut(term) {
            *count += 1;
        }
    }
}

/// Elementwise addition restricted to the left-hand schema
///
/// Terms the right-hand side has but the left does not are ignored, so the
/// sum of dictionaries built from one term set keeps exactly that term set.
impl AddAssign<&WordDictionary> for WordDictionary {
    fn add_assign(&mut self, other: &WordDictionary) {
        for (term, count) in self.0.iter_mut() {
            if let Some(extra) = other.0.get(term) {
                *count += extra;
            }
        }
    }
}

/// Splits text into case-folded tokens
///
/// Lower-cases the text, turns newlines and forward slashes into spaces,
/// splits on whitespace and drops empty tokens.
///
/// # Examples
///
/// ```
/// use wordwatch::tokenize;
///
/// assert_eq!(tokenize("Covid/Corona\nNEWS"), vec!["covid", "corona", "news"]);
/// ```
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\n', '/'], " ")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Counts exact occurrences of each term in `text`
///
/// Terms are expected to be lower-cased already.
///
/// # Examples
///
/// ```
/// use wordwatch::count_words;
///
/// let counts = count_words("Corona news about Trump and corona again.", &["corona", "trump"]);
/// assert_eq!(counts.get("corona"), Some(2));
/// assert_eq!(counts.get("trump"), Some(1));
/// ```
pub fn count_words<S: AsRef<str>>(text: &str, terms: &[S]) -> WordDictionary {
    let mut counts = WordDictionary::zeroed(terms);
    for token in tokenize(text) {
        counts.bump(&token);
    }
    counts
}
