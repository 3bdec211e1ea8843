// Language trait: the stop-word list and stemmer behind feature extraction.
//
// Built once per run and handed to the FeatureExtractor, so stemmer tables
// are never rebuilt per document. Tests plug in a stub to get exact tokens.

use std::borrow::Cow;

/// Language resources used to normalize raw words into tokens.
pub trait Language: Send + Sync {
    /// Whether the lowercased word is a stop word.
    fn is_stop_word(&self, word: &str) -> bool;

    /// Reduce a lowercased word to its stem.
    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str>;
}
