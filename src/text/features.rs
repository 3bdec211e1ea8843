// Feature extraction: raw text to a multiset of unigrams and bigrams.
//
// Text is split into sentences, sentences into words, and each word is
// lowercased, stop-word filtered, stemmed, and stripped of diacritics.
// Surviving tokens yield one unigram each plus one bigram per adjacent pair
// in the same sentence. Bigrams never cross a sentence boundary.

use std::collections::HashMap;
use std::fmt;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::html::strip_html;
use super::traits::Language;
use crate::db::models::Document;

/// A language feature: a single normalized token or an ordered pair of
/// adjacent tokens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Feature {
    Unigram(String),
    Bigram(String, String),
}

impl Feature {
    pub fn unigram(token: impl Into<String>) -> Self {
        Feature::Unigram(token.into())
    }

    pub fn bigram(first: impl Into<String>, second: impl Into<String>) -> Self {
        Feature::Bigram(first.into(), second.into())
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::Unigram(t) => write!(f, "{t}"),
            Feature::Bigram(a, b) => write!(f, "{a} {b}"),
        }
    }
}

/// Occurrence count per feature for one document.
pub type TermCounts = HashMap<Feature, u32>;

const SENTENCE_SEPARATORS: [char; 5] = ['.', ';', '!', ':', '?'];

fn is_word_separator(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{0b}'
            | '\r'
            | ' '
            | '\u{a0}'
            | '\''
            | '"'
            | '('
            | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '«'
            | '»'
            | ','
            | '’'
            | '-'
            | '–'
    )
}

/// Remove combining marks after canonical decomposition ("é" -> "e").
pub fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Turns text into features using one set of language resources.
pub struct FeatureExtractor {
    language: Box<dyn Language>,
}

impl FeatureExtractor {
    pub fn new(language: Box<dyn Language>) -> Self {
        Self { language }
    }

    /// Normalize one raw word into a token, or `None` if it should be dropped.
    pub fn normalize_word(&self, raw: &str) -> Option<String> {
        let word = raw.trim().to_lowercase();
        if self.language.is_stop_word(&word) {
            return None;
        }
        let token = strip_diacritics(&self.language.stem(&word));
        let starts_with_letter = token.chars().next().is_some_and(char::is_alphabetic);
        if !starts_with_letter || !token.chars().all(char::is_alphanumeric) {
            return None;
        }
        Some(token)
    }

    /// Extract the features of one text, in order of appearance.
    ///
    /// Within a sentence, the unigrams come first, followed by its bigrams.
    /// Never fails: text with nothing usable yields an empty list.
    pub fn extract(&self, text: &str) -> Vec<Feature> {
        let mut features = Vec::new();
        for sentence in text.split(SENTENCE_SEPARATORS) {
            let tokens: Vec<String> = sentence
                .split(is_word_separator)
                .filter_map(|w| self.normalize_word(w))
                .collect();
            features.extend(tokens.iter().cloned().map(Feature::Unigram));
            features.extend(
                tokens
                    .windows(2)
                    .map(|pair| Feature::bigram(pair[0].clone(), pair[1].clone())),
            );
        }
        features
    }

    /// Add the features of `text` to an existing count table.
    pub fn count_into(&self, text: &str, counts: &mut TermCounts) {
        for feature in self.extract(text) {
            *counts.entry(feature).or_insert(0) += 1;
        }
    }

    /// Term counts for a document: its title, plus its HTML-stripped
    /// description when that differs from the title.
    pub fn document_terms(&self, document: &Document) -> TermCounts {
        let mut counts = TermCounts::new();
        self.count_into(&document.title, &mut counts);
        let description = strip_html(&document.description);
        if description != document.title {
            self.count_into(&description, &mut counts);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    /// Keeps words as-is apart from a tiny stop list.
    struct Plain;

    impl Language for Plain {
        fn is_stop_word(&self, word: &str) -> bool {
            matches!(word, "the" | "a")
        }

        fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
            Cow::Borrowed(word)
        }
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(Box::new(Plain))
    }

    #[test]
    fn test_unigrams_and_bigrams_in_one_sentence() {
        let features = extractor().extract("Fire near the harbour");
        assert_eq!(
            features,
            vec![
                Feature::unigram("fire"),
                Feature::unigram("near"),
                Feature::unigram("harbour"),
                Feature::bigram("fire", "near"),
                Feature::bigram("near", "harbour"),
            ]
        );
    }

    #[test]
    fn test_bigrams_do_not_cross_sentences() {
        let features = extractor().extract("storm ends. markets rally");
        assert!(features.contains(&Feature::bigram("storm", "ends")));
        assert!(features.contains(&Feature::bigram("markets", "rally")));
        assert!(!features.contains(&Feature::bigram("ends", "markets")));
    }

    #[test]
    fn test_punctuation_and_quotes_split_words() {
        let features = extractor().extract("«rates»(up)-[now]");
        let unigrams: Vec<&Feature> = features
            .iter()
            .filter(|f| matches!(f, Feature::Unigram(_)))
            .collect();
        assert_eq!(unigrams.len(), 3);
        assert!(features.contains(&Feature::bigram("rates", "up")));
    }

    #[test]
    fn test_tokens_must_start_with_letter_and_be_alphanumeric() {
        let ex = extractor();
        assert_eq!(ex.normalize_word("2024"), None);
        assert_eq!(ex.normalize_word("covid19").as_deref(), Some("covid19"));
        assert_eq!(ex.normalize_word("e&o"), None);
        assert_eq!(ex.normalize_word(""), None);
    }

    #[test]
    fn test_stop_words_are_checked_after_lowercasing() {
        assert_eq!(extractor().normalize_word("The"), None);
    }

    #[test]
    fn test_diacritics_are_stripped() {
        assert_eq!(extractor().normalize_word("Élysée").as_deref(), Some("elysee"));
        assert_eq!(strip_diacritics("ça où"), "ca ou");
    }

    #[test]
    fn test_malformed_input_yields_nothing() {
        let ex = extractor();
        assert!(ex.extract("").is_empty());
        assert!(ex.extract("... !!! ?? 123 ---").is_empty());
    }

    #[test]
    fn test_count_into_counts_repeats() {
        let mut counts = TermCounts::new();
        extractor().count_into("rain. rain. rain", &mut counts);
        assert_eq!(counts[&Feature::unigram("rain")], 3);
    }
}
