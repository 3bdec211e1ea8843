// Concrete languages: French (the default) and English.
//
// French uses a short fixed stop-word list tuned for news headlines; the
// Snowball stemmer does the rest. English borrows its list from the
// stop-words crate.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use rust_stemmers::{Algorithm, Stemmer};
use stop_words::{get, LANGUAGE};

use super::traits::Language;

/// Stop words dropped before stemming French text. Compared against the
/// lowercased word, accents included.
pub const FRENCH_STOP_WORDS: &[&str] = &[
    "a", "au", "aux", "avec", "ce", "ces", "d", "dans", "de", "du", "elle", "en", "et", "eux",
    "il", "je", "la", "le", "les", "leur", "lui", "ma", "mais", "me", "meme", "mes", "moi", "mon",
    "ne", "nos", "notre", "nous", "on", "ou", "par", "pas", "pour", "qu", "que", "qui", "sa", "se",
    "ses", "son", "sur", "ta", "te", "tes", "toi", "ton", "tu", "un", "une", "vos", "votre",
    "vous", "à", "l", "est", "y", "sont", "été", "où", "n",
];

/// French: fixed stop-word list plus the Snowball French stemmer.
pub struct French {
    stemmer: Stemmer,
    stop_words: HashSet<&'static str>,
}

impl French {
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::French),
            stop_words: FRENCH_STOP_WORDS.iter().copied().collect(),
        }
    }
}

impl Default for French {
    fn default() -> Self {
        Self::new()
    }
}

impl Language for French {
    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        self.stemmer.stem(word)
    }
}

/// English: stop-words crate list plus the Snowball English stemmer.
pub struct English {
    stemmer: Stemmer,
    stop_words: HashSet<String>,
}

impl English {
    pub fn new() -> Self {
        let stop_words: Vec<String> = get(LANGUAGE::English);
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stop_words: stop_words.into_iter().collect(),
        }
    }
}

impl Default for English {
    fn default() -> Self {
        Self::new()
    }
}

impl Language for English {
    fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    fn stem<'a>(&self, word: &'a str) -> Cow<'a, str> {
        self.stemmer.stem(word)
    }
}

/// Which language to analyze documents in (selected via configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LanguageKind {
    #[default]
    French,
    English,
}

impl LanguageKind {
    /// Construct the language resources. Do this once per run.
    pub fn build(self) -> Box<dyn Language> {
        match self {
            LanguageKind::French => Box::new(French::new()),
            LanguageKind::English => Box::new(English::new()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageKind::French => "french",
            LanguageKind::English => "english",
        }
    }
}

impl FromStr for LanguageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "french" | "fr" => Ok(LanguageKind::French),
            "english" | "en" => Ok(LanguageKind::English),
            other => anyhow::bail!("Unsupported language '{other}' (expected french or english)"),
        }
    }
}

impl fmt::Display for LanguageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
