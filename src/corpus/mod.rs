// Corpus: document-frequency statistics and TF-IDF vectorization.
//
// The corpus is built once per analysis from every stored document, so IDF
// weights reflect the whole collection even when only a recent subset is
// vectorized. Each document's term counts are computed once, at build time.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::db::models::Document;
use crate::text::features::{Feature, FeatureExtractor, TermCounts};

/// A dense weight vector, one entry per vocabulary feature.
pub type Vector = Vec<f64>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorizeError {
    /// No feature occurs in more than one document, so the vocabulary is empty.
    #[error(
        "insufficient data: no feature is shared between documents \
         ({documents} documents, {features} distinct features)"
    )]
    InsufficientData { documents: usize, features: usize },
}

struct Entry {
    document: Document,
    terms: TermCounts,
}

/// An ordered collection of documents plus per-feature document frequencies.
pub struct Corpus {
    entries: Vec<Entry>,
    df: BTreeMap<Feature, usize>,
}

impl Corpus {
    /// Build a corpus in a single pass, keeping the input order.
    ///
    /// Each distinct feature of a document bumps its document frequency by
    /// one, however many times it occurs in that document.
    pub fn build<I>(documents: I, extractor: &FeatureExtractor) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        let mut entries = Vec::new();
        let mut df: BTreeMap<Feature, usize> = BTreeMap::new();

        for document in documents {
            let terms = extractor.document_terms(&document);
            for feature in terms.keys() {
                *df.entry(feature.clone()).or_insert(0) += 1;
            }
            entries.push(Entry { document, terms });
        }

        debug!(
            documents = entries.len(),
            features = df.len(),
            "Corpus built"
        );

        Self { entries, df }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of documents containing `feature` at least once.
    pub fn document_frequency(&self, feature: &Feature) -> usize {
        self.df.get(feature).copied().unwrap_or(0)
    }

    /// Number of distinct features seen across the corpus.
    pub fn distinct_features(&self) -> usize {
        self.df.len()
    }

    /// Documents matching `predicate`, in corpus order.
    ///
    /// Each call starts from the beginning, so the same predicate always
    /// yields the same sequence.
    pub fn iter<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a Document> + 'a
    where
        P: Fn(&Document) -> bool + 'a,
    {
        self.entries
            .iter()
            .map(|e| &e.document)
            .filter(move |d| predicate(d))
    }

    /// Features with document frequency above one, with their IDF weights.
    pub fn vocabulary(&self) -> Result<Vocabulary, VectorizeError> {
        let total = self.entries.len() as f64;
        let (features, idf): (Vec<Feature>, Vec<f64>) = self
            .df
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(feature, &count)| (feature.clone(), (total / count as f64).ln()))
            .unzip();

        if features.is_empty() {
            return Err(VectorizeError::InsufficientData {
                documents: self.entries.len(),
                features: self.df.len(),
            });
        }

        Ok(Vocabulary { features, idf })
    }

    /// One vector per document matching `predicate`, in the same order as
    /// [`Corpus::iter`] with that predicate.
    ///
    /// The vocabulary and IDF come from the whole corpus regardless of the
    /// predicate, so every vector has the same length and feature order.
    pub fn vectorize<'a, P>(
        &'a self,
        predicate: P,
    ) -> Result<impl Iterator<Item = Vector> + 'a, VectorizeError>
    where
        P: Fn(&Document) -> bool + 'a,
    {
        let vocabulary = self.vocabulary()?;
        debug!(vocabulary = vocabulary.len(), "Vectorizing documents");
        Ok(self
            .entries
            .iter()
            .filter(move |e| predicate(&e.document))
            .map(move |e| vocabulary.vector(&e.terms)))
    }

    /// Like [`Corpus::vectorize`], with a vocabulary the caller already built
    /// from this corpus.
    pub fn vectors<'a, P>(
        &'a self,
        vocabulary: &'a Vocabulary,
        predicate: P,
    ) -> impl Iterator<Item = Vector> + 'a
    where
        P: Fn(&Document) -> bool + 'a,
    {
        self.entries
            .iter()
            .filter(move |e| predicate(&e.document))
            .map(move |e| vocabulary.vector(&e.terms))
    }
}

/// The fixed, ordered feature set of one corpus snapshot.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    features: Vec<Feature>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// IDF of a single feature, if it belongs to the vocabulary.
    pub fn idf_of(&self, feature: &Feature) -> Option<f64> {
        self.features
            .binary_search(feature)
            .ok()
            .map(|i| self.idf[i])
    }

    /// Weight vector for one document's term counts.
    ///
    /// Each weight is `tf / |vocabulary| * idf`. The division by vocabulary
    /// size is a fixed scale shared by all vectors, not a norm.
    pub fn vector(&self, terms: &TermCounts) -> Vector {
        let size = self.features.len() as f64;
        self.features
            .iter()
            .zip(&self.idf)
            .map(|(feature, idf)| {
                let tf = terms.get(feature).copied().unwrap_or(0) as f64;
                tf / size * idf
            })
            .collect()
    }
}
