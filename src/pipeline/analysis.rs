// Analysis run: documents -> corpus -> vectors -> clusters -> ranked
// clusters -> one atomic commit.
//
// `analyse` is the pure part and never touches storage. `run` loads the
// documents, calls `analyse`, and writes the result in one transaction.
// When the corpus has no shared feature the run is skipped entirely: the
// `VectorizeError` is returned and nothing is stored.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::materialize::materialize;
use crate::cluster::traits::DensityClusterer;
use crate::corpus::{Corpus, Vector};
use crate::db::models::{Document, NewAnalysis};
use crate::db::Database;
use crate::text::features::FeatureExtractor;

/// Which documents are candidates for clustering.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisWindow {
    /// Candidates are published strictly after `now - span`
    pub span: Duration,
    pub now: DateTime<Utc>,
}

impl AnalysisWindow {
    /// Fails when the window start cannot be represented.
    pub fn last_hours(hours: i64, now: DateTime<Utc>) -> Result<Self> {
        let span = Duration::try_hours(hours)
            .with_context(|| format!("Analysis window of {hours} hours is out of range"))?;
        let window = Self { span, now };
        window.cutoff()?;
        Ok(window)
    }

    pub fn cutoff(&self) -> Result<DateTime<Utc>> {
        self.now
            .checked_sub_signed(self.span)
            .with_context(|| format!("Analysis window of {} is out of range", self.span))
    }
}

/// Counts describing one run, for logging and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisSummary {
    pub documents: usize,
    pub candidates: usize,
    pub vocabulary: usize,
    pub clusters: usize,
    pub clustered: usize,
    pub noise: usize,
}

/// Cluster the documents published inside `window`.
///
/// IDF statistics come from all `documents`, not only the candidates.
/// Fails with [`crate::corpus::VectorizeError`] when no feature is shared by
/// two documents; fewer candidates than the clusterer needs simply yields an
/// analysis with no clusters.
pub fn analyse(
    documents: Vec<Document>,
    extractor: &FeatureExtractor,
    clusterer: &dyn DensityClusterer,
    window: &AnalysisWindow,
) -> Result<(NewAnalysis, AnalysisSummary)> {
    let corpus = Corpus::build(documents, extractor);
    let cutoff = window.cutoff()?;
    let in_window = move |d: &Document| d.published_at > cutoff;

    let vocabulary = corpus.vocabulary()?;
    let candidates: Vec<&Document> = corpus.iter(in_window).collect();
    let vectors: Vec<Vector> = corpus.vectors(&vocabulary, in_window).collect();
    info!(
        documents = corpus.len(),
        candidates = candidates.len(),
        vocabulary = vocabulary.len(),
        "Documents vectorized"
    );

    let raw = clusterer.cluster(&vectors)?;
    let clusters = materialize(&raw, &candidates, &vectors);
    let clustered: usize = clusters.iter().map(|c| c.matches.len()).sum();

    let summary = AnalysisSummary {
        documents: corpus.len(),
        candidates: candidates.len(),
        vocabulary: vocabulary.len(),
        clusters: clusters.len(),
        clustered,
        noise: candidates.len() - clustered,
    };
    info!(
        clusters = summary.clusters,
        clustered = summary.clustered,
        noise = summary.noise,
        "Clustering finished"
    );

    Ok((
        NewAnalysis {
            created_at: window.now,
            clusters,
        },
        summary,
    ))
}

/// Run one analysis over every stored document and commit it.
///
/// Returns the new analysis id. Nothing is written if any stage fails.
pub async fn run(
    db: &Arc<dyn Database>,
    extractor: &FeatureExtractor,
    clusterer: &dyn DensityClusterer,
    window: &AnalysisWindow,
) -> Result<(i64, AnalysisSummary)> {
    let documents = db.get_documents().await?;
    info!(documents = documents.len(), "Starting analysis");

    let (analysis, summary) = analyse(documents, extractor, clusterer, window)?;
    let analysis_id = db.save_analysis(&analysis).await?;

    info!(analysis_id, clusters = summary.clusters, "Analysis committed");
    Ok((analysis_id, summary))
}
