// Data models: Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A feed the documents come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub url: String,
    pub display_name: String,
}

/// One news article. Never modified once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (feed guid or cleaned link)
    pub guid: String,
    pub title: String,
    /// Summary text, possibly containing HTML
    pub description: String,
    pub link: Option<String>,
    /// Image reference shown alongside the article
    pub media: Option<String>,
    pub published_at: DateTime<Utc>,
    pub source_id: Option<i64>,
}

impl Document {
    pub fn new(
        guid: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            guid: guid.into(),
            title: title.into(),
            description: description.into(),
            link: None,
            media: None,
            published_at,
            source_id: None,
        }
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// A stored analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub cluster_count: u32,
}

/// A stored cluster with its matches, nearest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredCluster {
    pub id: i64,
    pub analysis_id: i64,
    pub matches: Vec<StoredMatch>,
}

/// One member of a stored cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMatch {
    pub id: i64,
    /// Euclidean distance from the document's vector to the cluster centroid
    pub distance: f64,
    pub document: Document,
}

/// An analysis ready to be written, produced by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalysis {
    pub created_at: DateTime<Utc>,
    pub clusters: Vec<NewCluster>,
}

/// A cluster ready to be written; matches are already sorted by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCluster {
    pub matches: Vec<NewMatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMatch {
    pub document_guid: String,
    pub distance: f64,
}
