// Cluster presenter: pick the fields shown for a cluster from its ranked
// matches. Pure and read-only.

use serde::Serialize;

use crate::db::models::{Document, StoredCluster};
use crate::text::html::strip_html;

/// What the display layer shows for one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterView {
    pub id: i64,
    /// Title of the match nearest the centroid
    pub title: String,
    pub description: String,
    pub media: Option<String>,
    /// Member documents with their distances, nearest first
    pub sources: Vec<(Document, f64)>,
}

/// Build the view of a cluster whose matches are sorted nearest first.
///
/// * title: the nearest match's title
/// * description: the first stripped description that differs from the
///   title, else the title itself. Whitespace is kept as stored, so an
///   empty or padded description still counts.
/// * media: the first non-null media, in distance order
///
/// An empty cluster presents an empty title.
pub fn present(cluster: &StoredCluster) -> ClusterView {
    let title = cluster
        .matches
        .first()
        .map(|m| m.document.title.clone())
        .unwrap_or_default();

    let description = cluster
        .matches
        .iter()
        .map(|m| strip_html(&m.document.description))
        .find(|d| *d != title)
        .unwrap_or_else(|| title.clone());

    let media = cluster
        .matches
        .iter()
        .find_map(|m| m.document.media.clone());

    let sources = cluster
        .matches
        .iter()
        .map(|m| (m.document.clone(), m.distance))
        .collect();

    ClusterView {
        id: cluster.id,
        title,
        description,
        media,
        sources,
    }
}
