// Database trait: async interface for every storage operation.
//
// SqliteDatabase is the implementation. Methods are async so callers
// can hold an `Arc<dyn Database>` and never touch rusqlite directly.
//
// The trait mirrors the queries.rs function signatures; the free functions
// stay usable against a bare Connection in tests.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{Analysis, Document, NewAnalysis, Source, StoredCluster};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Sources ---

    /// Register a feed source and return its ID.
    async fn add_source(&self, url: &str, display_name: &str) -> Result<i64>;

    async fn get_sources(&self) -> Result<Vec<Source>>;

    // --- Documents ---

    /// Store a document. Returns false when the guid is already known.
    async fn insert_document(&self, document: &Document) -> Result<bool>;

    /// All documents, in insertion order.
    async fn get_documents(&self) -> Result<Vec<Document>>;

    async fn document_count(&self) -> Result<i64>;

    // --- Analyses ---

    /// Write an analysis and all of its clusters and matches atomically.
    async fn save_analysis(&self, analysis: &NewAnalysis) -> Result<i64>;

    /// All analyses with cluster counts, oldest first.
    async fn get_analyses(&self) -> Result<Vec<Analysis>>;

    async fn get_analysis(&self, id: i64) -> Result<Option<Analysis>>;

    async fn get_latest_analysis(&self) -> Result<Option<Analysis>>;

    // --- Clusters ---

    /// Clusters of an analysis with their matches, nearest first.
    async fn get_clusters(&self, analysis_id: i64) -> Result<Vec<StoredCluster>>;

    async fn get_cluster(&self, id: i64) -> Result<Option<StoredCluster>>;
}
