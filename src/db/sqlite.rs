// SqliteDatabase: rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{Analysis, Document, NewAnalysis, Source, StoredCluster};
use super::queries;
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn add_source(&self, url: &str, display_name: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::add_source(&conn, url, display_name)
    }

    async fn get_sources(&self) -> Result<Vec<Source>> {
        let conn = self.conn.lock().await;
        queries::get_sources(&conn)
    }

    async fn insert_document(&self, document: &Document) -> Result<bool> {
        let conn = self.conn.lock().await;
        queries::insert_document(&conn, document)
    }

    async fn get_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn.lock().await;
        queries::get_documents(&conn)
    }

    async fn document_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        queries::document_count(&conn)
    }

    async fn save_analysis(&self, analysis: &NewAnalysis) -> Result<i64> {
        let mut conn = self.conn.lock().await;
        queries::save_analysis(&mut conn, analysis)
    }

    async fn get_analyses(&self) -> Result<Vec<Analysis>> {
        let conn = self.conn.lock().await;
        queries::get_analyses(&conn)
    }

    async fn get_analysis(&self, id: i64) -> Result<Option<Analysis>> {
        let conn = self.conn.lock().await;
        queries::get_analysis(&conn, id)
    }

    async fn get_latest_analysis(&self) -> Result<Option<Analysis>> {
        let conn = self.conn.lock().await;
        queries::get_latest_analysis(&conn)
    }

    async fn get_clusters(&self, analysis_id: i64) -> Result<Vec<StoredCluster>> {
        let conn = self.conn.lock().await;
        queries::get_clusters(&conn, analysis_id)
    }

    async fn get_cluster(&self, id: i64) -> Result<Option<StoredCluster>> {
        let conn = self.conn.lock().await;
        queries::get_cluster(&conn, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{NewCluster, NewMatch};
    use crate::db::schema::create_tables;
    use chrono::Utc;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        assert_eq!(db.table_count().await.unwrap(), 6);
    }

    #[tokio::test]
    async fn test_trait_sources_roundtrip() {
        let db = test_db().await;
        let id = db
            .add_source("https://news.example/rss", "Example News")
            .await
            .unwrap();
        let sources = db.get_sources().await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, id);
        assert_eq!(sources[0].display_name, "Example News");
    }

    #[tokio::test]
    async fn test_trait_analysis_roundtrip() {
        let db = test_db().await;
        let doc = Document::new("g1", "Storm hits coast", "", Utc::now());
        assert!(db.insert_document(&doc).await.unwrap());
        assert_eq!(db.document_count().await.unwrap(), 1);

        let id = db
            .save_analysis(&NewAnalysis {
                created_at: Utc::now(),
                clusters: vec![NewCluster {
                    matches: vec![NewMatch {
                        document_guid: "g1".to_string(),
                        distance: 0.25,
                    }],
                }],
            })
            .await
            .unwrap();

        let analyses = db.get_analyses().await.unwrap();
        assert_eq!(analyses.len(), 1);
        assert_eq!(analyses[0].cluster_count, 1);

        let clusters = db.get_clusters(id).await.unwrap();
        assert_eq!(clusters[0].matches[0].document.title, "Storm hits coast");
        assert!((clusters[0].matches[0].distance - 0.25).abs() < f64::EPSILON);
        assert_eq!(db.get_latest_analysis().await.unwrap().unwrap().id, id);
    }
}
