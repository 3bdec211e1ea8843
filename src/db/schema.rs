// Database schema: table creation and migrations.
//
// A `schema_version` table records which schema revisions have been applied,
// so later migrations can check it before altering tables.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent, so it's safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Feeds the documents were fetched from
        CREATE TABLE IF NOT EXISTS sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            url TEXT NOT NULL,
            display_name TEXT NOT NULL
        );

        -- News articles; rowid order is the corpus order
        CREATE TABLE IF NOT EXISTS documents (
            guid TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            link TEXT,
            media TEXT,
            published_at TEXT NOT NULL,
            source_id INTEGER REFERENCES sources(id)
        );

        -- One row per clustering run
        CREATE TABLE IF NOT EXISTS analyses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS clusters (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            analysis_id INTEGER NOT NULL REFERENCES analyses(id)
        );

        -- Cluster members with their distance to the centroid
        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cluster_id INTEGER NOT NULL REFERENCES clusters(id),
            document_guid TEXT NOT NULL REFERENCES documents(guid),
            distance REAL NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_published
            ON documents(published_at);

        CREATE INDEX IF NOT EXISTS idx_clusters_analysis
            ON clusters(analysis_id);

        CREATE INDEX IF NOT EXISTS idx_matches_cluster
            ON matches(cluster_id, distance);
        ",
    )
    .context("Failed to create database tables")?;

    // Record initial schema version if not already set
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        // Running create_tables twice should not error
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        let count = table_count(&conn).unwrap();
        // schema_version, sources, documents, analyses, clusters, matches
        assert_eq!(count, 6i64);
    }

    #[test]
    fn test_matches_require_existing_document() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn.execute(
            "INSERT INTO analyses (created_at) VALUES ('2024-01-01 00:00:00')",
            [],
        )
        .unwrap();
        conn.execute("INSERT INTO clusters (analysis_id) VALUES (1)", [])
            .unwrap();
        let result = conn.execute(
            "INSERT INTO matches (cluster_id, document_guid, distance) VALUES (1, 'missing', 0.0)",
            [],
        );
        assert!(result.is_err(), "Foreign key on document_guid should be enforced");
    }
}
