// Database queries: CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::models::{Analysis, Document, NewAnalysis, Source, StoredCluster, StoredMatch};

// --- Sources ---

/// Register a feed source and return its ID.
pub fn add_source(conn: &Connection, url: &str, display_name: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO sources (url, display_name) VALUES (?1, ?2)",
        params![url, display_name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All registered sources, oldest first.
pub fn get_sources(conn: &Connection) -> Result<Vec<Source>> {
    let mut stmt = conn.prepare("SELECT id, url, display_name FROM sources ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok(Source {
            id: row.get(0)?,
            url: row.get(1)?,
            display_name: row.get(2)?,
        })
    })?;

    let mut sources = Vec::new();
    for row in rows {
        sources.push(row?);
    }
    Ok(sources)
}

// --- Documents ---

const DOCUMENT_COLUMNS: &str =
    "d.guid, d.title, d.description, d.link, d.media, d.published_at, d.source_id";

/// Map the seven document columns starting at `offset`.
fn document_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Document> {
    Ok(Document {
        guid: row.get(offset)?,
        title: row.get(offset + 1)?,
        description: row.get(offset + 2)?,
        link: row.get(offset + 3)?,
        media: row.get(offset + 4)?,
        published_at: row.get(offset + 5)?,
        source_id: row.get(offset + 6)?,
    })
}

/// Insert a document. Returns false if a document with the same guid exists.
pub fn insert_document(conn: &Connection, document: &Document) -> Result<bool> {
    let inserted = conn
        .execute(
            "INSERT OR IGNORE INTO documents
                (guid, title, description, link, media, published_at, source_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                document.guid,
                document.title,
                document.description,
                document.link,
                document.media,
                document.published_at,
                document.source_id,
            ],
        )
        .with_context(|| format!("Failed to insert document {}", document.guid))?;
    Ok(inserted == 1)
}

/// All documents in insertion order.
pub fn get_documents(conn: &Connection) -> Result<Vec<Document>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents d ORDER BY d.rowid"
    ))?;
    let rows = stmt.query_map([], |row| document_from_row(row, 0))?;

    let mut documents = Vec::new();
    for row in rows {
        documents.push(row?);
    }
    Ok(documents)
}

pub fn document_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
    Ok(count)
}

// --- Analyses ---

/// Write an analysis with all its clusters and matches in one transaction.
///
/// Either everything is committed or nothing is: a failure part-way through
/// (e.g. a match pointing at an unknown document) rolls the whole run back.
pub fn save_analysis(conn: &mut Connection, analysis: &NewAnalysis) -> Result<i64> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO analyses (created_at) VALUES (?1)",
        params![analysis.created_at],
    )?;
    let analysis_id = tx.last_insert_rowid();

    {
        let mut insert_cluster = tx.prepare("INSERT INTO clusters (analysis_id) VALUES (?1)")?;
        let mut insert_match = tx.prepare(
            "INSERT INTO matches (cluster_id, document_guid, distance) VALUES (?1, ?2, ?3)",
        )?;

        for cluster in &analysis.clusters {
            insert_cluster.execute(params![analysis_id])?;
            let cluster_id = tx.last_insert_rowid();
            for m in &cluster.matches {
                insert_match
                    .execute(params![cluster_id, m.document_guid, m.distance])
                    .with_context(|| {
                        format!("Failed to store match for document {}", m.document_guid)
                    })?;
            }
        }
    }

    tx.commit().context("Failed to commit analysis")?;
    debug!(
        analysis_id,
        clusters = analysis.clusters.len(),
        "Analysis stored"
    );
    Ok(analysis_id)
}

/// All analyses with their cluster counts, oldest first.
pub fn get_analyses(conn: &Connection) -> Result<Vec<Analysis>> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.created_at, COUNT(c.id)
         FROM analyses a
         LEFT JOIN clusters c ON c.analysis_id = a.id
         GROUP BY a.id
         ORDER BY a.id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Analysis {
            id: row.get(0)?,
            created_at: row.get(1)?,
            cluster_count: row.get(2)?,
        })
    })?;

    let mut analyses = Vec::new();
    for row in rows {
        analyses.push(row?);
    }
    Ok(analyses)
}

pub fn get_analysis(conn: &Connection, id: i64) -> Result<Option<Analysis>> {
    let result = conn
        .query_row(
            "SELECT a.id, a.created_at,
                    (SELECT COUNT(*) FROM clusters c WHERE c.analysis_id = a.id)
             FROM analyses a WHERE a.id = ?1",
            params![id],
            |row| {
                Ok(Analysis {
                    id: row.get(0)?,
                    created_at: row.get(1)?,
                    cluster_count: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(result)
}

/// The most recent analysis, if any has run.
pub fn get_latest_analysis(conn: &Connection) -> Result<Option<Analysis>> {
    let latest: Option<i64> = conn
        .query_row("SELECT MAX(id) FROM analyses", [], |row| {
            row.get::<_, Option<i64>>(0)
        })
        .optional()?
        .flatten();
    match latest {
        Some(id) => get_analysis(conn, id),
        None => Ok(None),
    }
}

// --- Clusters ---

/// Matches of a cluster, nearest first (ties keep insertion order).
fn get_matches(conn: &Connection, cluster_id: i64) -> Result<Vec<StoredMatch>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT m.id, m.distance, {DOCUMENT_COLUMNS}
         FROM matches m
         JOIN documents d ON d.guid = m.document_guid
         WHERE m.cluster_id = ?1
         ORDER BY m.distance, m.id"
    ))?;
    let rows = stmt.query_map(params![cluster_id], |row| {
        Ok(StoredMatch {
            id: row.get(0)?,
            distance: row.get(1)?,
            document: document_from_row(row, 2)?,
        })
    })?;

    let mut matches = Vec::new();
    for row in rows {
        matches.push(row?);
    }
    Ok(matches)
}

/// All clusters of an analysis, in creation order, with their matches.
pub fn get_clusters(conn: &Connection, analysis_id: i64) -> Result<Vec<StoredCluster>> {
    let mut stmt =
        conn.prepare("SELECT id FROM clusters WHERE analysis_id = ?1 ORDER BY id")?;
    let ids: Vec<i64> = stmt
        .query_map(params![analysis_id], |row| row.get(0))?
        .collect::<rusqlite::Result<_>>()?;

    ids.into_iter()
        .map(|id| {
            Ok(StoredCluster {
                id,
                analysis_id,
                matches: get_matches(conn, id)?,
            })
        })
        .collect()
}

pub fn get_cluster(conn: &Connection, id: i64) -> Result<Option<StoredCluster>> {
    let analysis_id: Option<i64> = conn
        .query_row(
            "SELECT analysis_id FROM clusters WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    match analysis_id {
        Some(analysis_id) => Ok(Some(StoredCluster {
            id,
            analysis_id,
            matches: get_matches(conn, id)?,
        })),
        None => Ok(None),
    }
}
