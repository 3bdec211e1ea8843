// System status display: DB stats, document count, last analysis.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::db::Database;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let sources = db.get_sources().await?;
    println!("Sources: {}", sources.len());
    for source in &sources {
        println!("  [{}] {} <{}>", source.id, source.display_name, source.url);
    }

    let documents = db.document_count().await?;
    println!("Documents: {documents}");
    if documents == 0 {
        println!("  Run `newscluster import --file entries.json` to add some");
    }

    match db.get_latest_analysis().await? {
        Some(analysis) => println!(
            "Last analysis: #{} at {} ({} clusters)",
            analysis.id,
            analysis.created_at.format("%Y-%m-%d %H:%M:%S"),
            analysis.cluster_count
        ),
        None => {
            println!("Last analysis: never");
            println!("  Run `newscluster analyse` to cluster recent documents");
        }
    }

    Ok(())
}

/// Whether the database file exists yet.
pub fn is_initialized(db_path: &str) -> bool {
    Path::new(db_path).exists()
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
