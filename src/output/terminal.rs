// Colored terminal output for analyses and clusters.
//
// All terminal-specific formatting lives here; main.rs fetches the data and
// hands it over.

use colored::Colorize;

use super::present::ClusterView;
use super::truncate_chars;
use crate::db::models::Analysis;
use crate::pipeline::analysis::AnalysisSummary;

/// Display the list of stored analyses.
pub fn display_analyses(analyses: &[Analysis]) {
    if analyses.is_empty() {
        println!("No analyses yet. Run `newscluster analyse` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Analyses ({}) ===", analyses.len()).bold()
    );
    println!();
    println!(
        "  {:>6}  {:<20}  {:>8}",
        "Id".dimmed(),
        "Created".dimmed(),
        "Clusters".dimmed(),
    );
    println!("  {}", "-".repeat(38).dimmed());

    for analysis in analyses {
        let count = if analysis.cluster_count == 0 {
            "0".dimmed()
        } else {
            analysis.cluster_count.to_string().normal()
        };
        println!(
            "  {:>6}  {:<20}  {:>8}",
            analysis.id,
            analysis.created_at.format("%Y-%m-%d %H:%M:%S"),
            count,
        );
    }
    println!();
}

/// Display every cluster of one analysis, one block per cluster.
pub fn display_analysis(analysis: &Analysis, clusters: &[ClusterView]) {
    println!(
        "\n{}",
        format!(
            "=== Analysis {} ({}) ===",
            analysis.id,
            analysis.created_at.format("%Y-%m-%d %H:%M")
        )
        .bold()
    );

    if clusters.is_empty() {
        println!("  {}", "No clusters in this analysis.".dimmed());
        return;
    }

    for view in clusters {
        println!();
        println!(
            "  {} {}",
            format!("[{}]", view.id).cyan(),
            view.title.bold()
        );
        if view.description != view.title {
            println!("      {}", truncate_chars(&view.description, 160).dimmed());
        }
        println!(
            "      {} sources{}",
            view.sources.len(),
            view.media
                .as_deref()
                .map(|m| format!("  |  media: {m}"))
                .unwrap_or_default()
        );
    }
    println!();
}

/// Display one cluster with all of its sources and their distances.
pub fn display_cluster(view: &ClusterView) {
    println!("\n{}", format!("=== Cluster {} ===", view.id).bold());
    println!("  {}", view.title.bold());
    if view.description != view.title {
        println!("  {}", view.description);
    }
    if let Some(media) = &view.media {
        println!("  Media: {}", media.dimmed());
    }

    println!("\n  {} sources (nearest first):", view.sources.len());
    for (i, (document, distance)) in view.sources.iter().enumerate() {
        println!(
            "    {}. [{:.4}] {}",
            i + 1,
            distance,
            truncate_chars(&document.title, 120)
        );
        let published = document.published_at.format("%Y-%m-%d %H:%M");
        match &document.link {
            Some(link) => println!("       {}  {}", published.to_string().dimmed(), link.dimmed()),
            None => println!("       {}", published.to_string().dimmed()),
        }
    }
    println!();
}

/// Display the outcome of an analysis run.
pub fn display_summary(analysis_id: i64, summary: &AnalysisSummary) {
    println!("\n{}", format!("Analysis {analysis_id} stored.").bold());
    println!("  Documents in corpus: {}", summary.documents);
    println!("  Candidates in window: {}", summary.candidates);
    println!("  Vocabulary size: {}", summary.vocabulary);
    if summary.clusters == 0 {
        println!("  Clusters: {}", "none".yellow());
    } else {
        println!(
            "  Clusters: {} ({} documents, {} noise)",
            summary.clusters.to_string().green().bold(),
            summary.clustered,
            summary.noise
        );
    }
}
