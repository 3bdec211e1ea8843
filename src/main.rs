use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use newscluster::config::Config;
use newscluster::corpus::VectorizeError;
use newscluster::db::Database;
use newscluster::output::{present, terminal};
use newscluster::pipeline::analysis::{self, AnalysisWindow};
use newscluster::text::features::FeatureExtractor;

/// Newscluster: groups related news articles published in the same window.
///
/// Documents are turned into TF-IDF vectors, clustered by density with
/// OPTICS, and each cluster is ranked around its centroid.
#[derive(Parser)]
#[command(name = "newscluster", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database
    Init,

    /// Register a feed source
    AddSource {
        /// Feed URL
        #[arg(long)]
        url: String,

        /// Name shown in listings
        #[arg(long)]
        name: String,
    },

    /// Import feed entries from a JSON file
    Import {
        /// JSON array of feed entries
        #[arg(long)]
        file: PathBuf,

        /// Source the entries belong to
        #[arg(long)]
        source_id: Option<i64>,
    },

    /// Cluster recent documents and store the result
    Analyse {
        /// Minimum density (and cluster size); overrides NEWSCLUSTER_MIN_SAMPLES
        #[arg(long)]
        min_samples: Option<usize>,

        /// Only cluster documents published in the last N hours
        #[arg(long)]
        window_hours: Option<i64>,
    },

    /// List stored analyses
    Analyses,

    /// Show every cluster of an analysis
    Show {
        /// Analysis id (defaults to the latest)
        id: Option<i64>,
    },

    /// Show one cluster with all its sources
    Cluster {
        /// Cluster id
        id: i64,
    },

    /// Show system status (DB stats, document count, last analysis)
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newscluster=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    match cli.command {
        Commands::Init => {
            info!("Initializing newscluster database...");
            let db = newscluster::db::initialize_sqlite(&config.db_path)?;
            let table_count = db.table_count().await?;
            println!("Database initialized at: {}", config.db_path);
            println!("Tables created: {table_count}");
            println!("\nNext: newscluster add-source --url <feed> --name <name>");
        }

        Commands::AddSource { url, name } => {
            let db = open_database(&config)?;
            let id = db.add_source(&url, &name).await?;
            println!("Source {} registered: {} <{}>", id, name.bold(), url);
        }

        Commands::Import { file, source_id } => {
            let db = open_database(&config)?;

            if let Some(id) = source_id {
                let known = db.get_sources().await?.iter().any(|s| s.id == id);
                if !known {
                    anyhow::bail!("Unknown source id {id}. Run `newscluster status` to list sources.");
                }
            }

            let (documents, skipped) = newscluster::ingest::load_entries(&file, Utc::now())?;
            let mut inserted = 0usize;
            let mut duplicates = 0usize;
            for mut document in documents {
                document.source_id = source_id;
                if db.insert_document(&document).await? {
                    inserted += 1;
                } else {
                    duplicates += 1;
                }
            }

            info!(inserted, duplicates, skipped, "Import finished");
            println!("\n{}", "Import complete.".bold());
            println!("  New documents: {inserted}");
            println!("  Already known: {duplicates}");
            if skipped > 0 {
                println!("  {} {} entries without title or id", "Skipped:".yellow(), skipped);
            }
        }

        Commands::Analyse {
            min_samples,
            window_hours,
        } => {
            if let Some(n) = min_samples {
                config.min_samples = n;
            }
            if let Some(h) = window_hours {
                config.window_hours = h;
            }
            config.validate()?;

            let db = open_database(&config)?;
            let extractor = FeatureExtractor::new(config.language.build());
            let clusterer = config.clusterer();
            let window = AnalysisWindow::last_hours(config.window_hours, Utc::now())?;

            println!(
                "Analysing documents from the last {}h ({}, min samples {})...",
                config.window_hours, config.language, config.min_samples
            );

            match analysis::run(&db, &extractor, &clusterer, &window).await {
                Ok((analysis_id, summary)) => terminal::display_summary(analysis_id, &summary),
                Err(e) => {
                    if let Some(VectorizeError::InsufficientData { .. }) =
                        e.downcast_ref::<VectorizeError>()
                    {
                        println!(
                            "{} no analysis stored: {}",
                            "Skipped:".yellow(),
                            e
                        );
                        println!("  Import more documents, then run `newscluster analyse` again.");
                    }
                    return Err(e);
                }
            }
        }

        Commands::Analyses => {
            let db = open_database(&config)?;
            let analyses = db.get_analyses().await?;
            terminal::display_analyses(&analyses);
        }

        Commands::Show { id } => {
            let db = open_database(&config)?;
            let found = match id {
                Some(id) => db.get_analysis(id).await?,
                None => db.get_latest_analysis().await?,
            };
            let Some(analysis) = found else {
                match id {
                    Some(id) => anyhow::bail!("Analysis {id} not found"),
                    None => {
                        println!("No analyses yet. Run `newscluster analyse` first.");
                        return Ok(());
                    }
                }
            };

            let views: Vec<present::ClusterView> = db
                .get_clusters(analysis.id)
                .await?
                .iter()
                .map(present::present)
                .collect();
            terminal::display_analysis(&analysis, &views);
        }

        Commands::Cluster { id } => {
            let db = open_database(&config)?;
            let cluster = db
                .get_cluster(id)
                .await?
                .with_context(|| format!("Cluster {id} not found"))?;
            terminal::display_cluster(&present::present(&cluster));
        }

        Commands::Status => {
            if !newscluster::status::is_initialized(&config.db_path) {
                println!("Database: not initialized");
                println!("\nRun `newscluster init` to set up the database.");
                return Ok(());
            }
            let db = open_database(&config)?;
            newscluster::status::show(&db, &config.db_path).await?;
        }
    }

    Ok(())
}

/// Open the configured database (it must already exist).
fn open_database(config: &Config) -> Result<Arc<dyn Database>> {
    newscluster::db::open_sqlite(&config.db_path)
}
