use std::path::PathBuf;

use clap::Parser;

/// Standalone CLI wrapper around the same golden-query harness the
/// ingestion orchestrator runs at job step 8 (spec.md §4.5), for ad-hoc
/// runs against a view that's already been populated.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Path to a newline-delimited JSON file of golden queries
    /// (`common::eval::GoldenQuery`, one per line)
    #[arg(long)]
    pub golden_queries: PathBuf,

    /// Alias or physical table to search against
    #[arg(long)]
    pub view: String,

    /// Embedding profile to resolve the query embedder from
    #[arg(long, default_value = "default")]
    pub profile: String,

    /// Number of candidates retrieved per query
    #[arg(long, default_value_t = 10)]
    pub top_k: usize,
}
