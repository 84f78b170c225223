mod args;

use std::{fs, sync::Arc};

use anyhow::Context;
use clap::Parser;
use common::{
    eval::{summarize, GoldenQuery},
    storage::{db::SurrealDbClient, vector_store::VectorStore},
    utils::{config::get_config, embedding::Embedder},
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .ok();

    let args = args::Config::parse();
    let config = get_config().context("loading configuration")?;
    let profile = config
        .profile(&args.profile)
        .map_err(|err| anyhow::anyhow!(err))
        .with_context(|| format!("resolving profile '{}'", args.profile))?;

    let db = Arc::new(
        SurrealDbClient::new(
            &config.surrealdb_address,
            &config.surrealdb_username,
            &config.surrealdb_password,
            &config.surrealdb_namespace,
            &config.surrealdb_database,
        )
        .await?,
    );
    let vector_store = VectorStore::new(db);

    let openai_client = async_openai::Client::with_config(
        async_openai::config::OpenAIConfig::new()
            .with_api_key(&config.openai_api_key)
            .with_api_base(&config.openai_base_url),
    );
    let embedder = Embedder::new(
        openai_client,
        profile.embedding_model.clone(),
        profile.embedding_dimensions as u32,
        profile.batching.batch_size,
        profile.batching.rate_limit_per_min,
    );

    let contents = fs::read_to_string(&args.golden_queries)
        .with_context(|| format!("reading {}", args.golden_queries.display()))?;
    let queries: Vec<GoldenQuery> = contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).context("parsing golden query line"))
        .collect::<anyhow::Result<_>>()?;

    info!(
        view = %args.view,
        queries = queries.len(),
        top_k = args.top_k,
        "running golden-query evaluation"
    );

    let mut results = Vec::with_capacity(queries.len());
    for query in &queries {
        let vector = embedder.embed_query(&query.question).await?;
        let hits = vector_store
            .similarity_search(&args.view, &vector, args.top_k)
            .await?;
        results.push(hits);
    }

    let summary = summarize(&queries, &results);
    println!(
        "hit_rate={:.3} mrr={:.3} phrase_hit_rate={:.3} (n={})",
        summary.hit_rate,
        summary.mrr,
        summary.phrase_hit_rate,
        queries.len()
    );

    Ok(())
}
