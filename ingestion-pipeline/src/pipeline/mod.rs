mod config;
pub mod context;
mod state;

pub use config::{IngestionConfig, IngestionTuning};

use std::sync::Arc;

use chrono::Utc;
use common::{
    eval::{summarize, GoldenQuery},
    error::AppError,
    storage::{
        db::SurrealDbClient,
        store::StorageManager,
        types::{
            chunk::Chunk,
            job::{Job, JobStatus},
            upload_record::UploadRecord,
        },
        vector_store::VectorStore,
    },
    utils::{config::AppConfig, embedding::Embedder},
};
use sanitizer::Sanitizer;
use tracing::{info, instrument};

use crate::{cleaning, loaders, manifest::ResolvedDocument};
use context::JobContext;
use state::ready;

/// Drives one `Job` through spec.md §4.5's ten steps: manifest expansion,
/// document loading, cleaning, sanitization, chunking, embedding, upsert,
/// evaluation, alias rotation, progress reporting. Named after the teacher's
/// `IngestionPipeline`, scoped to jobs instead of single-document tasks.
pub struct JobOrchestrator {
    db: Arc<SurrealDbClient>,
    vector_store: VectorStore,
    embedder_for: Arc<dyn Fn(&common::config::profile::Profile) -> Embedder + Send + Sync>,
    sanitizer: Sanitizer,
    storage: Arc<StorageManager>,
    config: Arc<AppConfig>,
    tuning: IngestionConfig,
}

impl JobOrchestrator {
    pub fn new(
        db: Arc<SurrealDbClient>,
        storage: Arc<StorageManager>,
        config: Arc<AppConfig>,
        embedder_for: Arc<dyn Fn(&common::config::profile::Profile) -> Embedder + Send + Sync>,
    ) -> Self {
        Self {
            vector_store: VectorStore::new(Arc::clone(&db)),
            db,
            embedder_for,
            sanitizer: Sanitizer::new(),
            storage,
            config,
            tuning: IngestionConfig::default(),
        }
    }

    pub fn with_tuning(mut self, tuning: IngestionConfig) -> Self {
        self.tuning = tuning;
        self
    }

    /// Runs one claimed job end to end. The job is already `running` in the
    /// database (claimed by the worker loop); this marks it `SUCCEEDED` or
    /// `FAILED` and returns `Ok(())` in both cases — only a failure to even
    /// persist that terminal state propagates as `Err`.
    #[instrument(skip_all, fields(job_id = %job.id, profile = %job.profile))]
    pub async fn run(&self, job: Job) -> Result<(), AppError> {
        let profile = self.config.profile(&job.profile)?.clone();
        let embedder = (self.embedder_for)(&profile);

        let mut ctx = JobContext::new(
            job,
            Arc::clone(&self.db),
            self.vector_store.clone(),
            embedder,
            self.sanitizer.clone(),
            Arc::clone(&self.storage),
            Arc::clone(&self.config),
            self.tuning.tuning.logs_tail_lines,
        );

        match self.drive(&mut ctx, &profile).await {
            Ok(()) => Ok(()),
            Err(err) => ctx.fail(&err).await,
        }
    }

    async fn drive(&self, ctx: &mut JobContext, profile: &common::config::profile::Profile) -> Result<(), AppError> {
        let machine = ready();

        // Step 1: manifest expansion.
        let documents = self.expand(ctx).await?;
        ctx.job.progress.files_total = documents.len() as u32;
        ctx.log(format!("expanded {} document(s)", documents.len()));
        ctx.checkpoint().await?;
        let machine = machine.expand_manifest();

        // Steps 2-6: load, clean, sanitize, chunk, embed — one document at a time.
        let mut all_chunks: Vec<Chunk> = Vec::new();
        for doc in &documents {
            let chunks = self.process_document(ctx, profile, doc).await?;
            ctx.job.progress.files_processed += 1;
            ctx.job.progress.chunks_total += chunks.len() as u64;
            ctx.log(format!("{}: produced {} chunk(s)", doc.doc_id, chunks.len()));
            ctx.checkpoint().await?;
            all_chunks.extend(chunks);
        }

        // Step 7: upsert.
        let physical_table = format!("{}_v{}", profile.index_name, Utc::now().timestamp());
        ctx.vector_store
            .ensure_index_table(&physical_table, profile.embedding_dimensions, profile.distance)
            .await?;
        let upsert_result = ctx
            .vector_store
            .upsert(&physical_table, all_chunks, profile.dedupe_by_hash)
            .await?;
        ctx.job.progress.chunks_indexed += upsert_result.inserted;
        ctx.job.progress.dedupe_skipped += upsert_result.skipped;
        ctx.log(format!(
            "upserted into {physical_table}: {} inserted, {} skipped",
            upsert_result.inserted, upsert_result.skipped
        ));
        ctx.checkpoint().await?;
        let machine = machine.process_and_upsert();

        // Step 8: evaluation (optional).
        let eval_gate_passed = if ctx.job.options.evaluate {
            let (summary, gate_passed) = self.evaluate(ctx, profile, &physical_table).await?;
            ctx.job.summary.hit_rate = Some(summary.hit_rate);
            ctx.job.summary.mrr = Some(summary.mrr);
            ctx.job.summary.phrase_hit_rate = Some(summary.phrase_hit_rate);
            ctx.checkpoint().await?;
            gate_passed
        } else {
            true
        };
        let machine = machine.evaluate();

        // Step 9: alias rotation (optional, gated).
        if ctx.job.options.update_alias {
            if upsert_result.inserted > 0 && eval_gate_passed {
                let (index_name, alias_name) = self.target_names(ctx, profile)?;
                let _ = index_name;
                ctx.vector_store.ensure_alias(&alias_name, &physical_table).await?;
                ctx.log(format!("alias {alias_name} now points at {physical_table}"));
            } else {
                ctx.job.summary.promotion_blocked = true;
                ctx.log("alias rotation skipped: promotion blocked".to_string());
            }
        }
        let _machine = machine.finalize();

        // Step 10: finalize.
        ctx.job.status = JobStatus::Succeeded;
        ctx.job.finished_at = Some(Utc::now());
        ctx.checkpoint().await?;
        info!(job_id = %ctx.job.id, "job succeeded");
        Ok(())
    }

    /// Resolves the target alias for rotation: the job's `domain_key`
    /// override when set, else the profile's own `alias_name`.
    fn target_names(
        &self,
        ctx: &JobContext,
        profile: &common::config::profile::Profile,
    ) -> Result<(String, String), AppError> {
        match &ctx.job.options.domain_key {
            Some(key) => {
                let domain = ctx.config.domain(key)?;
                Ok((domain.index_name.clone(), domain.alias_name.clone()))
            }
            None => Ok((profile.index_name.clone(), profile.alias_name.clone())),
        }
    }

    /// Step 1: builds one manifest entry per uploaded file (job creation
    /// binds a job to `upload_ids`, not an on-disk manifest path — the
    /// JSON-lines manifest format in spec.md §6.3 is for the bulk/offline
    /// ingestion entry point instead) and resolves each to a local path.
    async fn expand(&self, ctx: &JobContext) -> Result<Vec<ResolvedDocument>, AppError> {
        let mut out = Vec::with_capacity(ctx.job.upload_ids.len());
        for upload_id in &ctx.job.upload_ids {
            let upload: UploadRecord = ctx
                .db
                .get_item(upload_id)
                .await
                .map_err(AppError::Database)?
                .ok_or_else(|| AppError::NotFound(format!("upload {upload_id}")))?;

            let path = ctx
                .storage
                .resolve_local_path(&upload.storage_path)
                .ok_or_else(|| {
                    AppError::InvariantViolated(format!(
                        "upload {upload_id} storage path is not resolvable to a local file"
                    ))
                })?;

            out.push(ResolvedDocument {
                doc_id: upload_id.clone(),
                path,
                profile: Some(ctx.job.profile.clone()),
                tags: ctx.job.options.tags.clone(),
                lang: ctx.job.options.lang_hint.clone(),
                priority: ctx.job.options.priority,
                metadata: serde_json::json!({}),
            });
        }
        Ok(out)
    }

    /// Steps 2-6 for a single document: load, clean, sanitize, chunk,
    /// embed. Returns chunks ready for upsert (with populated `embedding`).
    async fn process_document(
        &self,
        ctx: &mut JobContext,
        profile: &common::config::profile::Profile,
        doc: &ResolvedDocument,
    ) -> Result<Vec<Chunk>, AppError> {
        let mut loaded = loaders::load(&doc.doc_id, &doc.path).await?;

        let mut total_redactions = 0u32;
        for item in &mut loaded.items {
            let cleaned = cleaning::clean(&item.text);
            let outcome = ctx
                .sanitizer
                .sanitize(
                    &cleaned,
                    &doc.doc_id,
                    &ctx.config.sanitiser.config_dir,
                    &ctx.config.sanitiser.profile,
                    ctx.config.sanitiser.mode,
                    &ctx.config.sanitiser.hash_salt,
                    matches!(
                        ctx.config.sanitiser.placeholder_mode,
                        common::utils::config::PlaceholderMode::Pseudonym
                    ),
                    ctx.config.sanitiser.audit_enabled,
                    &ctx.config.sanitiser.audit_path,
                )
                .await?;
            total_redactions += outcome.total_redactions();
            item.text = outcome.processed_text;
        }
        if total_redactions > 0 {
            ctx.log(format!("{}: sanitized {total_redactions} match(es)", doc.doc_id));
        }

        let mut chunks = chunker::chunk(&doc.doc_id, &loaded.items, profile)?;
        for chunk in &mut chunks {
            chunk.metadata.tags = doc.tags.clone();
            chunk.metadata.lang = doc.lang.clone();
            chunk.metadata.priority = doc.priority;
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = ctx.embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::InvariantViolated(format!(
                "{}: embedder returned {} vectors for {} chunks",
                doc.doc_id,
                embeddings.len(),
                chunks.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        Ok(chunks)
    }

    /// Step 8: runs the profile's golden-query set (if configured) against
    /// the just-written physical table name, never the alias. Returns the
    /// aggregate summary and whether the configured gate (if any) passed.
    async fn evaluate(
        &self,
        ctx: &JobContext,
        profile: &common::config::profile::Profile,
        physical_table: &str,
    ) -> Result<(common::eval::EvalSummary, bool), AppError> {
        let Some(path) = &profile.eval_queries_path else {
            return Ok((common::eval::EvalSummary::default(), true));
        };

        let contents = tokio::fs::read_to_string(path).await.map_err(AppError::Io)?;
        let queries: Vec<GoldenQuery> = contents
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|l| {
                serde_json::from_str(l)
                    .map_err(|e| AppError::BadRequest(format!("invalid golden query line: {e}")))
            })
            .collect::<Result<_, _>>()?;

        let mut results = Vec::with_capacity(queries.len());
        for query in &queries {
            let vector = ctx.embedder.embed_query(&query.question).await?;
            let hits = ctx
                .vector_store
                .similarity_search(physical_table, &vector, 10)
                .await?;
            results.push(hits);
        }

        let summary = summarize(&queries, &results);
        let gate_passed = match profile.eval_min_hit_rate {
            Some(min) => summary.hit_rate >= min,
            None => true,
        };
        Ok((summary, gate_passed))
    }
}
