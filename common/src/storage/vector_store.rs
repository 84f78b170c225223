use std::{collections::HashMap, sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, warn};

use crate::{config::retrieval_config::Distance, error::AppError};

use super::{
    db::SurrealDbClient,
    types::chunk::{Chunk, ChunkHit},
};

const EFC: u32 = 100;
const M: u32 = 8;
const EF_SEARCH: u32 = 40;
const MAX_CONFLICT_RETRIES: usize = 3;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpsertResult {
    pub inserted: u64,
    pub skipped: u64,
}

/// Named alias metadata row: the sole reader-visible mutable pointer
/// (spec.md §3 `Alias`). Kept in its own table so `ensure_alias` is a
/// single-row upsert rather than a DDL operation.
#[derive(Debug, Serialize, Deserialize)]
struct AliasRow {
    id: surrealdb::sql::Thing,
    physical_table: String,
}

/// Implements the §4.4 Vector Store contract directly over `SurrealDbClient`
/// using the single-table `(chunk_id, doc_id, text, metadata, embedding,
/// hash_norm)` schema adopted in SPEC_FULL.md §3, reusing the teacher's
/// SurrealQL idioms: HNSW `DEFINE INDEX ... DIMENSION`, the `<|k,ef|>` KNN
/// operator, and `BEGIN/COMMIT TRANSACTION` with retry-on-conflict.
#[derive(Clone)]
pub struct VectorStore {
    db: Arc<SurrealDbClient>,
    alias_locks: Arc<AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

impl VectorStore {
    pub fn new(db: Arc<SurrealDbClient>) -> Self {
        Self {
            db,
            alias_locks: Arc::new(AsyncMutex::new(HashMap::new())),
        }
    }

    /// `ensure_index_table(name, dim, distance)` — idempotent create;
    /// verifies dimension matches an already-defined index and fails with
    /// `schema_drift` otherwise (never silently overwrites — unlike the
    /// teacher's `rebuild_indexes`, which is a redeploy-time operation, this
    /// is called per-job and a mismatch here is a caller bug).
    pub async fn ensure_index_table(
        &self,
        name: &str,
        dim: usize,
        distance: Distance,
    ) -> Result<(), AppError> {
        self.db
            .client
            .query(format!("DEFINE TABLE IF NOT EXISTS {name} SCHEMALESS;"))
            .await
            .map_err(store_failed)?
            .check()
            .map_err(store_failed)?;

        let index_name = format!("idx_embedding_{name}");
        match existing_index_dimension(&self.db, name, &index_name).await? {
            Some(existing) if existing != dim => Err(AppError::SchemaDrift {
                table: name.to_string(),
                expected_dim: dim,
                found_dim: existing,
            }),
            Some(_) => Ok(()),
            None => {
                let dist = match distance {
                    Distance::Cosine => "COSINE",
                    Distance::DotProduct => "EUCLIDEAN",
                };
                let definition = format!(
                    "DEFINE INDEX IF NOT EXISTS {index_name} ON TABLE {name} \
                     FIELDS embedding HNSW DIMENSION {dim} DIST {dist} TYPE F32 EFC {EFC} M {M} CONCURRENTLY;"
                );
                create_index_with_retry(&self.db, &definition, &index_name, name).await
            }
        }
    }

    /// `upsert(table, rows, dedupe_by_hash)` — inserts rows; when
    /// `dedupe_by_hash` is true, rows whose `hash_norm` already exists in
    /// the table are silently skipped.
    pub async fn upsert(
        &self,
        table: &str,
        rows: Vec<Chunk>,
        dedupe_by_hash: bool,
    ) -> Result<UpsertResult, AppError> {
        let mut result = UpsertResult::default();

        for row in rows {
            if dedupe_by_hash && self.hash_exists(table, &row.hash_norm).await? {
                result.skipped += 1;
                continue;
            }
            self.insert_chunk_with_retry(table, &row).await?;
            result.inserted += 1;
        }

        Ok(result)
    }

    async fn hash_exists(&self, table: &str, hash_norm: &str) -> Result<bool, AppError> {
        let mut response = self
            .db
            .client
            .query(format!(
                "SELECT chunk_id FROM {table} WHERE hash_norm = $hash_norm LIMIT 1;"
            ))
            .bind(("hash_norm", hash_norm.to_string()))
            .await
            .map_err(store_failed)?;
        let hit: Option<Value> = response.take(0).map_err(store_failed)?;
        Ok(hit.is_some())
    }

    async fn insert_chunk_with_retry(&self, table: &str, row: &Chunk) -> Result<(), AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let query = format!(
                "BEGIN TRANSACTION; \
                 CREATE {table}:⟨{chunk_id}⟩ CONTENT $content; \
                 COMMIT TRANSACTION;",
                chunk_id = row.chunk_id
            );
            let res = self
                .db
                .client
                .query(query)
                .bind(("content", serde_json::to_value(row).map_err(|e| AppError::StoreFailed {
                    transient: false,
                    message: e.to_string(),
                })?))
                .await
                .map_err(store_failed)?;

            match res.check() {
                Ok(_) => return Ok(()),
                Err(err) if attempt < MAX_CONFLICT_RETRIES && is_retryable_conflict(&err) => {
                    warn!(attempt, chunk_id = %row.chunk_id, "retrying chunk insert after conflict");
                    tokio::time::sleep(Duration::from_millis(50 * attempt as u64)).await;
                    continue;
                }
                Err(err) => {
                    return Err(AppError::StoreFailed {
                        transient: is_retryable_conflict(&err),
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    /// `ensure_alias(alias_name, physical_table)` — atomically repoints the
    /// alias. At most one rotation per alias name is in flight at a time
    /// (per-alias `tokio::sync::Mutex`, SPEC_FULL.md §14 decision #3); the
    /// repoint itself is a single `UPSERT`, serialized by the database, so
    /// readers never observe a torn target.
    pub async fn ensure_alias(&self, alias_name: &str, physical_table: &str) -> Result<(), AppError> {
        let lock = self.alias_lock(alias_name).await;
        let _guard = lock.lock().await;

        let res = self
            .db
            .client
            .query(format!(
                "UPSERT vector_alias:⟨{alias_name}⟩ SET physical_table = $physical_table;"
            ))
            .bind(("physical_table", physical_table.to_string()))
            .await
            .map_err(store_failed)?;

        res.check().map_err(store_failed)?;
        info!(alias = alias_name, target = physical_table, "alias rotated");
        Ok(())
    }

    async fn alias_lock(&self, alias_name: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.alias_locks.lock().await;
        locks
            .entry(alias_name.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Resolves `view_name` through the alias table; if no alias row
    /// exists, treats `view_name` as a physical table name directly (used
    /// by the golden-query evaluator, which reads the just-written
    /// physical table before any alias points at it — spec.md §4.5 step 8).
    async fn resolve_table(&self, view_name: &str) -> Result<String, AppError> {
        let mut response = self
            .db
            .client
            .query(format!("SELECT physical_table FROM vector_alias:⟨{view_name}⟩;"))
            .await
            .map_err(store_failed)?;
        let row: Option<AliasRow> = response.take(0).map_err(store_failed)?;
        Ok(row.map(|r| r.physical_table).unwrap_or_else(|| view_name.to_string()))
    }

    /// `similarity_search(view_name, query_vector, k)` — top-k rows via the
    /// HNSW KNN operator, read exactly from the resolved view/physical
    /// table.
    pub async fn similarity_search(
        &self,
        view_name: &str,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<ChunkHit>, AppError> {
        let table = self.resolve_table(view_name).await?;

        let mut response = self
            .db
            .client
            .query(format!(
                "SELECT *, vector::distance::knn() AS raw_score FROM {table} \
                 WHERE embedding <|{k},{EF_SEARCH}|> $qv;"
            ))
            .bind(("qv", query_vector.to_vec()))
            .await
            .map_err(store_failed)?;

        let hits: Vec<ChunkHit> = response.take(0).map_err(store_failed)?;
        Ok(hits)
    }

    /// `count(table)` — admin.
    pub async fn count(&self, table: &str) -> Result<u64, AppError> {
        #[derive(Deserialize)]
        struct CountRow {
            count: u64,
        }
        let mut response = self
            .db
            .client
            .query(format!("SELECT count() FROM {table} GROUP ALL;"))
            .await
            .map_err(store_failed)?;
        let row: Option<CountRow> = response.take(0).map_err(store_failed)?;
        Ok(row.map(|r| r.count).unwrap_or(0))
    }

    /// `drop(table)` — admin.
    pub async fn drop(&self, table: &str) -> Result<(), AppError> {
        self.db
            .client
            .query(format!("REMOVE TABLE IF EXISTS {table};"))
            .await
            .map_err(store_failed)?
            .check()
            .map_err(store_failed)?;
        Ok(())
    }
}

fn store_failed(err: surrealdb::Error) -> AppError {
    AppError::StoreFailed {
        transient: is_retryable_conflict(&err),
        message: err.to_string(),
    }
}

fn is_retryable_conflict(err: &surrealdb::Error) -> bool {
    err.to_string().contains("read or write conflict")
}

async fn existing_index_dimension(
    db: &SurrealDbClient,
    table: &str,
    index_name: &str,
) -> Result<Option<usize>, AppError> {
    let mut response = db
        .client
        .query(format!("INFO FOR TABLE {table};"))
        .await
        .map_err(store_failed)?;
    let info: Option<Value> = response.take(0).map_err(store_failed)?;
    let Some(info) = info else { return Ok(None) };

    let Some(definition) = info
        .get("indexes")
        .and_then(|i| i.get(index_name))
        .and_then(|v| v.as_str())
    else {
        return Ok(None);
    };

    Ok(extract_dimension(definition))
}

fn extract_dimension(definition: &str) -> Option<usize> {
    definition
        .split("DIMENSION")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|token| token.parse::<usize>().ok())
}

async fn create_index_with_retry(
    db: &SurrealDbClient,
    definition: &str,
    index_name: &str,
    table: &str,
) -> Result<(), AppError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let res = db.client.query(definition).await.map_err(store_failed)?;
        match res.check() {
            Ok(_) => return Ok(()),
            Err(err) if attempt < MAX_CONFLICT_RETRIES && is_retryable_conflict(&err) => {
                warn!(index = index_name, table, attempt, "retrying index definition after conflict");
                tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                continue;
            }
            Err(err) => return Err(store_failed(err)),
        }
    }
}
