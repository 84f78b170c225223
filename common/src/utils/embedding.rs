use std::time::Duration;

use async_openai::{config::OpenAIConfig, types::CreateEmbeddingRequestArgs, Client};
use tracing::{debug, warn};

use crate::error::AppError;

const MAX_RETRIES: usize = 3;

/// Wraps a remote embedding model (spec.md §4.3). Batches inputs, honours a
/// requests-per-minute rate limit, and declares its output dimension at
/// construction — every vector it returns has that dimension.
#[derive(Clone)]
pub struct Embedder {
    client: Client<OpenAIConfig>,
    model: String,
    dimensions: u32,
    batch_size: usize,
    rate_limit_per_min: u32,
}

impl Embedder {
    pub fn new(
        client: Client<OpenAIConfig>,
        model: impl Into<String>,
        dimensions: u32,
        batch_size: usize,
        rate_limit_per_min: u32,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
            batch_size: batch_size.max(1),
            rate_limit_per_min: rate_limit_per_min.max(1),
        }
    }

    pub fn dimensions(&self) -> u32 {
        self.dimensions
    }

    /// `embed_query(text) → vector` (spec.md §4.3).
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let vectors = self.embed_documents(&[text.to_string()]).await?;
        vectors.into_iter().next().ok_or_else(|| AppError::EmbedFailed {
            transient: false,
            message: "query text produced no embedding".to_string(),
        })
    }

    /// `embed_documents(texts) → list[vector]` (spec.md §4.3). Empty or
    /// whitespace-only texts are skipped: the returned list omits them
    /// entirely, so callers must zip against the filtered input, not the
    /// original index.
    pub async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AppError> {
        let non_empty: Vec<&str> = texts
            .iter()
            .map(String::as_str)
            .filter(|t| !t.trim().is_empty())
            .collect();

        if non_empty.is_empty() {
            return Ok(Vec::new());
        }

        let delay_between_requests = self.request_spacing();
        let mut out = Vec::with_capacity(non_empty.len());

        for chunk in non_empty.chunks(self.batch_size) {
            let batch = self.embed_batch_with_retries(chunk).await?;
            out.extend(batch);
            if delay_between_requests > Duration::ZERO {
                tokio::time::sleep(delay_between_requests).await;
            }
        }

        Ok(out)
    }

    fn request_spacing(&self) -> Duration {
        Duration::from_millis(60_000 / self.rate_limit_per_min as u64)
    }

    async fn embed_batch_with_retries(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.embed_batch_once(batch).await {
                Ok(vectors) => return Ok(vectors),
                Err(err) if attempt < MAX_RETRIES => {
                    warn!(attempt, error = %err, "embedding batch failed, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * attempt as u64)).await;
                }
                Err(err) => {
                    return Err(AppError::EmbedFailed {
                        transient: true,
                        message: err.to_string(),
                    })
                }
            }
        }
    }

    async fn embed_batch_once(&self, batch: &[&str]) -> Result<Vec<Vec<f32>>, AppError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .dimensions(self.dimensions)
            .input(batch)
            .build()?;

        let response = self.client.embeddings().create(request).await?;

        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();

        for vector in &vectors {
            if vector.len() != self.dimensions as usize {
                return Err(AppError::SchemaDrift {
                    table: "embedder output".to_string(),
                    expected_dim: self.dimensions as usize,
                    found_dim: vector.len(),
                });
            }
        }

        debug!(count = vectors.len(), dimensions = self.dimensions, "embedded batch");

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_spacing_scales_with_rate_limit() {
        let client = Client::with_config(OpenAIConfig::new());
        let embedder = Embedder::new(client, "text-embedding-3-small", 1536, 16, 60);
        assert_eq!(embedder.request_spacing(), Duration::from_millis(1000));
    }
}
