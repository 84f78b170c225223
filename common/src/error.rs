use async_openai::error::OpenAIError;
use thiserror::Error;
use tokio::task::JoinError;

/// Internal, typed error surface. Every failure is classified into one of
/// these variants before it crosses a service boundary. Ambient upstream
/// errors (`surrealdb`, the OpenAI SDK, I/O, `anyhow`) convert in via
/// `#[from]`; the domain taxonomy below (spec.md §7 / SPEC_FULL.md §11) is
/// what job failure codes and `api_router::ApiError` match against.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),
    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),
    #[error("Task join error: {0}")]
    Join(#[from] JoinError),
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("DOM smoothie error: {0}")]
    DomSmoothie(#[from] dom_smoothie::ReadabilityError),
    #[error("invalid pattern: {0}")]
    Regex(#[from] regex::Error),
    #[error("LLM parsing error: {0}")]
    LLMParsing(String),

    // --- closed domain taxonomy (spec.md §7 / SPEC_FULL.md §11) ---
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("unsupported mime type: {0}")]
    UnsupportedMime(String),
    #[error("payload exceeds maximum size of {limit_bytes} bytes")]
    TooLarge { limit_bytes: u64 },
    #[error("empty payload")]
    EmptyPayload,
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
    #[error("unknown domain: {0}")]
    UnknownDomain(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("schema drift on {table}: expected dimension {expected_dim}, found {found_dim}")]
    SchemaDrift {
        table: String,
        expected_dim: usize,
        found_dim: usize,
    },
    #[error("embedding failed: {message}")]
    EmbedFailed { transient: bool, message: String },
    #[error("llm call failed: {message}")]
    LlmFailed { transient: bool, message: String },
    #[error("store operation failed: {message}")]
    StoreFailed { transient: bool, message: String },
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

impl AppError {
    /// Whether retrying the same operation might succeed. Drives the
    /// ingestion orchestrator's retry/backoff (§4.5) and `store_failed`/
    /// `embed_failed`/`llm_failed`'s transient flag at the call site.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::EmbedFailed { transient, .. }
            | AppError::LlmFailed { transient, .. }
            | AppError::StoreFailed { transient, .. } => *transient,
            AppError::Database(_) | AppError::Join(_) | AppError::Reqwest(_) => true,
            _ => false,
        }
    }

    /// Job failure code vocabulary named in spec.md §4.5 ("any fatal
    /// per-step error marks the job FAILED with an error code").
    pub fn job_error_code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "upload_missing",
            AppError::UnknownProfile(_) => "unknown_profile",
            AppError::SchemaDrift { .. } => "schema_drift",
            AppError::EmbedFailed { .. } => "embed_failed",
            AppError::StoreFailed { .. } => "upsert_failed",
            AppError::Conflict(_) => "alias_failed",
            AppError::LlmFailed { .. } => "eval_failed",
            _ => "invariant_violated",
        }
    }
}
