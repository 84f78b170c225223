pub mod llm;
pub mod pipeline;
pub mod response;
pub mod scoring;

pub use llm::LlmClient;
pub use pipeline::{context::AnswerContext, answer};
pub use response::{DecisionExplain, Mode, Response, RetrievedChunkMetadata, SourcesUsed, UsedChunk};
