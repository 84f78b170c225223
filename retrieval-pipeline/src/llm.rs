use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage, CreateChatCompletionRequestArgs,
    },
    Client,
};
use common::error::AppError;

/// Wraps a chat-completion model used as `L-primary`/`L-fallback` in spec.md
/// §4.6 steps 9-10. Unlike the teacher's `answer_retrieval::create_chat_request`,
/// this issues plain free-text completions — the retrieval algorithm checks
/// the literal `no_context_token` string rather than a JSON-schema answer
/// envelope.
#[derive(Clone)]
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl LlmClient {
    pub fn new(client: Client<OpenAIConfig>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Submits `system_prompt` + `user_message` and returns the first
    /// choice's text content, or `""` if the model produced none (spec.md
    /// §4.6 step 10 treats an empty response as a fallback trigger).
    pub async fn complete(&self, system_prompt: &str, user_message: &str, max_output_tokens: u32) -> Result<String, AppError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .max_tokens(max_output_tokens)
            .messages(vec![
                ChatCompletionRequestSystemMessage::from(system_prompt).into(),
                ChatCompletionRequestUserMessage::from(user_message).into(),
            ])
            .build()
            .map_err(|e| AppError::LlmFailed {
                transient: false,
                message: e.to_string(),
            })?;

        let response = self.client.chat().create(request).await.map_err(|e| AppError::LlmFailed {
            transient: true,
            message: e.to_string(),
        })?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
