use crate::{LanguageModelInput, LanguageModelResult, ModelResponse};

/// A model that turns a conversation into a single response.
///
/// Implementations are stateless with respect to the conversation: callers
/// own the history and resend it on every call.
#[async_trait::async_trait]
pub trait LanguageModel: Send + Sync {
    fn provider(&self) -> &'static str;
    fn model_id(&self) -> String;
    async fn generate(&self, input: LanguageModelInput) -> LanguageModelResult<ModelResponse>;
}
