use crate::{RecommenderError, SearchTerm};
use moodcast_llm::{LanguageModel, LanguageModelInput, Message};
use std::sync::Arc;
use tracing::debug;

const PROVIDER_LABEL: &str = "topic extractor";

/// Instruction for deriving a single podcast topic from a user message.
pub const TOPIC_INSTRUCTION: &str = r#"You are a podcast recommender AI that understands the emotion, context, or curiosity behind a user's message.
Based on their message, return a single word or a very short phrase representing the podcast topic they would want to listen to right now.

Your response should:
- Be specific, not generic. Avoid vague terms like "Heartbreak" if "Toxic Relationship" or "Ghosting" fits better.
- Not be limited to a fixed list. Generate new, relevant, natural-sounding topics when needed.
- Be emotionally or topically intuitive, not keyword-based.
- Reflect the deeper mood, topic, or interest implied in the message.
- Contain only the topic. No explanation, no emojis, no extra text.

Always respond in JSON format {"searchTerm": "<the word or phrase matching the user's mood>"}"#;

/// Turns a free-form utterance into a directory search term.
///
/// Each call is a single-turn request; nothing is remembered between calls.
pub struct TopicExtractor {
    model: Arc<dyn LanguageModel>,
}

impl TopicExtractor {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn extract(&self, utterance: &str) -> Result<SearchTerm, RecommenderError> {
        let response = self
            .model
            .generate(LanguageModelInput {
                system_prompt: Some(TOPIC_INSTRUCTION.to_string()),
                messages: vec![Message::user_text(utterance)],
                ..Default::default()
            })
            .await?;

        let text = response
            .text()
            .ok_or(RecommenderError::EmptyResponse(PROVIDER_LABEL))?;
        debug!(raw = %text, "topic model responded");

        parse_search_term(&text)
    }
}

/// Parse the slice between the first `{` and the last `}` of `text`.
///
/// Surrounding commentary is tolerated. Anything else (no braces, braces in
/// the wrong order, invalid JSON, or a missing `searchTerm`) is an error.
pub fn parse_search_term(text: &str) -> Result<SearchTerm, RecommenderError> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(RecommenderError::TopicParse(format!(
            "no JSON object in {text:?}"
        )));
    };
    if end < start {
        return Err(RecommenderError::TopicParse(format!(
            "no JSON object in {text:?}"
        )));
    }

    serde_json::from_str(&text[start..=end])
        .map_err(|error| RecommenderError::TopicParse(error.to_string()))
}
