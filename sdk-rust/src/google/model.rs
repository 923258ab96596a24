use super::api::{
    Content, GenerateContentConfig, GenerateContentParameters, GenerateContentResponse,
    Part as GooglePart, UsageMetadata,
};
use crate::{
    client_utils, LanguageModel, LanguageModelError, LanguageModelInput, LanguageModelResult,
    Message, ModelResponse, ModelUsage, Part,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::collections::HashMap;
use tracing::{debug, info_span};
use tracing_futures::Instrument;

const PROVIDER: &str = "google";

pub struct GoogleModel {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
    headers: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct GoogleModelOptions {
    pub api_key: String,
    pub base_url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl GoogleModel {
    #[must_use]
    pub fn new(model_id: impl Into<String>, options: GoogleModelOptions) -> Self {
        let GoogleModelOptions {
            api_key,
            base_url,
            headers,
            client,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            model_id: model_id.into(),
            api_key,
            base_url,
            client: client.unwrap_or_default(),
            headers: headers.unwrap_or_default(),
        }
    }

    fn request_headers(&self) -> LanguageModelResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        let api_key = HeaderValue::from_str(&self.api_key).map_err(|error| {
            LanguageModelError::InvalidInput(format!("Invalid Google API key: {error}"))
        })?;
        headers.insert("x-goog-api-key", api_key);

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid Google header name '{key}': {error}"
                ))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid Google header value for '{key}': {error}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl LanguageModel for GoogleModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn generate(&self, input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        let span = info_span!(
            "llm.generate",
            provider = PROVIDER,
            model = %self.model_id,
            messages = input.messages.len()
        );

        async move {
            let params = convert_to_generate_content_parameters(input);

            let url = format!("{}/models/{}:generateContent", self.base_url, self.model_id);

            let headers = self.request_headers()?;
            let response: GenerateContentResponse =
                client_utils::send_json(&self.client, &url, &params, headers).await?;

            let response = map_google_response(response)?;
            debug!(usage = ?response.usage, "generate completed");
            Ok::<_, LanguageModelError>(response)
        }
        .instrument(span)
        .await
    }
}

fn convert_to_generate_content_parameters(input: LanguageModelInput) -> GenerateContentParameters {
    let system_instruction = input.system_prompt.map(|system_prompt| Content {
        role: Some("system".to_string()),
        parts: Some(vec![GooglePart {
            text: Some(system_prompt),
            ..Default::default()
        }]),
    });

    let generation_config = input.max_tokens.map(|max_tokens| GenerateContentConfig {
        max_output_tokens: Some(max_tokens),
    });

    GenerateContentParameters {
        contents: input
            .messages
            .into_iter()
            .map(convert_to_google_content)
            .collect(),
        system_instruction,
        generation_config,
    }
}

fn convert_to_google_content(message: Message) -> Content {
    let (role, content) = match message {
        Message::User(user_message) => ("user", user_message.content),
        Message::Assistant(assistant_message) => ("model", assistant_message.content),
    };

    Content {
        role: Some(role.to_string()),
        parts: Some(content.into_iter().map(convert_to_google_part).collect()),
    }
}

fn convert_to_google_part(part: Part) -> GooglePart {
    match part {
        Part::Text(text_part) => GooglePart {
            text: Some(text_part.text),
            ..Default::default()
        },
    }
}

fn map_google_response(response: GenerateContentResponse) -> LanguageModelResult<ModelResponse> {
    let usage = response.usage_metadata.as_ref().map(map_google_usage_metadata);

    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        if let Some(block_reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LanguageModelError::Refusal(format!(
                "Prompt blocked: {block_reason}"
            )));
        }
        return Err(LanguageModelError::Invariant(
            PROVIDER,
            "No candidate in response".to_string(),
        ));
    };

    let content = map_google_content(candidate.content.and_then(|c| c.parts).unwrap_or_default());

    if content.is_empty() && candidate.finish_reason.as_deref() == Some("SAFETY") {
        return Err(LanguageModelError::Refusal(
            "Response blocked for safety reasons".to_string(),
        ));
    }

    Ok(ModelResponse { content, usage })
}

/// Thought parts are internal reasoning and are not surfaced as text.
fn map_google_content(parts: Vec<GooglePart>) -> Vec<Part> {
    parts
        .into_iter()
        .filter(|part| !part.thought.unwrap_or(false))
        .filter_map(|part| part.text.map(Part::text))
        .collect()
}

fn map_google_usage_metadata(usage: &UsageMetadata) -> ModelUsage {
    ModelUsage {
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
    }
}
