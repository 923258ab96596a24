use crate::{PodcastResult, RecommenderError};
use futures::lock::Mutex;
use moodcast_llm::{LanguageModel, LanguageModelInput, Message, Part};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};
use tracing::debug;

const PROVIDER_LABEL: &str = "contextual responder";

/// Upper bound on the length of each recommendation reply.
pub const REPLY_MAX_TOKENS: u32 = 1000;

/// Marker used in the digest when the search produced nothing.
pub const NO_PODCASTS_MARKER: &str = "No podcasts available";

const MISSING_FIELD: &str = "Not available";

/// Instruction for the recommendation conversation.
pub const RECOMMENDER_INSTRUCTION: &str = r#"You are a friendly podcast recommendation assistant. Your job is to:

1. Understand the user's mood and interests based on their message
2. Recommend relevant podcasts from the provided list
3. Engage in natural conversation about the topics
4. Provide brief insights about why each podcast might interest them

When mentioning podcasts, always include:
- The title (as a link if a URL is available)
- A brief description
- Why it might interest the user

If the user's message is not clear, ask for clarification. If you don't understand the user's intent, say so, for example:
- I'm not sure what you mean by "<message>"
- I'm sorry, I didn't understand. Could you please rephrase?
- Please ask me questions related to podcast recommendations only

Format podcast recommendations clearly with proper spacing."#;

/// A persistent conversation with the chat model.
///
/// The session owns its history and replays it on every call, so later turns
/// see earlier ones without the caller passing anything back in.
pub struct ChatSession {
    model: Arc<dyn LanguageModel>,
    history: Mutex<Vec<Message>>,
}

impl ChatSession {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Send `prompt` as the next user turn and return the model's text.
    /// History only grows when the call succeeds.
    pub async fn send(&self, prompt: String) -> Result<String, RecommenderError> {
        let mut history = self.history.lock().await;

        let user_message = Message::user_text(prompt);
        let mut messages = history.clone();
        messages.push(user_message.clone());

        let response = self
            .model
            .generate(LanguageModelInput {
                system_prompt: Some(RECOMMENDER_INSTRUCTION.to_string()),
                messages,
                max_tokens: Some(REPLY_MAX_TOKENS),
                ..Default::default()
            })
            .await?;

        let text = response
            .text()
            .ok_or(RecommenderError::EmptyResponse(PROVIDER_LABEL))?;

        history.push(user_message);
        history.push(Message::assistant(vec![Part::text(text.clone())]));
        debug!(turns = history.len() / 2, "chat session advanced");

        Ok(text)
    }

    /// A copy of the messages exchanged so far, oldest first.
    pub async fn history(&self) -> Vec<Message> {
        self.history.lock().await.clone()
    }
}

/// Session key → chat session. Entries are created on first use and kept for
/// the lifetime of the store.
#[derive(Default)]
pub struct SessionStore {
    sessions: StdMutex<HashMap<String, Arc<ChatSession>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `key`, created with `create` if absent.
    pub fn get_or_create(
        &self,
        key: &str,
        create: impl FnOnce() -> ChatSession,
    ) -> Arc<ChatSession> {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(key.to_string())
            .or_insert_with(|| {
                debug!(session = key, "creating chat session");
                Arc::new(create())
            })
            .clone()
    }

    pub fn get(&self, key: &str) -> Option<Arc<ChatSession>> {
        let sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Replies to the user in the context of the podcasts found this turn.
pub struct ContextualResponder {
    model: Arc<dyn LanguageModel>,
    sessions: Arc<SessionStore>,
}

impl ContextualResponder {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel>, sessions: Arc<SessionStore>) -> Self {
        Self { model, sessions }
    }

    /// The chat session for `session_key`, created lazily.
    pub fn session(&self, session_key: &str) -> Arc<ChatSession> {
        self.sessions
            .get_or_create(session_key, || ChatSession::new(self.model.clone()))
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub async fn reply(
        &self,
        utterance: &str,
        session_key: &str,
        results: &[PodcastResult],
    ) -> Result<String, RecommenderError> {
        let session = self.session(session_key);
        session.send(compose_prompt(utterance, results)).await
    }
}

/// The prompt sent to the chat session for one turn.
#[must_use]
pub fn compose_prompt(utterance: &str, results: &[PodcastResult]) -> String {
    format!(
        "User message: {utterance}\n\nAvailable podcasts from API according to user's mood:\n{}",
        digest(results)
    )
}

/// Textual summary of `results`, one `Title/Description/URL` block per show.
#[must_use]
pub fn digest(results: &[PodcastResult]) -> String {
    if results.is_empty() {
        return NO_PODCASTS_MARKER.to_string();
    }

    results
        .iter()
        .map(|podcast| {
            format!(
                "Title: {}\nDescription: {}\nURL: {}",
                podcast.title,
                podcast.description.as_deref().unwrap_or(MISSING_FIELD),
                podcast.web_url.as_deref().unwrap_or(MISSING_FIELD),
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
