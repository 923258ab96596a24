#![allow(dead_code)]

use moodcast::{PodcastResult, PodcastSearch, SearchOutcome};
use moodcast_llm::{LanguageModel, LanguageModelInput, LanguageModelResult, ModelResponse};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn podcast(id: &str, title: &str) -> PodcastResult {
    PodcastResult {
        id: id.to_string(),
        title: title.to_string(),
        description: Some(format!("{title} description")),
        web_url: Some(format!("https://podcasts.example/{id}")),
        image_url: None,
    }
}

/// A directory that returns queued outcomes and records every term.
#[derive(Default)]
pub struct FakeSearch {
    outcomes: Mutex<Vec<SearchOutcome>>,
    terms: Mutex<Vec<String>>,
    hang: bool,
}

impl FakeSearch {
    pub fn returning(outcomes: Vec<SearchOutcome>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into_iter().rev().collect()),
            ..Default::default()
        })
    }

    pub fn hanging() -> Arc<Self> {
        Arc::new(Self {
            hang: true,
            ..Default::default()
        })
    }

    pub fn terms(&self) -> Vec<String> {
        self.terms.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl PodcastSearch for FakeSearch {
    async fn search(&self, term: &str) -> SearchOutcome {
        self.terms.lock().unwrap().push(term.to_string());
        if self.hang {
            std::future::pending::<()>().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .expect("no queued search outcome")
    }
}

/// A model that never answers.
pub struct HangingModel;

#[async_trait::async_trait]
impl LanguageModel for HangingModel {
    fn provider(&self) -> &'static str {
        "hanging"
    }

    fn model_id(&self) -> String {
        "hanging-model".to_string()
    }

    async fn generate(&self, _input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        std::future::pending().await
    }
}

/// A model that answers with `result` only after `release` is notified.
pub struct GatedModel {
    pub release: Arc<Notify>,
    result: Mutex<Option<LanguageModelResult<ModelResponse>>>,
}

impl GatedModel {
    pub fn new(result: LanguageModelResult<ModelResponse>) -> Self {
        Self {
            release: Arc::new(Notify::new()),
            result: Mutex::new(Some(result)),
        }
    }
}

#[async_trait::async_trait]
impl LanguageModel for GatedModel {
    fn provider(&self) -> &'static str {
        "gated"
    }

    fn model_id(&self) -> String {
        "gated-model".to_string()
    }

    async fn generate(&self, _input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        self.release.notified().await;
        self.result
            .lock()
            .unwrap()
            .take()
            .expect("gated model called twice")
    }
}
