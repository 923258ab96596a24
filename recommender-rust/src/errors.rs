use std::time::Duration;
use thiserror::Error;

/// Errors that end a turn. The orchestrator turns every one of these into the
/// same user-visible failure entry.
#[derive(Debug, Error)]
pub enum RecommenderError {
    #[error("Language model error: {0}")]
    LanguageModel(#[from] moodcast_llm::LanguageModelError),
    /// The topic response did not contain a `{"searchTerm": ...}` object.
    #[error("Could not parse topic from model output: {0}")]
    TopicParse(String),
    /// The model answered without any text.
    #[error("Empty response from {0}")]
    EmptyResponse(&'static str),
    #[error("{0} did not finish within {1:?}")]
    Timeout(&'static str, Duration),
}

/// Failures of the directory search. These never leave the search client;
/// they are reported to the user as a [`SearchNotice`](crate::SearchNotice).
#[derive(Debug, Error)]
pub enum PodcastSearchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
    #[error("Could not decode directory response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("Directory search did not finish within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
