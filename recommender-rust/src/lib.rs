pub mod config;
mod errors;
mod orchestrator;
mod podcast;
mod responder;
mod topic;
mod types;

pub use config::RecommenderConfig;
pub use errors::{ConfigError, PodcastSearchError, RecommenderError};
pub use orchestrator::{
    ConversationState, Orchestrator, OrchestratorParams, Panel, TurnOutcome, TurnPhase,
    EXAMPLE_PROMPTS, FAILURE_MESSAGE,
};
pub use podcast::{
    PodcastSearch, PodchaserClient, PodchaserClientOptions, SearchNotice, SearchOutcome,
    MAX_RATING, MIN_RATING, PAGE_SIZE,
};
pub use responder::{
    compose_prompt, digest, ChatSession, ContextualResponder, SessionStore, NO_PODCASTS_MARKER,
    RECOMMENDER_INSTRUCTION, REPLY_MAX_TOKENS,
};
pub use topic::{parse_search_term, TopicExtractor, TOPIC_INSTRUCTION};
pub use types::*;
