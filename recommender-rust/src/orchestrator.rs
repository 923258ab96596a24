use crate::{
    config::{RecommenderConfig, DEFAULT_CALL_TIMEOUT, DEFAULT_SESSION_KEY},
    podcast::{PodchaserClient, PodchaserClientOptions},
    ChatEntry, ContextualResponder, PodcastResult, PodcastSearch, PodcastSearchError,
    RecommenderError, SearchNotice, SearchOutcome, SessionStore, TopicExtractor,
};
use moodcast_llm::{
    google::{GoogleModel, GoogleModelOptions},
    LanguageModel,
};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{debug, info_span, warn};
use tracing_futures::Instrument;

/// The single failure entry shown for any turn that cannot complete.
pub const FAILURE_MESSAGE: &str = "Oops, something went wrong. Please try again.";

/// Suggestions offered before the first message.
pub const EXAMPLE_PROMPTS: [&str; 3] = [
    "I am stressed out, suggest a podcast to relax",
    "I want to learn more about cybersecurity",
    "Relationship advice? 👀",
];

/// Where a turn currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnPhase {
    #[default]
    Idle,
    TopicExtracting,
    Searching,
    Responding,
}

/// The panel shown on narrow screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Panel {
    #[default]
    Chat,
    Results,
}

/// Everything a view needs to render the conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationState {
    pub entries: Vec<ChatEntry>,
    /// Results of the most recent search; replaced wholesale every turn.
    pub podcasts: Vec<PodcastResult>,
    pub draft: String,
    /// True from submission until the turn's terminal entry is appended.
    pub loading: bool,
    pub phase: TurnPhase,
    pub panel: Panel,
}

/// How a call to [`Orchestrator::submit`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The text was blank; nothing changed.
    Ignored,
    /// Another turn is in flight; nothing changed.
    Busy,
    /// An assistant reply was appended.
    Replied,
    /// The failure entry was appended.
    Failed,
}

/// Drives one conversation: topic extraction, directory search, and the
/// contextual reply, in that order, one turn at a time.
pub struct Orchestrator {
    extractor: TopicExtractor,
    search: Arc<dyn PodcastSearch>,
    responder: ContextualResponder,
    session_key: String,
    call_timeout: Option<Duration>,
    narrow_viewport: bool,
    state: watch::Sender<ConversationState>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(params: OrchestratorParams) -> Self {
        let (state, _) = watch::channel(ConversationState::default());
        Self {
            extractor: TopicExtractor::new(params.topic_model),
            search: params.search,
            responder: ContextualResponder::new(params.chat_model, params.sessions),
            session_key: params.session_key,
            call_timeout: params.call_timeout,
            narrow_viewport: params.narrow_viewport,
            state,
        }
    }

    pub fn builder(
        topic_model: Arc<dyn LanguageModel>,
        chat_model: Arc<dyn LanguageModel>,
        search: Arc<dyn PodcastSearch>,
    ) -> OrchestratorParams {
        OrchestratorParams::new(topic_model, chat_model, search)
    }

    /// Wire the Gemini model and the Podchaser client described by `config`.
    #[must_use]
    pub fn from_config(config: &RecommenderConfig) -> Self {
        let model: Arc<dyn LanguageModel> = Arc::new(GoogleModel::new(
            config.model.clone(),
            GoogleModelOptions {
                api_key: config.gemini_api_key.clone(),
                ..Default::default()
            },
        ));
        let search = Arc::new(PodchaserClient::new(PodchaserClientOptions {
            api_token: config.podchaser_api_key.clone(),
            endpoint: config.podchaser_endpoint.clone(),
            client: None,
        }));

        Self::builder(model.clone(), model, search)
            .session_key(config.session_key.clone())
            .call_timeout(config.call_timeout)
            .narrow_viewport(config.narrow_viewport)
            .build()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Observe every state change, including those in the middle of a turn.
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    pub fn responder(&self) -> &ContextualResponder {
        &self.responder
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    /// Replace the draft input. Ignored while a turn is in flight.
    pub fn set_draft(&self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.draft = text;
            true
        })
    }

    /// Put one of [`EXAMPLE_PROMPTS`] into the draft.
    pub fn use_example(&self, index: usize) -> bool {
        EXAMPLE_PROMPTS
            .get(index)
            .is_some_and(|example| self.set_draft(*example))
    }

    pub fn toggle_panel(&self) {
        self.state.send_modify(|state| {
            state.panel = match state.panel {
                Panel::Chat => Panel::Results,
                Panel::Results => Panel::Chat,
            };
        });
    }

    /// Submit the current draft.
    pub async fn submit_draft(&self) -> TurnOutcome {
        let draft = self.state.borrow().draft.clone();
        self.submit(&draft).await
    }

    /// Run one full turn for `text`.
    ///
    /// Blank text and submissions made while another turn is in flight leave
    /// the state untouched. Otherwise exactly one user entry and exactly one
    /// terminal entry (assistant reply or failure) are appended, and `loading`
    /// is cleared together with the terminal entry, even if this future is
    /// dropped before completion.
    pub async fn submit(&self, text: &str) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Ignored;
        }

        let accepted = self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.entries.push(ChatEntry::user(text));
            state.draft.clear();
            state.loading = true;
            state.phase = TurnPhase::TopicExtracting;
            true
        });
        if !accepted {
            debug!("turn already in flight, submission rejected");
            return TurnOutcome::Busy;
        }

        let guard = TurnGuard {
            state: &self.state,
            finished: false,
        };

        let span = info_span!("turn", session = %self.session_key);
        match self.run_turn(text).instrument(span).await {
            Ok(reply) => {
                guard.finish(ChatEntry::assistant(reply), self.narrow_viewport);
                TurnOutcome::Replied
            }
            Err(error) => {
                warn!(%error, "turn failed");
                guard.finish(ChatEntry::system(FAILURE_MESSAGE), false);
                TurnOutcome::Failed
            }
        }
    }

    async fn run_turn(&self, text: &str) -> Result<String, RecommenderError> {
        let term = self
            .bounded("topic extraction", self.extractor.extract(text))
            .await?
            .search_term;
        debug!(term = %term, "topic extracted");

        self.state.send_modify(|state| {
            state
                .entries
                .push(ChatEntry::system(format!("🔎 Finding podcasts about \"{term}\"...")));
            state.phase = TurnPhase::Searching;
        });

        let outcome = self.search_directory(&term).await;

        self.state.send_modify(|state| {
            if let Some(notice) = outcome.notice {
                state.entries.push(ChatEntry::system(notice.message()));
            }
            state.podcasts.clone_from(&outcome.podcasts);
            state.phase = TurnPhase::Responding;
        });

        self.bounded(
            "contextual reply",
            self.responder
                .reply(text, &self.session_key, &outcome.podcasts),
        )
        .await
    }

    async fn search_directory(&self, term: &str) -> SearchOutcome {
        let Some(limit) = self.call_timeout else {
            return self.search.search(term).await;
        };

        if let Ok(outcome) = tokio::time::timeout(limit, self.search.search(term)).await {
            outcome
        } else {
            warn!(error = %PodcastSearchError::Timeout(limit), "directory search abandoned");
            SearchOutcome::empty(SearchNotice::FetchFailed)
        }
    }

    async fn bounded<T>(
        &self,
        step: &'static str,
        future: impl Future<Output = Result<T, RecommenderError>>,
    ) -> Result<T, RecommenderError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, future)
                .await
                .map_err(|_| RecommenderError::Timeout(step, limit))?,
            None => future.await,
        }
    }
}

/// Ends a turn exactly once. Dropping it unfinished (cancellation or panic)
/// records the failure entry.
struct TurnGuard<'a> {
    state: &'a watch::Sender<ConversationState>,
    finished: bool,
}

impl TurnGuard<'_> {
    fn finish(mut self, entry: ChatEntry, show_results: bool) {
        self.finished = true;
        self.state.send_modify(|state| {
            state.entries.push(entry);
            if show_results && !state.podcasts.is_empty() {
                state.panel = Panel::Results;
            }
            state.loading = false;
            state.phase = TurnPhase::Idle;
        });
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!("turn ended before completion");
        self.state.send_modify(|state| {
            state.entries.push(ChatEntry::system(FAILURE_MESSAGE));
            state.loading = false;
            state.phase = TurnPhase::Idle;
        });
    }
}

/// Parameters required to create an [`Orchestrator`].
/// # Default Values
/// - `sessions`: a new, empty [`SessionStore`]
/// - `session_key`: `"default"`
/// - `call_timeout`: 30 seconds
/// - `narrow_viewport`: `false`
pub struct OrchestratorParams {
    /// Model used for single-turn topic extraction.
    pub topic_model: Arc<dyn LanguageModel>,
    /// Model behind the persistent recommendation chat.
    pub chat_model: Arc<dyn LanguageModel>,
    pub search: Arc<dyn PodcastSearch>,
    pub sessions: Arc<SessionStore>,
    pub session_key: String,
    /// Upper bound for each outbound call. `None` waits indefinitely.
    pub call_timeout: Option<Duration>,
    pub narrow_viewport: bool,
}

impl OrchestratorParams {
    pub fn new(
        topic_model: Arc<dyn LanguageModel>,
        chat_model: Arc<dyn LanguageModel>,
        search: Arc<dyn PodcastSearch>,
    ) -> Self {
        Self {
            topic_model,
            chat_model,
            search,
            sessions: Arc::new(SessionStore::new()),
            session_key: DEFAULT_SESSION_KEY.to_string(),
            call_timeout: Some(DEFAULT_CALL_TIMEOUT),
            narrow_viewport: false,
        }
    }

    /// Share an existing session store.
    #[must_use]
    pub fn sessions(mut self, sessions: Arc<SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    #[must_use]
    pub fn session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = session_key.into();
        self
    }

    #[must_use]
    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = Some(call_timeout);
        self
    }

    /// Wait on each call for as long as it takes.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.call_timeout = None;
        self
    }

    #[must_use]
    pub fn narrow_viewport(mut self, narrow_viewport: bool) -> Self {
        self.narrow_viewport = narrow_viewport;
        self
    }

    #[must_use]
    pub fn build(self) -> Orchestrator {
        Orchestrator::new(self)
    }
}
