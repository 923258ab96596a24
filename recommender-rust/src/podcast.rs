use crate::{PodcastResult, PodcastSearchError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info_span, warn};
use tracing_futures::Instrument;

/// Number of shows requested per search.
pub const PAGE_SIZE: u32 = 4;
/// Inclusive rating window applied to every search.
pub const MIN_RATING: u8 = 4;
pub const MAX_RATING: u8 = 5;

const DEFAULT_ENDPOINT: &str = "https://api.podchaser.com/graphql";

/// A user-facing note produced when a search yields nothing usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchNotice {
    /// The directory answered but had no matching shows.
    NoResults,
    /// The directory could not be reached or answered with garbage.
    FetchFailed,
}

impl SearchNotice {
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::NoResults => "No podcasts found for this search. Try something else!",
            Self::FetchFailed => {
                "Failed to fetch podcasts. Please check your connection and try again."
            }
        }
    }
}

/// What a search produced. `notice` is set exactly when `podcasts` is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub podcasts: Vec<PodcastResult>,
    pub notice: Option<SearchNotice>,
}

impl SearchOutcome {
    #[must_use]
    pub fn found(podcasts: Vec<PodcastResult>) -> Self {
        if podcasts.is_empty() {
            Self::empty(SearchNotice::NoResults)
        } else {
            Self {
                podcasts,
                notice: None,
            }
        }
    }

    #[must_use]
    pub fn empty(notice: SearchNotice) -> Self {
        Self {
            podcasts: Vec::new(),
            notice: Some(notice),
        }
    }
}

/// A podcast directory. Implementations never fail: problems are folded into
/// the returned [`SearchOutcome`].
#[async_trait::async_trait]
pub trait PodcastSearch: Send + Sync {
    async fn search(&self, term: &str) -> SearchOutcome;
}

#[derive(Clone, Default)]
pub struct PodchaserClientOptions {
    pub api_token: String,
    pub endpoint: Option<String>,
    pub client: Option<Client>,
}

/// Searches the Podchaser GraphQL directory.
pub struct PodchaserClient {
    api_token: String,
    endpoint: String,
    client: Client,
}

impl PodchaserClient {
    #[must_use]
    pub fn new(options: PodchaserClientOptions) -> Self {
        let PodchaserClientOptions {
            api_token,
            endpoint,
            client,
        } = options;

        Self {
            api_token,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            client: client.unwrap_or_default(),
        }
    }

    /// Run the query. `Ok(None)` means the response lacked the
    /// `data.podcasts.data` path.
    async fn query(&self, term: &str) -> Result<Option<Vec<PodcastResult>>, PodcastSearchError> {
        let body = json!({
            "query": search_query(),
            "variables": {
                "searchTerm": term,
                "first": PAGE_SIZE,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PodcastSearchError::StatusCode(
                status,
                response.text().await.unwrap_or_default(),
            ));
        }

        let bytes = response.bytes().await?;
        let response: GraphQlResponse =
            serde_json::from_slice(&bytes).map_err(PodcastSearchError::Decode)?;

        if let Some(errors) = &response.errors {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            warn!(?messages, "directory reported GraphQL errors");
        }

        Ok(response
            .data
            .and_then(|data| data.podcasts)
            .and_then(|podcasts| podcasts.data))
    }
}

#[async_trait::async_trait]
impl PodcastSearch for PodchaserClient {
    async fn search(&self, term: &str) -> SearchOutcome {
        if term.trim().is_empty() {
            debug!("blank search term, skipping directory call");
            return SearchOutcome::empty(SearchNotice::NoResults);
        }

        let span = info_span!("podcast.search", term = %term);
        match self.query(term).instrument(span).await {
            Ok(Some(podcasts)) => {
                debug!(count = podcasts.len(), "directory search completed");
                SearchOutcome::found(podcasts)
            }
            Ok(None) => SearchOutcome::empty(SearchNotice::NoResults),
            Err(error) => {
                warn!(%error, "directory search failed");
                SearchOutcome::empty(SearchNotice::FetchFailed)
            }
        }
    }
}

fn search_query() -> String {
    format!(
        "query SearchPodcasts($searchTerm: String!, $first: Int!) {{
  podcasts(
    searchTerm: $searchTerm,
    first: $first,
    filters: {{ rating: {{ minRating: {MIN_RATING}, maxRating: {MAX_RATING} }} }}
  ) {{
    paginatorInfo {{ currentPage, hasMorePages, lastPage }}
    data {{ id, title, description, webUrl, imageUrl }}
  }}
}}"
    )
}

#[derive(Deserialize)]
struct GraphQlResponse {
    data: Option<SearchData>,
    errors: Option<Vec<GraphQlError>>,
}

#[derive(Deserialize)]
struct SearchData {
    podcasts: Option<PodcastPage>,
}

#[derive(Deserialize)]
struct PodcastPage {
    data: Option<Vec<PodcastResult>>,
}

#[derive(Deserialize)]
struct GraphQlError {
    #[serde(default)]
    message: String,
}
