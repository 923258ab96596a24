use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Router,
};
use moodcast::{
    PodcastResult, PodcastSearch, PodchaserClient, PodchaserClientOptions, SearchNotice,
    SearchOutcome,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Clone)]
struct FakeDirectory {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<(Option<String>, Value)>>>,
}

impl FakeDirectory {
    fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

async fn graphql(
    State(fake): State<FakeDirectory>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = serde_json::from_str(&body).unwrap_or(Value::Null);
    fake.requests.lock().unwrap().push((auth, body));
    (fake.status, fake.body.clone())
}

async fn client_for(fake: FakeDirectory) -> PodchaserClient {
    let app = Router::new()
        .route("/graphql", post(graphql))
        .with_state(fake);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    PodchaserClient::new(PodchaserClientOptions {
        api_token: "secret-token".to_string(),
        endpoint: Some(format!("http://{addr}/graphql")),
        client: None,
    })
}

#[tokio::test]
async fn search_sends_term_page_size_and_rating_filter() {
    let fake = FakeDirectory::new(
        StatusCode::OK,
        json!({
            "data": { "podcasts": {
                "paginatorInfo": { "currentPage": 1, "hasMorePages": true, "lastPage": 9 },
                "data": [
                    {
                        "id": "101",
                        "title": "The Calm Hour",
                        "description": "Slow talk for fast lives",
                        "webUrl": "https://podcasts.example/calm",
                        "imageUrl": "https://img.example/calm.png"
                    },
                    { "id": "102", "title": "Breathing Room", "description": null, "webUrl": null }
                ]
            } }
        })
        .to_string(),
    );
    let requests = fake.requests.clone();
    let client = client_for(fake).await;

    let outcome = client.search("relaxation").await;

    assert_eq!(
        outcome,
        SearchOutcome {
            podcasts: vec![
                PodcastResult {
                    id: "101".to_string(),
                    title: "The Calm Hour".to_string(),
                    description: Some("Slow talk for fast lives".to_string()),
                    web_url: Some("https://podcasts.example/calm".to_string()),
                    image_url: Some("https://img.example/calm.png".to_string()),
                },
                PodcastResult {
                    id: "102".to_string(),
                    title: "Breathing Room".to_string(),
                    description: None,
                    web_url: None,
                    image_url: None,
                },
            ],
            notice: None,
        }
    );

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (auth, body) = &requests[0];
    assert_eq!(auth.as_deref(), Some("Bearer secret-token"));
    assert_eq!(
        body["variables"],
        json!({ "searchTerm": "relaxation", "first": 4 })
    );
    let query = body["query"].as_str().unwrap();
    assert!(query.contains("minRating: 4, maxRating: 5"));
}

#[tokio::test]
async fn zero_matches_yield_no_results_notice() {
    let client = client_for(FakeDirectory::new(
        StatusCode::OK,
        json!({ "data": { "podcasts": { "data": [] } } }).to_string(),
    ))
    .await;

    assert_eq!(
        client.search("xyzzy").await,
        SearchOutcome::empty(SearchNotice::NoResults)
    );
}

#[tokio::test]
async fn graphql_errors_yield_no_results_notice() {
    let client = client_for(FakeDirectory::new(
        StatusCode::OK,
        json!({ "errors": [{ "message": "Unauthenticated." }], "data": null }).to_string(),
    ))
    .await;

    assert_eq!(
        client.search("history").await,
        SearchOutcome::empty(SearchNotice::NoResults)
    );
}

#[tokio::test]
async fn server_errors_yield_fetch_failed_notice() {
    let client = client_for(FakeDirectory::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "upstream exploded",
    ))
    .await;

    assert_eq!(
        client.search("history").await,
        SearchOutcome::empty(SearchNotice::FetchFailed)
    );
}

#[tokio::test]
async fn malformed_body_yields_fetch_failed_notice() {
    let client = client_for(FakeDirectory::new(StatusCode::OK, "<html>oops</html>")).await;

    assert_eq!(
        client.search("history").await,
        SearchOutcome::empty(SearchNotice::FetchFailed)
    );
}

#[tokio::test]
async fn unreachable_directory_yields_fetch_failed_notice() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = PodchaserClient::new(PodchaserClientOptions {
        api_token: "secret-token".to_string(),
        endpoint: Some(format!("http://{addr}/graphql")),
        client: None,
    });

    assert_eq!(
        client.search("history").await,
        SearchOutcome::empty(SearchNotice::FetchFailed)
    );
}

#[tokio::test]
async fn empty_term_never_reaches_the_directory() {
    let fake = FakeDirectory::new(StatusCode::OK, "{}");
    let requests = fake.requests.clone();
    let client = client_for(fake).await;

    assert_eq!(
        client.search("").await,
        SearchOutcome::empty(SearchNotice::NoResults)
    );
    assert!(requests.lock().unwrap().is_empty());
}
