use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use moodcast_llm::{
    google::{GoogleModel, GoogleModelOptions},
    LanguageModel, LanguageModelError, LanguageModelInput, Message, Part,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct Recorded {
    paths: Vec<String>,
    keys: Vec<String>,
    bodies: Vec<Value>,
}

#[derive(Clone)]
struct FakeGemini {
    status: StatusCode,
    reply: Value,
    recorded: Arc<Mutex<Recorded>>,
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut recorded = fake.recorded.lock().unwrap();
    recorded.paths.push(call);
    recorded.keys.push(
        headers
            .get("x-goog-api-key")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string(),
    );
    recorded.bodies.push(body);
    (fake.status, Json(fake.reply.clone()))
}

async fn serve(fake: FakeGemini) -> String {
    let app = Router::new()
        .route("/v1beta/models/{call}", post(generate_content))
        .with_state(fake);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v1beta")
}

fn model(base_url: String) -> GoogleModel {
    GoogleModel::new(
        "gemini-2.0-flash",
        GoogleModelOptions {
            api_key: "test-key".to_string(),
            base_url: Some(base_url),
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn generate_sends_history_and_reads_text() {
    let recorded = Arc::new(Mutex::new(Recorded::default()));
    let base_url = serve(FakeGemini {
        status: StatusCode::OK,
        reply: json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"searchTerm\": \"grief\"}" }] },
                "finishReason": "STOP"
            }]
        }),
        recorded: recorded.clone(),
    })
    .await;

    let response = model(base_url)
        .generate(LanguageModelInput {
            system_prompt: Some("Return a topic".to_string()),
            messages: vec![Message::user_text("I lost my dog")],
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(
        response.content,
        vec![Part::text("{\"searchTerm\": \"grief\"}")]
    );

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.paths, vec!["gemini-2.0-flash:generateContent"]);
    assert_eq!(recorded.keys, vec!["test-key"]);
    assert_eq!(
        recorded.bodies[0],
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": "I lost my dog" }] }],
            "systemInstruction": { "role": "system", "parts": [{ "text": "Return a topic" }] }
        })
    );
}

#[tokio::test]
async fn generate_surfaces_status_errors() {
    let base_url = serve(FakeGemini {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        reply: json!({ "error": { "message": "backend unavailable" } }),
        recorded: Arc::new(Mutex::new(Recorded::default())),
    })
    .await;

    let error = model(base_url)
        .generate(LanguageModelInput {
            messages: vec![Message::user_text("hello")],
            ..Default::default()
        })
        .await
        .unwrap_err();

    match error {
        LanguageModelError::StatusCode(status, body) => {
            assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.contains("backend unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn generate_fails_on_unreachable_host() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = model(format!("http://{addr}/v1beta"))
        .generate(LanguageModelInput {
            messages: vec![Message::user_text("hello")],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(error, LanguageModelError::Transport(_)));
}

#[tokio::test]
async fn transport_errors_do_not_leak_the_api_key() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let error = model(format!("http://{addr}/v1beta"))
        .generate(LanguageModelInput {
            messages: vec![Message::user_text("hello")],
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(error, LanguageModelError::Transport(_)));
    let message = error.to_string();
    assert!(!message.contains("test-key"), "{message}");
}
