//! Text services against mock serverless endpoints.

mod common;

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use easel_proto::config::ServicesConfig;
use easel_proto::error::FetchError;
use easel_proto::protocol::PoemPayload;
use easel_proto::services::{FormatTarget, ServiceClient};

type Bodies = Arc<Mutex<Vec<(String, Value)>>>;

async fn format_local(State(bodies): State<Bodies>, Json(body): Json<Value>) -> Json<Value> {
    bodies.lock().unwrap().push(("format".into(), body.clone()));
    let lines = body["lines"].as_str().unwrap_or_default().to_string();
    Json(json!({"result": format!("local: {}", lines)}))
}

async fn format_voice(State(bodies): State<Bodies>, Json(body): Json<Value>) -> Json<Value> {
    bodies.lock().unwrap().push(("voice_format".into(), body));
    Json(json!({"result": "voice-ready text"}))
}

async fn voice(State(bodies): State<Bodies>, Json(body): Json<Value>) -> Json<Value> {
    bodies.lock().unwrap().push(("voice".into(), body));
    Json(json!({"audioBase64": "SUQzBAAAAAAA"}))
}

async fn analysis(State(bodies): State<Bodies>, Json(body): Json<Value>) -> Json<Value> {
    bodies.lock().unwrap().push(("analysis".into(), body));
    Json(json!({"result": "A meditation on ruin and pride."}))
}

async fn empty_result() -> Json<Value> {
    Json(json!({"result": ""}))
}

async fn bad_gateway() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "upstream down")
}

async fn start() -> (String, Bodies) {
    let bodies: Bodies = Arc::default();
    let (listener, base) = common::bind().await;
    let router = Router::new()
        .route("/format", post(format_local))
        .route("/voice-format", post(format_voice))
        .route("/voice", post(voice))
        .route("/analysis", post(analysis))
        .route("/empty", post(empty_result))
        .route("/down", post(bad_gateway))
        .with_state(bodies.clone());
    common::serve(listener, router);
    (base, bodies)
}

fn config(base: &str) -> ServicesConfig {
    ServicesConfig {
        format_url: format!("{}/format", base),
        voice_format_url: format!("{}/voice-format", base),
        voice_url: format!("{}/voice", base),
        analysis_url: format!("{}/analysis", base),
        timeout_secs: 5,
    }
}

fn payload() -> PoemPayload<'static> {
    PoemPayload {
        title: "Ozymandias",
        author: "Percy Bysshe Shelley",
        text: "I met a traveller from an antique land",
    }
}

#[tokio::test]
async fn posts_title_poet_lines_body() {
    let (base, bodies) = start().await;
    let client = ServiceClient::new(common::http(), config(&base));

    let text = client
        .format_for_speech(FormatTarget::LocalVoice, &payload(), &CancellationToken::new())
        .await
        .expect("formatted");
    assert_eq!(text, "local: I met a traveller from an antique land");

    let bodies = bodies.lock().unwrap();
    let (route, body) = &bodies[0];
    assert_eq!(route, "format");
    assert_eq!(body["title"], "Ozymandias");
    assert_eq!(body["poet"], "Percy Bysshe Shelley");
    assert_eq!(body["lines"], "I met a traveller from an antique land");
}

#[tokio::test]
async fn each_target_uses_its_own_endpoint() {
    let (base, bodies) = start().await;
    let client = ServiceClient::new(common::http(), config(&base));
    let cancel = CancellationToken::new();

    let voice_text = client
        .format_for_speech(FormatTarget::SyntheticVoice, &payload(), &cancel)
        .await
        .expect("formatted");
    assert_eq!(voice_text, "voice-ready text");

    let audio = client.synthesize(&payload(), &cancel).await.expect("audio");
    assert_eq!(audio, "SUQzBAAAAAAA");

    let analysis = client.analyze(&payload(), &cancel).await.expect("analysis");
    assert_eq!(analysis, "A meditation on ruin and pride.");

    let routes: Vec<String> = bodies.lock().unwrap().iter().map(|(r, _)| r.clone()).collect();
    assert_eq!(routes, vec!["voice_format", "voice", "analysis"]);
}

#[tokio::test]
async fn empty_result_is_missing_data() {
    let (base, _) = start().await;
    let mut cfg = config(&base);
    cfg.analysis_url = format!("{}/empty", base);
    let client = ServiceClient::new(common::http(), cfg);

    let err = client
        .analyze(&payload(), &CancellationToken::new())
        .await
        .expect_err("empty");
    assert!(matches!(err, FetchError::MissingData(_)), "got {:?}", err);
}

#[tokio::test]
async fn upstream_failure_reports_status() {
    let (base, _) = start().await;
    let mut cfg = config(&base);
    cfg.voice_url = format!("{}/down", base);
    let client = ServiceClient::new(common::http(), cfg);

    let err = client
        .synthesize(&payload(), &CancellationToken::new())
        .await
        .expect_err("502");
    assert!(matches!(err, FetchError::Status { status: 502, .. }), "got {:?}", err);
}

#[tokio::test]
async fn cancelled_before_send() {
    let (base, bodies) = start().await;
    let client = ServiceClient::new(common::http(), config(&base));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = client.analyze(&payload(), &cancel).await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert!(bodies.lock().unwrap().is_empty());
}
