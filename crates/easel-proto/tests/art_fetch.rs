//! Artwork fetcher against a mock search/detail/IIIF server.
//!
//! Run with: cargo test -p easel-proto --test art_fetch

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use easel_proto::art::ArtClient;
use easel_proto::config::ArtConfig;
use easel_proto::error::FetchError;

#[derive(Clone)]
struct MockArt {
    base: String,
    /// Detail requests answered without an image id before a real one.
    missing_first: usize,
    detail_calls: Arc<AtomicUsize>,
    search_calls: Arc<AtomicUsize>,
    pages_requested: Arc<Mutex<Vec<u32>>>,
    search_status: StatusCode,
    search_delay: Duration,
}

impl MockArt {
    fn new(base: &str, missing_first: usize) -> Self {
        Self {
            base: base.to_string(),
            missing_first,
            detail_calls: Arc::new(AtomicUsize::new(0)),
            search_calls: Arc::new(AtomicUsize::new(0)),
            pages_requested: Arc::new(Mutex::new(Vec::new())),
            search_status: StatusCode::OK,
            search_delay: Duration::ZERO,
        }
    }
}

async fn search(
    State(mock): State<MockArt>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    mock.search_calls.fetch_add(1, Ordering::SeqCst);
    if !mock.search_delay.is_zero() {
        tokio::time::sleep(mock.search_delay).await;
    }
    if mock.search_status != StatusCode::OK {
        return (mock.search_status, Json(json!({"error": "boom"})));
    }
    if let Some(page) = params.get("page").and_then(|p| p.parse().ok()) {
        mock.pages_requested.lock().unwrap().push(page);
    }
    let data: Vec<Value> = (1..=3)
        .map(|id| json!({"id": id, "api_link": format!("{}/api/v1/artworks/{}", mock.base, id)}))
        .collect();
    (
        StatusCode::OK,
        Json(json!({
            "pagination": {"total": 6, "total_pages": 2},
            "data": data,
        })),
    )
}

async fn detail(State(mock): State<MockArt>, Path(id): Path<u64>) -> Json<Value> {
    let n = mock.detail_calls.fetch_add(1, Ordering::SeqCst);
    let image_id = if n < mock.missing_first {
        Value::Null
    } else {
        json!("img-1")
    };
    Json(json!({
        "data": {
            "id": id,
            "title": "Nighthawks",
            "artist_title": "Edward Hopper",
            "date_display": "1942",
            "place_of_origin": "United States",
            "artwork_type_title": "Painting",
            "description": "<p>An all-night diner &amp; its patrons.</p>",
            "image_id": image_id,
        }
    }))
}

async fn image(Path((id, _size, _rot, _file)): Path<(String, String, String, String)>) -> Vec<u8> {
    format!("jpeg:{}", id).into_bytes()
}

fn router(mock: MockArt) -> Router {
    Router::new()
        .route("/api/v1/artworks/search", get(search))
        .route("/api/v1/artworks/:id", get(detail))
        .route("/iiif/2/:id/full/:size/:rot/:file", get(image))
        .with_state(mock)
}

fn config(base: &str, max_attempts: u32) -> ArtConfig {
    ArtConfig {
        api_base: format!("{}/api/v1", base),
        iiif_base: format!("{}/iiif/2", base),
        styles: vec!["contemporary".to_string()],
        max_attempts,
        ..ArtConfig::default()
    }
}

#[tokio::test]
async fn fetches_a_random_artwork_with_image() {
    let (listener, base) = common::bind().await;
    let mock = MockArt::new(&base, 0);
    let pages = mock.pages_requested.clone();
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 5));
    let art = client
        .fetch_random(&CancellationToken::new())
        .await
        .expect("artwork");

    assert_eq!(art.title, "Nighthawks");
    assert_eq!(art.artist, "Edward Hopper");
    assert_eq!(art.date_range, "1942");
    assert_eq!(art.origin, "United States");
    assert_eq!(art.kind, "Painting");
    assert_eq!(art.description, "An all-night diner & its patrons.");
    assert_eq!(
        art.image_url.as_deref(),
        Some(format!("{}/iiif/2/img-1/full/843,/0/default.jpg", base).as_str())
    );
    let pages = pages.lock().unwrap().clone();
    assert_eq!(pages.len(), 1);
    assert!((1..=2).contains(&pages[0]));

    let bytes = client
        .fetch_image(art.image_url.as_deref().unwrap(), &CancellationToken::new())
        .await
        .expect("image bytes");
    assert_eq!(bytes, b"jpeg:img-1");
}

#[tokio::test]
async fn retries_silently_when_image_id_is_missing() {
    let (listener, base) = common::bind().await;
    let mock = MockArt::new(&base, 2);
    let detail_calls = mock.detail_calls.clone();
    let search_calls = mock.search_calls.clone();
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 5));
    let art = client
        .fetch_random(&CancellationToken::new())
        .await
        .expect("retry should succeed");

    assert!(art.image_url.unwrap().contains("img-1"));
    assert_eq!(detail_calls.load(Ordering::SeqCst), 3);
    // Each attempt is a full search: page count + page listing.
    assert_eq!(search_calls.load(Ordering::SeqCst), 6);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let (listener, base) = common::bind().await;
    let mock = MockArt::new(&base, usize::MAX);
    let detail_calls = mock.detail_calls.clone();
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 3));
    let err = client
        .fetch_random(&CancellationToken::new())
        .await
        .expect_err("no image ever");

    assert!(matches!(err, FetchError::MissingData(_)), "got {:?}", err);
    assert_eq!(detail_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn surfaces_http_status_errors() {
    let (listener, base) = common::bind().await;
    let mut mock = MockArt::new(&base, 0);
    mock.search_status = StatusCode::INTERNAL_SERVER_ERROR;
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 5));
    let err = client
        .fetch_random(&CancellationToken::new())
        .await
        .expect_err("500 from search");
    assert!(matches!(err, FetchError::Status { status: 500, .. }), "got {:?}", err);
    assert!(!err.is_cancelled());
}

#[tokio::test]
async fn cancellation_aborts_in_flight_search() {
    let (listener, base) = common::bind().await;
    let mut mock = MockArt::new(&base, 0);
    mock.search_delay = Duration::from_secs(30);
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 5));
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let started = Instant::now();
    let err = client.fetch_random(&token).await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn already_cancelled_token_makes_no_requests() {
    let (listener, base) = common::bind().await;
    let mock = MockArt::new(&base, 0);
    let search_calls = mock.search_calls.clone();
    common::serve(listener, router(mock));

    let client = ArtClient::new(common::http(), config(&base, 5));
    let token = CancellationToken::new();
    token.cancel();
    let err = client.fetch_random(&token).await.expect_err("cancelled");
    assert!(err.is_cancelled());
    assert_eq!(search_calls.load(Ordering::SeqCst), 0);
}
