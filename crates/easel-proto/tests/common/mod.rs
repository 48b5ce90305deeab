//! Local mock endpoints for the HTTP client tests.

#![allow(dead_code)]

use axum::Router;
use tokio::net::TcpListener;

/// Bind an ephemeral port first so handlers can embed their own base URL.
pub async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server addr");
    (listener, format!("http://{}", addr))
}

pub fn serve(listener: TcpListener, router: Router) {
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            eprintln!("mock server error: {}", e);
        }
    });
}

pub fn http() -> reqwest::Client {
    easel_proto::http_client().expect("http client")
}
