mod action;
mod analysis;
mod app;
mod app_state;
mod component;
mod components;
mod fetch;
mod focus;
mod narration;
mod picture;
mod speech;
mod theme;
mod widgets;

use easel_proto::config::Config;

use crate::speech::{AudioSink, MpvAudioSink, ProcessSpeechEngine, SpeechEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = easel_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("easel.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("easel log: {}", log_path.display());

    tracing::info!("easel starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("config {}: {} (using defaults)", Config::config_path().display(), e);
        Config::default()
    });

    // ── Local playback capabilities ──────────────────────────────────────────
    let engine = ProcessSpeechEngine::detect().map(|e| Box::new(e) as Box<dyn SpeechEngine>);
    let sink = MpvAudioSink::detect().map(|s| Box::new(s) as Box<dyn AudioSink>);
    if engine.is_none() {
        tracing::warn!("no speech synthesiser found (espeak-ng, espeak or say)");
    }
    if sink.is_none() {
        tracing::warn!("mpv not found; synthesised voice playback disabled");
    }

    let http = easel_proto::http_client()?;
    let app = app::App::new(&config, http, engine, sink, log_path);
    app.run().await?;

    tracing::info!("easel exited");
    Ok(())
}
