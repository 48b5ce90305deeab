//! Reading the poem (or its analysis) aloud.
//!
//! Long poems are reformatted by the speech formatter service and spoken by
//! the local synthesiser. Short poems are reformatted for, and rendered by,
//! the voice-synthesis service and the resulting clip is played through the
//! audio sink. Only one narration exists at a time: starting one stops the
//! previous playback and cancels any preparation still in flight.
//!
//! ```text
//!   Idle ──start──▶ Loading ──prepared──▶ Playing ──ended──▶ Idle
//!                      │                     │
//!                      └──failed──▶ Idle ◀───┴──stop
//! ```

use std::io::Write;

use base64::Engine as _;
use tempfile::TempPath;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use easel_proto::config::SpeechConfig;
use easel_proto::error::{FetchError, FetchResult};
use easel_proto::inflight::RequestSlot;
use easel_proto::protocol::{PoemPayload, PoemResult};
use easel_proto::services::{FormatTarget, ServiceClient};
use easel_proto::text::truncate_to_words;

use crate::app::AppMessage;
use crate::speech::{select_voice, unsupported, AudioSink, SpeechEngine, VoiceParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NarrationTarget {
    Poem,
    Analysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrationPhase {
    #[default]
    Idle,
    Loading,
    Playing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NarrationState {
    pub phase: NarrationPhase,
    /// What is being read; `None` while idle.
    pub target: Option<NarrationTarget>,
}

impl NarrationState {
    fn start(target: NarrationTarget) -> Self {
        Self {
            phase: NarrationPhase::Loading,
            target: Some(target),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == NarrationPhase::Idle
    }

    pub fn label(&self) -> Option<&'static str> {
        match (self.phase, self.target) {
            (NarrationPhase::Loading, Some(NarrationTarget::Poem)) => Some("preparing poem…"),
            (NarrationPhase::Loading, Some(NarrationTarget::Analysis)) => Some("preparing analysis…"),
            (NarrationPhase::Playing, Some(NarrationTarget::Poem)) => Some("reading poem"),
            (NarrationPhase::Playing, Some(NarrationTarget::Analysis)) => Some("reading analysis"),
            _ => None,
        }
    }
}

/// How a poem is voiced, decided by its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Reformat, then speak with the local synthesiser.
    LocalVoice,
    /// Reformat, synthesize remotely, play the returned clip.
    SyntheticVoice,
}

/// Poems strictly longer than `long_poem_words` use the local voice.
pub fn choose_strategy(word_count: usize, long_poem_words: usize) -> Strategy {
    if word_count > long_poem_words {
        Strategy::LocalVoice
    } else {
        Strategy::SyntheticVoice
    }
}

/// Output of the preparation step, ready to play.
#[derive(Debug)]
pub enum Prepared {
    Speech(String),
    Clip(TempPath),
}

pub struct Narrator {
    engine: Option<Box<dyn SpeechEngine>>,
    sink: Option<Box<dyn AudioSink>>,
    services: ServiceClient,
    config: SpeechConfig,
    slot: RequestSlot,
    /// Temp file backing the clip being played; deleted on drop.
    clip: Option<TempPath>,
}

impl Narrator {
    pub fn new(
        engine: Option<Box<dyn SpeechEngine>>,
        sink: Option<Box<dyn AudioSink>>,
        services: ServiceClient,
        config: SpeechConfig,
    ) -> Self {
        Self {
            engine,
            sink,
            services,
            config,
            slot: RequestSlot::new(),
            clip: None,
        }
    }

    /// Start preparing `poem` for playback. The prepared result comes back
    /// as `AppMessage::Narration` and must be handed to `complete`.
    pub fn speak_poem(
        &mut self,
        state: &mut NarrationState,
        poem: &PoemResult,
        tx: &mpsc::Sender<AppMessage>,
    ) -> FetchResult<()> {
        self.stop(state);
        let strategy = choose_strategy(poem.word_count(), self.config.long_poem_words);
        match strategy {
            Strategy::LocalVoice if self.engine.is_none() => return Err(unsupported("a speech synthesiser")),
            Strategy::SyntheticVoice if self.sink.is_none() => return Err(unsupported("mpv")),
            _ => {}
        }

        let ticket = self.slot.begin();
        *state = NarrationState::start(NarrationTarget::Poem);
        info!(
            "[narration] {:?} for {:?} ({} words)",
            strategy,
            poem.title,
            poem.word_count()
        );

        let services = self.services.clone();
        let word_limit = self.config.word_limit;
        let (title, author, text) = (poem.title.clone(), poem.author.clone(), poem.text());
        let tx = tx.clone();
        tokio::spawn(async move {
            let result = prepare_poem(
                &services,
                strategy,
                &title,
                &author,
                &text,
                word_limit,
                &ticket.token,
            )
            .await;
            let _ = tx.send(AppMessage::Narration(ticket.generation, result)).await;
        });
        Ok(())
    }

    /// Speak already-available text (the analysis) with the local voice.
    pub fn speak_text(
        &mut self,
        state: &mut NarrationState,
        target: NarrationTarget,
        text: &str,
    ) -> FetchResult<()> {
        self.stop(state);
        if self.engine.is_none() {
            return Err(unsupported("a speech synthesiser"));
        }
        let ticket = self.slot.begin();
        *state = NarrationState::start(target);
        self.complete(state, ticket.generation, Ok(Prepared::Speech(text.to_string())))
    }

    /// True while `generation` is the preparation in flight.
    pub fn is_current(&self, generation: u64) -> bool {
        self.slot.is_current(generation)
    }

    /// Deliver a preparation result. Results from superseded or stopped
    /// narrations are dropped without touching `state`.
    pub fn complete(
        &mut self,
        state: &mut NarrationState,
        generation: u64,
        result: FetchResult<Prepared>,
    ) -> FetchResult<()> {
        if !self.slot.finish(generation) {
            debug!("[narration] dropping stale result #{}", generation);
            return Ok(());
        }
        let played = result.and_then(|prepared| self.play(state, prepared));
        match played {
            Ok(()) => {
                state.phase = NarrationPhase::Playing;
                Ok(())
            }
            Err(e) => {
                *state = NarrationState::default();
                Err(e)
            }
        }
    }

    fn play(&mut self, state: &NarrationState, prepared: Prepared) -> FetchResult<()> {
        match prepared {
            Prepared::Speech(text) => {
                let params = self.voice_params(state.target.unwrap_or(NarrationTarget::Poem));
                let engine = self
                    .engine
                    .as_mut()
                    .ok_or_else(|| unsupported("a speech synthesiser"))?;
                engine.speak(&text, &params)
            }
            Prepared::Clip(path) => {
                let sink = self.sink.as_mut().ok_or_else(|| unsupported("mpv"))?;
                sink.play_file(&path)?;
                self.clip = Some(path);
                Ok(())
            }
        }
    }

    /// Detect the natural end of playback. Returns true when `state` changed.
    pub fn poll(&mut self, state: &mut NarrationState) -> bool {
        if state.phase != NarrationPhase::Playing {
            return false;
        }
        let speaking = self.engine.as_mut().is_some_and(|e| e.is_speaking());
        let playing = self.sink.as_mut().is_some_and(|s| s.is_playing());
        if speaking || playing {
            return false;
        }
        debug!("[narration] playback finished");
        self.clip = None;
        *state = NarrationState::default();
        true
    }

    /// Stop playback and cancel preparation. Idempotent.
    pub fn stop(&mut self, state: &mut NarrationState) {
        self.slot.cancel();
        if let Some(engine) = self.engine.as_mut() {
            engine.cancel();
        }
        if let Some(sink) = self.sink.as_mut() {
            sink.stop();
        }
        self.clip = None;
        *state = NarrationState::default();
    }

    pub fn voice_params(&self, target: NarrationTarget) -> VoiceParams {
        let voice = self
            .engine
            .as_ref()
            .and_then(|e| select_voice(e.voices(), &self.config.preferred_voice))
            .cloned();
        let (rate, pitch) = match target {
            NarrationTarget::Poem => (0.9, 1.1),
            NarrationTarget::Analysis => (1.1, 1.0),
        };
        VoiceParams {
            voice,
            rate,
            pitch,
            volume: 1.0,
        }
    }
}

/// Truncate, reformat and (for short poems) synthesize.
pub async fn prepare_poem(
    services: &ServiceClient,
    strategy: Strategy,
    title: &str,
    author: &str,
    text: &str,
    word_limit: usize,
    cancel: &CancellationToken,
) -> FetchResult<Prepared> {
    let truncated = truncate_to_words(text, word_limit);
    let payload = PoemPayload {
        title,
        author,
        text: &truncated,
    };
    match strategy {
        Strategy::LocalVoice => {
            let formatted = services
                .format_for_speech(FormatTarget::LocalVoice, &payload, cancel)
                .await?;
            Ok(Prepared::Speech(formatted))
        }
        Strategy::SyntheticVoice => {
            let formatted = services
                .format_for_speech(FormatTarget::SyntheticVoice, &payload, cancel)
                .await?;
            let formatted = truncate_to_words(&formatted, word_limit);
            let audio = services
                .synthesize(
                    &PoemPayload {
                        title,
                        author,
                        text: &formatted,
                    },
                    cancel,
                )
                .await?;
            let bytes = decode_audio(&audio)?;
            Ok(Prepared::Clip(write_clip(&bytes)?))
        }
    }
}

pub fn decode_audio(audio_base64: &str) -> FetchResult<Vec<u8>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(audio_base64.trim())
        .map_err(|e| FetchError::Decode(format!("audio: {}", e)))?;
    if bytes.is_empty() {
        return Err(FetchError::MissingData("voice service returned empty audio".into()));
    }
    Ok(bytes)
}

fn write_clip(bytes: &[u8]) -> FetchResult<TempPath> {
    let mut file = tempfile::Builder::new()
        .prefix("easel-voice-")
        .suffix(".mp3")
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file.into_temp_path())
}
