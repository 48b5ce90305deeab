//! AppState: shared read-only data passed to all components during render/event.
//!
//! The App event-loop is the only thing that writes to AppState.

use std::time::Duration;

use easel_proto::protocol::PoemResult;

use crate::analysis::AnalysisState;
use crate::fetch::ArtworkView;
use crate::narration::NarrationState;

pub struct AppState {
    // ── Refresh timer ─────────────────────────────────────────────────────────
    pub interval: Duration,
    pub countdown: Duration,
    pub paused: bool,
    /// Number of refresh signals emitted so far.
    pub refresh_count: u64,

    // ── Artwork ───────────────────────────────────────────────────────────────
    pub artwork: Option<ArtworkView>,
    pub art_loading: bool,
    pub art_error: Option<String>,

    // ── Poem ──────────────────────────────────────────────────────────────────
    pub poem: Option<PoemResult>,
    pub poem_loading: bool,

    // ── Side features ─────────────────────────────────────────────────────────
    pub analysis: AnalysisState,
    pub narration: NarrationState,

    /// Tail of easel.log, reloaded while the log panel is open.
    pub log_lines: Vec<String>,
}

impl AppState {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            countdown: interval,
            paused: false,
            refresh_count: 0,
            artwork: None,
            art_loading: false,
            art_error: None,
            poem: None,
            poem_loading: false,
            analysis: AnalysisState::Idle,
            narration: NarrationState::default(),
            log_lines: Vec::new(),
        }
    }
}
