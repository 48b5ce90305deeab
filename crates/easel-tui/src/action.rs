//! Action enum: all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Header,
    ArtPanel,
    PoemPanel,
    AnalysisPanel,
    LogPanel,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // ── Refresh timer ────────────────────────────────────────────────────────
    /// A refresh signal was emitted: start a new artwork and poem fetch.
    /// Timer expiry and the manual trigger both arrive here.
    Refresh,
    /// Emit a refresh signal now and restart the countdown.
    RefreshNow,
    TogglePause,

    // ── Narration ────────────────────────────────────────────────────────────
    SpeakPoem,
    SpeakAnalysis,
    StopPlayback,

    // ── Analysis ─────────────────────────────────────────────────────────────
    Analyze,

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Clipboard ────────────────────────────────────────────────────────────
    CopyAuthorSearch,
    CopyImageUrl,
    CopyToClipboard(String),

    // ── UI toggles ───────────────────────────────────────────────────────────
    DismissError,
    ToggleLogs,
    ToggleHelp,
    ToggleKeys,

    // ── System ───────────────────────────────────────────────────────────────
    Quit,
}
