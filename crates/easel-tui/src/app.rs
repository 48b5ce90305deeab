//! App: the event loop. Owns all mutable UI state, spawns the fetch and
//! narration tasks, and routes their results back through one channel.

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use easel_proto::config::Config;
use easel_proto::error::{FetchError, FetchResult};
use easel_proto::poems::encode_segment;
use easel_proto::protocol::PoemResult;
use easel_proto::schedule::RefreshScheduler;
use easel_proto::services::ServiceClient;

use crate::{
    action::{Action, ComponentId},
    analysis::Analyst,
    app_state::AppState,
    component::Component,
    components::{
        analysis_panel::AnalysisPanel, art_panel::ArtPanel, header::Header,
        help_overlay::HelpOverlay, log_panel::LogPanel, poem_panel::PoemPanel,
    },
    fetch::{ArtworkView, Refresher},
    focus::FocusRing,
    narration::{NarrationTarget, Narrator, Prepared},
    picture,
    speech::{AudioSink, SpeechEngine},
    widgets::{status_bar, toast::ToastManager},
};

/// Everything the event loop reacts to.
pub(crate) enum AppMessage {
    Event(Event),
    Artwork(u64, FetchResult<ArtworkView>),
    Poem(u64, FetchResult<PoemResult>),
    Narration(u64, FetchResult<Prepared>),
    Analysis(u64, FetchResult<String>),
}

const NARRATION_SPINNER: &str = "narration";
const ANALYSIS_SPINNER: &str = "analysis";

// ── Panels ────────────────────────────────────────────────────────────────────

struct Panels {
    header: Header,
    art: ArtPanel,
    poem: PoemPanel,
    analysis: AnalysisPanel,
    log: LogPanel,
    help: HelpOverlay,
}

impl Panels {
    fn new() -> Self {
        Self {
            header: Header::new(),
            art: ArtPanel::new(),
            poem: PoemPanel::new(),
            analysis: AnalysisPanel::new(),
            log: LogPanel::new(),
            help: HelpOverlay::new(),
        }
    }

    fn get_mut(&mut self, id: ComponentId) -> &mut dyn Component {
        match id {
            ComponentId::Header => &mut self.header,
            ComponentId::ArtPanel => &mut self.art,
            ComponentId::PoemPanel => &mut self.poem,
            ComponentId::AnalysisPanel => &mut self.analysis,
            ComponentId::LogPanel => &mut self.log,
            ComponentId::HelpOverlay => &mut self.help,
        }
    }

    fn all_mut(&mut self) -> [&mut dyn Component; 6] {
        [
            &mut self.header,
            &mut self.art,
            &mut self.poem,
            &mut self.analysis,
            &mut self.log,
            &mut self.help,
        ]
    }
}

/// Last drawn rects of the mouse-addressable panes.
#[derive(Default, Clone, Copy)]
struct PaneAreas {
    art: Rect,
    poem: Rect,
    analysis: Rect,
    log: Rect,
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    state: AppState,
    panels: Panels,
    focus: FocusRing,
    toast: ToastManager,
    pane_areas: PaneAreas,

    scheduler: RefreshScheduler,
    countdown_tick: Duration,
    refresher: Refresher,
    narrator: Narrator,
    analyst: Analyst,
    tx: Option<mpsc::Sender<AppMessage>>,

    log_path: PathBuf,
    show_logs: bool,
    show_keys: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        http: reqwest::Client,
        engine: Option<Box<dyn SpeechEngine>>,
        sink: Option<Box<dyn AudioSink>>,
        log_path: PathBuf,
    ) -> Self {
        let interval = config.refresh.interval();
        let services = ServiceClient::new(http.clone(), config.services.clone());
        Self {
            state: AppState::new(interval),
            panels: Panels::new(),
            focus: FocusRing::new(vec![
                ComponentId::ArtPanel,
                ComponentId::PoemPanel,
                ComponentId::AnalysisPanel,
            ]),
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            scheduler: RefreshScheduler::new(interval, Instant::now()),
            countdown_tick: config.refresh.countdown_tick(),
            refresher: Refresher::new(http, config),
            narrator: Narrator::new(engine, sink, services.clone(), config.speech.clone()),
            analyst: Analyst::new(services, config.speech.analysis_word_limit),
            tx: None,
            log_path,
            show_logs: false,
            show_keys: true,
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());
        self.panels.art.set_picker(picture::query_picker());

        let (tx, mut rx) = mpsc::channel::<AppMessage>(1024);
        self.tx = Some(tx.clone());

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = tx.clone();
        // Must exit once the loop drops its receiver, hence poll over read.
        tokio::task::spawn_blocking(move || loop {
            if event_tx.is_closed() {
                break;
            }
            match event::poll(Duration::from_millis(250)) {
                Ok(true) => match event::read() {
                    Ok(ev) => {
                        if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                },
                Ok(false) => {}
                Err(_) => break,
            }
        });

        // First artwork and poem on start-up.
        let signal = self.scheduler.start(Instant::now());
        info!("[refresh] initial refresh (#{})", signal);
        self.dispatch(Action::Refresh);

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut countdown_tick = tokio::time::interval(self.countdown_tick);
        countdown_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // easel.log tail refresh: every 2s, only when log panel is open
        let mut log_refresh = tokio::time::interval(Duration::from_secs(2));
        log_refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg);
                    while let Ok(next) = rx.try_recv() {
                        needs_redraw |= self.handle_message(next);
                    }
                }

                _ = countdown_tick.tick() => {
                    needs_redraw = self.on_countdown_tick();
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }

                _ = log_refresh.tick() => {
                    if self.show_logs {
                        self.reload_log();
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.shutdown();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    /// Drive the scheduler, the countdown display and playback end detection.
    fn on_countdown_tick(&mut self) -> bool {
        let now = Instant::now();
        if let Some(signal) = self.scheduler.poll(now) {
            info!("[refresh] timer fired (#{})", signal);
            self.dispatch(Action::Refresh);
        }
        let countdown = self.scheduler.remaining(now);
        let changed = countdown.as_secs() != self.state.countdown.as_secs();
        self.state.countdown = countdown;
        self.state.paused = self.scheduler.is_paused();
        self.narrator.poll(&mut self.state.narration) || changed
    }

    fn shutdown(&mut self) {
        info!("shutting down: cancelling requests and stopping playback");
        self.refresher.cancel_all();
        self.narrator.stop(&mut self.state.narration);
        self.analyst.reset(&mut self.state.analysis);
    }

    // ── Message handling ──────────────────────────────────────────────────────

    /// Returns true when the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    return false;
                }
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                for action in self.handle_mouse(mouse) {
                    self.dispatch(action);
                }
                true
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,

            AppMessage::Artwork(generation, result) => {
                if !self.refresher.accept_artwork(generation) {
                    debug!("[art] dropping stale result #{}", generation);
                    return false;
                }
                self.state.art_loading = false;
                match result {
                    Ok(view) => {
                        info!(
                            "[art] showing #{} {:?} ({})",
                            view.artwork.id, view.artwork.title, view.artwork.style
                        );
                        self.state.art_error = None;
                        self.state.artwork = Some(view);
                    }
                    Err(e) if e.is_cancelled() => {}
                    Err(e) => {
                        warn!("[art] fetch failed: {}", e);
                        self.toast.error(format!("artwork: {}", e));
                        self.state.art_error = Some(e.to_string());
                    }
                }
                true
            }

            AppMessage::Poem(generation, result) => {
                if !self.refresher.accept_poem(generation) {
                    debug!("[poem] dropping stale result #{}", generation);
                    return false;
                }
                self.state.poem_loading = false;
                match result {
                    Ok(poem) => {
                        info!("[poem] showing {:?} by {}", poem.title, poem.author);
                        self.on_poem_changed();
                        self.state.poem = Some(poem);
                    }
                    Err(e) if e.is_cancelled() => {}
                    // The previous poem stays on screen.
                    Err(e) => warn!("[poem] fetch failed: {}", e),
                }
                true
            }

            AppMessage::Narration(generation, result) => {
                if self.narrator.is_current(generation) {
                    self.toast.dismiss_spinner(NARRATION_SPINNER);
                }
                let done = self
                    .narrator
                    .complete(&mut self.state.narration, generation, result);
                self.report("narration", done);
                true
            }

            AppMessage::Analysis(generation, result) => {
                if self.analyst.is_current(generation) {
                    self.toast.dismiss_spinner(ANALYSIS_SPINNER);
                }
                let done = self
                    .analyst
                    .complete(&mut self.state.analysis, generation, result);
                self.report("analysis", done);
                true
            }
        }
    }

    /// The displayed poem is about to be replaced. Its analysis and any
    /// narration of it or its analysis no longer apply.
    fn on_poem_changed(&mut self) {
        self.analyst.reset(&mut self.state.analysis);
        self.toast.dismiss_spinner(ANALYSIS_SPINNER);
        if !self.state.narration.is_idle() {
            self.narrator.stop(&mut self.state.narration);
            self.toast.dismiss_spinner(NARRATION_SPINNER);
        }
    }

    /// Surface a side-feature failure as a toast. Cancellation is silent.
    fn report(&mut self, what: &str, result: FetchResult<()>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e @ FetchError::Unsupported(_)) => {
                warn!("[{}] {}", what, e);
                self.toast.warning(format!("{}: {}", what, e));
            }
            Err(e) => {
                error!("[{}] failed: {}", what, e);
                self.toast.error(format!("{} failed: {}", what, e));
            }
        }
    }

    // ── Input ─────────────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        // Global keys, active regardless of focus
        match key.code {
            KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => {
                return vec![Action::Quit];
            }
            KeyCode::Char('c') if key.modifiers == KeyModifiers::CONTROL => {
                return vec![Action::Quit];
            }
            KeyCode::Char('?') => return vec![Action::ToggleHelp],
            KeyCode::Char('L') => return vec![Action::ToggleLogs],
            _ => {}
        }

        // Help overlay captures all keys when visible
        if self.panels.help.visible {
            return self.panels.help.handle_key(key, &self.state);
        }

        match key.code {
            KeyCode::Tab => return vec![Action::FocusNext],
            KeyCode::BackTab => return vec![Action::FocusPrev],
            KeyCode::Char('r') => return vec![Action::RefreshNow],
            KeyCode::Char(' ') => return vec![Action::TogglePause],
            KeyCode::Char('s') => return vec![Action::SpeakPoem],
            KeyCode::Char('a') => return vec![Action::Analyze],
            KeyCode::Char('v') => return vec![Action::SpeakAnalysis],
            KeyCode::Char('x') => return vec![Action::StopPlayback],
            KeyCode::Char('g') => return vec![Action::CopyAuthorSearch],
            KeyCode::Char('y') => return vec![Action::CopyImageUrl],
            KeyCode::Char('K') => return vec![Action::ToggleKeys],
            KeyCode::Char('1') => return vec![Action::FocusPane(ComponentId::ArtPanel)],
            KeyCode::Char('2') => return vec![Action::FocusPane(ComponentId::PoemPanel)],
            KeyCode::Char('3') => return vec![Action::FocusPane(ComponentId::AnalysisPanel)],
            KeyCode::Char('4') if self.show_logs => {
                return vec![Action::FocusPane(ComponentId::LogPanel)]
            }
            KeyCode::Esc if self.state.art_error.is_some() => return vec![Action::DismissError],
            _ => {}
        }

        match self.focus.current() {
            Some(id) => self.panels.get_mut(id).handle_key(key, &self.state),
            None => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_) | MouseEventKind::ScrollUp | MouseEventKind::ScrollDown
        );
        if !is_click || self.panels.help.visible {
            return vec![];
        }

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let target = [
            (ComponentId::ArtPanel, areas.art),
            (ComponentId::PoemPanel, areas.poem),
            (ComponentId::AnalysisPanel, areas.analysis),
            (ComponentId::LogPanel, areas.log),
        ]
        .into_iter()
        .find(|(_, r)| hit(*r, event.column, event.row));

        let Some((id, area)) = target else {
            return vec![];
        };
        let mut actions = self.panels.get_mut(id).handle_mouse(event, area, &self.state);
        // Focus follows the click
        if !self.focus.is_focused(id) {
            actions.insert(0, Action::FocusPane(id));
        }
        actions
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Components see the action first
        let secondary: Vec<Action> = {
            let s = &self.state;
            self.panels
                .all_mut()
                .into_iter()
                .flat_map(|c| c.on_action(&action, s))
                .collect()
        };

        self.apply_action(action);

        // Secondary actions are applied one level deep
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        debug!("apply_action: {:?}", action);
        match action {
            Action::Refresh => self.begin_refresh(),
            Action::RefreshNow => {
                let now = Instant::now();
                let signal = self.scheduler.trigger_now(now);
                self.state.countdown = self.scheduler.remaining(now);
                info!("[refresh] manual refresh (#{})", signal);
                self.dispatch(Action::Refresh);
            }
            Action::TogglePause => {
                let now = Instant::now();
                let paused = self.scheduler.toggle_pause(now);
                self.state.paused = paused;
                self.state.countdown = self.scheduler.remaining(now);
                info!("[refresh] timer {}", if paused { "paused" } else { "resumed" });
                self.toast
                    .info(if paused { "timer paused" } else { "timer resumed" });
            }

            Action::SpeakPoem => {
                let (Some(poem), Some(tx)) = (self.state.poem.as_ref(), self.tx.as_ref()) else {
                    self.toast.info("no poem to read yet");
                    return;
                };
                let started = self.narrator.speak_poem(&mut self.state.narration, poem, tx);
                if started.is_ok() {
                    self.toast.spinner(NARRATION_SPINNER, "preparing poem…");
                }
                self.report("narration", started);
            }
            Action::SpeakAnalysis => {
                let Some(text) = self.state.analysis.text() else {
                    self.toast.info("no analysis yet, press a first");
                    return;
                };
                let started =
                    self.narrator
                        .speak_text(&mut self.state.narration, NarrationTarget::Analysis, text);
                self.toast.dismiss_spinner(NARRATION_SPINNER);
                self.report("narration", started);
            }
            Action::StopPlayback => {
                self.narrator.stop(&mut self.state.narration);
                self.toast.dismiss_spinner(NARRATION_SPINNER);
            }
            Action::Analyze => {
                let (Some(poem), Some(tx)) = (self.state.poem.as_ref(), self.tx.as_ref()) else {
                    self.toast.info("no poem to analyse yet");
                    return;
                };
                if self.analyst.request(&mut self.state.analysis, poem, tx) {
                    self.toast.spinner(ANALYSIS_SPINNER, "analysing poem…");
                }
            }

            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),

            Action::CopyAuthorSearch => {
                if let Some(poem) = &self.state.poem {
                    let url = author_search_url(&poem.author);
                    self.apply_action(Action::CopyToClipboard(url));
                } else {
                    self.toast.info("no poem yet");
                }
            }
            Action::CopyImageUrl => {
                let url = self
                    .state
                    .artwork
                    .as_ref()
                    .and_then(|v| v.artwork.image_url.clone());
                match url {
                    Some(url) => self.apply_action(Action::CopyToClipboard(url)),
                    None => self.toast.info("no image url"),
                }
            }
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        let preview = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text
                        };
                        self.toast.success(format!("copied {}", preview));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard: {}", e));
                    }
                }
            }

            Action::DismissError => self.state.art_error = None,
            Action::ToggleLogs => {
                self.show_logs = !self.show_logs;
                self.focus.set_member(ComponentId::LogPanel, self.show_logs);
                if self.show_logs {
                    self.reload_log();
                }
            }
            // The overlay toggles itself in on_action.
            Action::ToggleHelp => {}
            Action::ToggleKeys => self.show_keys = !self.show_keys,
            Action::Quit => self.should_quit = true,
        }
    }

    fn begin_refresh(&mut self) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        self.refresher.start(tx);
        self.state.refresh_count = self.scheduler.signal();
        self.state.art_loading = true;
        self.state.poem_loading = true;
    }

    /// Read the last 500 lines of easel.log into state.log_lines.
    fn reload_log(&mut self) {
        if let Ok(content) = std::fs::read_to_string(&self.log_path) {
            let lines: Vec<&str> = content.lines().collect();
            let start = lines.len().saturating_sub(500);
            self.state.log_lines = lines[start..].iter().map(|l| l.to_string()).collect();
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: header | body | (log) | (keys bar) ─────────────────
        let keys_h = if self.show_keys { 1u16 } else { 0 };
        let log_h = if self.show_logs { 10u16 } else { 0 };
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(log_h),
                Constraint::Length(keys_h),
            ])
            .split(area);

        self.panels.header.draw(frame, outer[0], false, &self.state);

        // ── Body: artwork | (poem over analysis) ─────────────────────────────
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(outer[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(body[1]);

        self.pane_areas = PaneAreas {
            art: body[0],
            poem: right[0],
            analysis: right[1],
            log: if self.show_logs { outer[2] } else { Rect::default() },
        };

        let focus = &self.focus;
        let state = &self.state;
        self.panels
            .art
            .draw(frame, body[0], focus.is_focused(ComponentId::ArtPanel), state);
        self.panels
            .poem
            .draw(frame, right[0], focus.is_focused(ComponentId::PoemPanel), state);
        self.panels.analysis.draw(
            frame,
            right[1],
            focus.is_focused(ComponentId::AnalysisPanel),
            state,
        );
        if self.show_logs {
            self.panels
                .log
                .draw(frame, outer[2], focus.is_focused(ComponentId::LogPanel), state);
        }
        if self.show_keys {
            status_bar::draw_keys_bar(frame, outer[3], state);
        }

        // ── Overlays ──────────────────────────────────────────────────────────
        self.panels.help.draw(frame, area, false, state);
        self.toast.draw(frame, area);
    }
}

/// Web search for the poet, as copied by `g`.
fn author_search_url(author: &str) -> String {
    format!("https://www.google.com/search?q={}", encode_segment(author))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_search_url_encodes_name() {
        assert_eq!(
            author_search_url("Percy Bysshe Shelley"),
            "https://www.google.com/search?q=Percy%20Bysshe%20Shelley"
        );
        assert_eq!(
            author_search_url("Brontë"),
            "https://www.google.com/search?q=Bront%C3%AB"
        );
    }

    fn app() -> App {
        let mut config = Config::default();
        config.art.api_base = "http://127.0.0.1:9/api/v1".into();
        config.poems.poetrydb_base = "http://127.0.0.1:9".into();
        config.poems.random_poem_url = None;
        config.services.analysis_url = "http://127.0.0.1:9/".into();
        App::new(
            &config,
            reqwest::Client::new(),
            None,
            None,
            PathBuf::from("/nonexistent/easel.log"),
        )
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_global_and_pane_keys() {
        let mut app = app();
        assert_eq!(app.handle_key(key(KeyCode::Char('q'))), vec![Action::Quit]);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            vec![Action::Quit]
        );
        assert_eq!(app.handle_key(key(KeyCode::Char('r'))), vec![Action::RefreshNow]);
        assert_eq!(app.handle_key(key(KeyCode::Char(' '))), vec![Action::TogglePause]);
        // Esc only maps to DismissError while an error is shown.
        assert!(app.handle_key(key(KeyCode::Esc)).is_empty());
        app.state.art_error = Some("boom".into());
        assert_eq!(app.handle_key(key(KeyCode::Esc)), vec![Action::DismissError]);
    }

    #[test]
    fn test_help_overlay_captures_keys() {
        let mut app = app();
        app.dispatch(Action::ToggleHelp);
        assert!(app.panels.help.visible);
        assert!(app.handle_key(key(KeyCode::Char('r'))).is_empty());
        app.dispatch(Action::ToggleHelp);
        assert!(!app.panels.help.visible);
    }

    #[test]
    fn test_pause_toggle_and_log_focus() {
        let mut app = app();
        app.dispatch(Action::TogglePause);
        assert!(app.state.paused);
        app.dispatch(Action::TogglePause);
        assert!(!app.state.paused);

        app.dispatch(Action::ToggleLogs);
        app.dispatch(Action::FocusPane(ComponentId::LogPanel));
        assert!(app.focus.is_focused(ComponentId::LogPanel));
        app.dispatch(Action::ToggleLogs);
        assert!(app.focus.is_focused(ComponentId::ArtPanel));
    }

    #[test]
    fn test_side_features_need_a_poem() {
        let mut app = app();
        app.dispatch(Action::SpeakPoem);
        app.dispatch(Action::Analyze);
        assert!(app.state.narration.is_idle());
        assert_eq!(app.state.analysis, crate::analysis::AnalysisState::Idle);
        app.dispatch(Action::Quit);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_late_reply_keeps_newer_spinner() {
        use easel_proto::protocol::PoemSource;

        let mut app = app();
        let (tx, _rx) = mpsc::channel(16);
        app.tx = Some(tx);
        app.state.poem = Some(PoemResult {
            author: "Emily Dickinson".into(),
            title: "Hope".into(),
            lines: vec!["Hope is the thing with feathers".into()],
            source: PoemSource::Curated,
        });

        app.dispatch(Action::Analyze);
        assert!(app.toast.has_spinner(ANALYSIS_SPINNER));
        app.on_poem_changed();
        assert!(!app.toast.has_spinner(ANALYSIS_SPINNER));
        app.dispatch(Action::Analyze);

        // Generation 1 was superseded; its reply must not clear the spinner of 2.
        app.handle_message(AppMessage::Analysis(1, Err(FetchError::Cancelled)));
        assert!(app.toast.has_spinner(ANALYSIS_SPINNER));
        assert_eq!(app.state.analysis, crate::analysis::AnalysisState::Loading);

        app.handle_message(AppMessage::Analysis(2, Ok("About hope.".into())));
        assert!(!app.toast.has_spinner(ANALYSIS_SPINNER));
        assert_eq!(app.state.analysis.text(), Some("About hope."));
    }
}
