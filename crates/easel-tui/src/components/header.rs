//! Header component: 2-row top bar.
//!
//! Row 1: app name, countdown, paused badge, refresh counter, loading and
//! narration status.
//! Row 2: countdown bar (left) | artwork style and poem source (right).
//!
//! Not focusable.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use easel_proto::protocol::PoemSource;
use easel_proto::schedule::format_countdown;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    narration::NarrationPhase,
    theme::{C_ACCENT, C_BADGE_PAUSED, C_LOADING, C_META, C_MUTED, C_PLAYING, C_SECONDARY},
    widgets::countdown_bar::draw_countdown,
};

pub struct Header;

impl Header {
    pub fn new() -> Self {
        Self
    }
}

impl Component for Header {
    fn id(&self) -> ComponentId {
        ComponentId::Header
    }

    fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        frame.render_widget(Clear, area);
        if area.height < 2 {
            frame.render_widget(Paragraph::new(build_row1(state)), area);
            return;
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);
        frame.render_widget(Paragraph::new(build_row1(state)), rows[0]);

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(rows[1]);
        draw_countdown(frame, cols[0], state.countdown, state.interval, state.paused);
        frame.render_widget(
            Paragraph::new(build_sources(state)).right_aligned(),
            cols[1],
        );
    }
}

// ── Row 1 ─────────────────────────────────────────────────────────────────────

fn build_row1(state: &AppState) -> Line<'static> {
    let mut spans = vec![
        Span::styled(
            " easel ",
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        ),
        Span::styled("next ", Style::default().fg(C_MUTED)),
        Span::styled(
            format_countdown(state.countdown),
            Style::default().fg(C_SECONDARY).add_modifier(Modifier::BOLD),
        ),
    ];
    if state.paused {
        spans.push(Span::styled(
            " [PAUSED]",
            Style::default().fg(C_BADGE_PAUSED).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        format!("  #{}", state.refresh_count),
        Style::default().fg(C_MUTED),
    ));

    if state.art_loading || state.poem_loading {
        let what = match (state.art_loading, state.poem_loading) {
            (true, true) => "art + poem",
            (true, false) => "art",
            _ => "poem",
        };
        spans.push(Span::styled(
            format!("  ◔ loading {}", what),
            Style::default().fg(C_LOADING),
        ));
    }

    if let Some(label) = state.narration.label() {
        let (icon, color) = match state.narration.phase {
            NarrationPhase::Playing => ("♪", C_PLAYING),
            _ => ("◔", C_LOADING),
        };
        spans.push(Span::styled(
            format!("  {} {}", icon, label),
            Style::default().fg(color),
        ));
    }
    Line::from(spans)
}

fn build_sources(state: &AppState) -> Line<'static> {
    let mut spans = Vec::new();
    if let Some(view) = &state.artwork {
        spans.push(Span::styled("style ", Style::default().fg(C_MUTED)));
        spans.push(Span::styled(
            view.artwork.style.clone(),
            Style::default().fg(C_META),
        ));
    }
    if let Some(poem) = &state.poem {
        let source = match poem.source {
            PoemSource::Curated => "poetrydb",
            PoemSource::Serverless => "random",
        };
        spans.push(Span::styled("  poem ", Style::default().fg(C_MUTED)));
        spans.push(Span::styled(source, Style::default().fg(C_META)));
    }
    spans.push(Span::raw(" "));
    Line::from(spans)
}
