//! AnalysisPanel component: commentary on the current poem.

use ratatui::crossterm::event::{KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    analysis::AnalysisState,
    app_state::AppState,
    component::Component,
    narration::{NarrationPhase, NarrationTarget},
    theme::{style_default, C_LOADING, C_MUTED, C_PLAYING},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scroll::{wrapped_rows, ScrollState},
    },
};

pub struct AnalysisPanel {
    scroll: ScrollState,
}

impl AnalysisPanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::default(),
        }
    }
}

impl Component for AnalysisPanel {
    fn id(&self) -> ComponentId {
        ComponentId::AnalysisPanel
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind != KeyEventKind::Release {
            self.scroll.handle_key(&key);
        }
        vec![]
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        match event.kind {
            MouseEventKind::ScrollUp => self.scroll.up(1),
            MouseEventKind::ScrollDown => self.scroll.down(1),
            _ => {}
        }
        vec![]
    }

    fn on_action(&mut self, action: &Action, _state: &AppState) -> Vec<Action> {
        if *action == Action::Analyze {
            self.scroll.reset();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let reading = state.narration.target == Some(NarrationTarget::Analysis)
            && state.narration.phase == NarrationPhase::Playing;
        let badge = match &state.analysis {
            AnalysisState::Loading => Some(Badge {
                text: "ANALYSING",
                color: C_LOADING,
            }),
            AnalysisState::Displayed(_) if reading => Some(Badge {
                text: "♪ READING",
                color: C_PLAYING,
            }),
            _ => None,
        };
        let block = pane_chrome("analysis", Some('3'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let lines: Vec<Line> = match &state.analysis {
            AnalysisState::Idle if state.poem.is_none() => vec![hint(" waiting for a poem")],
            AnalysisState::Idle => vec![hint(" press a to analyse this poem")],
            AnalysisState::Loading => vec![hint(" analysing…")],
            AnalysisState::Displayed(text) => text
                .lines()
                .map(|l| Line::from(Span::styled(format!(" {}", l), style_default())))
                .collect(),
        };
        let offset = self
            .scroll
            .clamp(wrapped_rows(&lines, inner.width), inner.height);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((offset, 0)),
            inner,
        );
    }
}

fn hint(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(text, Style::default().fg(C_MUTED)))
}
