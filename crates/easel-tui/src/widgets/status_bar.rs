//! Status bar: bottom line with the timer state and keybindings.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::AppState;
use crate::narration::NarrationPhase;
use crate::theme::{C_BADGE_LIVE, C_BADGE_PAUSED, C_MUTED, C_PLAYING};

/// Draw the keybindings footer bar (one row).
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, state: &AppState) {
    let (label, color) = if state.paused {
        ("PAUSED", C_BADGE_PAUSED)
    } else {
        ("AUTO", C_BADGE_LIVE)
    };

    let keys = if state.narration.phase == NarrationPhase::Idle {
        " r refresh  Space pause  s speak  a analyse  v speak analysis  g/y copy  Tab panes  j/k scroll  L logs  ? help  q quit"
    } else {
        " x stop  r refresh  Space pause  a analyse  g/y copy  Tab panes  j/k scroll  L logs  ? help  q quit"
    };

    let mut spans = vec![Span::styled(
        format!(" {} ", label),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if state.narration.phase == NarrationPhase::Playing {
        spans.push(Span::styled(
            "♪",
            Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(keys, Style::default().fg(C_MUTED)));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
