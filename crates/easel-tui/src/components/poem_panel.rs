//! PoemPanel component: title, author and the poem text.

use ratatui::crossterm::event::{KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use easel_proto::protocol::PoemResult;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    narration::{NarrationPhase, NarrationTarget},
    theme::{style_default, style_title, C_AUTHOR, C_LOADING, C_MUTED, C_PLAYING},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scroll::{wrapped_rows, ScrollState},
    },
};

pub struct PoemPanel {
    scroll: ScrollState,
    shown_title: Option<String>,
}

impl PoemPanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::default(),
            shown_title: None,
        }
    }
}

impl Component for PoemPanel {
    fn id(&self) -> ComponentId {
        ComponentId::PoemPanel
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

    fn on_action(&mut self, _action: &Action, _state: &AppState) -> Vec<Action> {
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = narration_badge(state).or(if state.poem_loading {
            Some(Badge {
                text: "LOADING",
                color: C_LOADING,
            })
        } else {
            None
        });
        let block = pane_chrome("poem", Some('2'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 {
            return;
        }

        let Some(poem) = state.poem.as_ref() else {
            let hint = if state.poem_loading {
                " loading…"
            } else {
                " no poem yet"
            };
            frame.render_widget(
                Paragraph::new(Span::styled(hint, Style::default().fg(C_MUTED))),
                inner,
            );
            return;
        };

        if self.shown_title.as_deref() != Some(poem.title.as_str()) {
            self.shown_title = Some(poem.title.clone());
            self.scroll.reset();
        }

        let lines = poem_lines(poem);
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

fn narration_badge(state: &AppState) -> Option<Badge<'static>> {
    if state.narration.target != Some(NarrationTarget::Poem) {
        return None;
    }
    match state.narration.phase {
        NarrationPhase::Loading => Some(Badge {
            text: "PREPARING",
            color: C_LOADING,
        }),
        NarrationPhase::Playing => Some(Badge {
            text: "♪ READING",
            color: C_PLAYING,
        }),
        NarrationPhase::Idle => None,
    }
}

fn poem_lines(poem: &PoemResult) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(format!(" {}", poem.title), style_title())),
        Line::from(Span::styled(
            format!(" {}", poem.author),
            Style::default().fg(C_AUTHOR).add_modifier(Modifier::ITALIC),
        )),
        Line::from(""),
    ];
    lines.extend(
        poem.lines
            .iter()
            .map(|l| Line::from(Span::styled(format!(" {}", l), style_default()))),
    );
    lines
}
