//! ArtPanel component: the artwork image with its caption underneath.

use ratatui::crossterm::event::{KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use easel_proto::protocol::ArtworkResult;

use crate::{
    action::{Action, ComponentId},
    app_state::AppState,
    component::Component,
    picture::{halfblocks_picker, ArtImage},
    theme::{style_title, C_AUTHOR, C_ERROR, C_LOADING, C_META, C_MUTED, C_SECONDARY},
    widgets::{
        pane_chrome::{pane_chrome, Badge},
        scroll::{wrapped_rows, ScrollState},
    },
};

/// Rows reserved for the caption when an image is shown.
const CAPTION_ROWS: u16 = 9;

pub struct ArtPanel {
    scroll: ScrollState,
    image: ArtImage,
    shown_id: Option<u64>,
}

impl ArtPanel {
    pub fn new() -> Self {
        Self {
            scroll: ScrollState::default(),
            image: ArtImage::new(halfblocks_picker()),
            shown_id: None,
        }
    }

    /// Use the terminal's own graphics protocol once it is known.
    pub fn set_picker(&mut self, picker: ratatui_image::picker::Picker) {
        self.image.set_picker(picker);
    }
}

impl Component for ArtPanel {
    fn id(&self) -> ComponentId {
        ComponentId::ArtPanel
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
        if *action == Action::Refresh {
            self.scroll.reset();
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let badge = if state.art_loading {
            Some(Badge {
                text: "LOADING",
                color: C_LOADING,
            })
        } else if state.art_error.is_some() {
            Some(Badge {
                text: "ERR",
                color: C_ERROR,
            })
        } else {
            None
        };
        let block = pane_chrome("artwork", Some('1'), focused, badge);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let current_id = state.artwork.as_ref().map(|v| v.artwork.id);
        if current_id != self.shown_id {
            self.shown_id = current_id;
            self.scroll.reset();
        }

        let mut lines = Vec::new();
        if let Some(err) = &state.art_error {
            lines.push(Line::from(vec![
                Span::styled(" ⛔ ", Style::default().fg(C_ERROR)),
                Span::styled(err.clone(), Style::default().fg(C_ERROR)),
            ]));
            lines.push(Line::from(Span::styled(
                " esc to dismiss",
                Style::default().fg(C_MUTED),
            )));
            lines.push(Line::from(""));
        }

        let Some(view) = state.artwork.as_ref() else {
            let hint = if state.art_loading {
                " loading…"
            } else {
                " no artwork yet (r to refresh)"
            };
            lines.push(Line::from(Span::styled(hint, Style::default().fg(C_MUTED))));
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
            return;
        };

        let caption_area = match &view.picture {
            Some(picture) if inner.height > CAPTION_ROWS + 2 => {
                let [image_area, caption_area] =
                    Layout::vertical([Constraint::Min(1), Constraint::Length(CAPTION_ROWS)])
                        .areas(inner);
                self.image
                    .render(frame, image_area, view.artwork.id, picture);
                caption_area
            }
            picture => {
                if picture.is_none() {
                    self.image.clear();
                    lines.push(Line::from(Span::styled(
                        " (no image)",
                        Style::default().fg(C_MUTED),
                    )));
                }
                inner
            }
        };

        lines.extend(caption_lines(&view.artwork));
        let offset = self
            .scroll
            .clamp(wrapped_rows(&lines, caption_area.width), caption_area.height);
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((offset, 0)),
            caption_area,
        );
    }
}

fn caption_lines(artwork: &ArtworkResult) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        format!(" {}", artwork.title),
        style_title(),
    ))];
    if !artwork.artist.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(" {}", artwork.artist),
            Style::default().fg(C_AUTHOR).add_modifier(Modifier::ITALIC),
        )));
    }
    let meta = meta_line(artwork);
    if !meta.is_empty() {
        lines.push(Line::from(Span::styled(
            format!(" {}", meta),
            Style::default().fg(C_META),
        )));
    }
    if !artwork.description.is_empty() {
        lines.push(Line::from(""));
        for para in artwork.description.lines() {
            lines.push(Line::from(Span::styled(
                format!(" {}", para),
                Style::default().fg(C_SECONDARY),
            )));
        }
    }
    lines
}

/// `(date) (origin) (type)`, skipping empty fields.
fn meta_line(artwork: &ArtworkResult) -> String {
    [&artwork.date_range, &artwork.origin, &artwork.kind]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(|s| format!("({})", s))
        .collect::<Vec<_>>()
        .join(" ")
}
