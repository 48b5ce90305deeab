//! Smooth Unicode bar draining towards the next refresh.

use std::time::Duration;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use easel_proto::schedule::format_countdown;

use crate::theme::{C_BADGE_PAUSED, C_MUTED, C_PLAYING};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

pub fn draw_countdown(frame: &mut Frame, area: Rect, remaining: Duration, interval: Duration, paused: bool) {
    if area.width < 8 || area.height == 0 {
        return;
    }
    let label = format!(" {}", format_countdown(remaining));
    let bar_w = area.width.saturating_sub(label.len() as u16 + 1).max(4) as usize;
    let color = if paused { C_BADGE_PAUSED } else { C_PLAYING };

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(" "),
            Span::styled(bar(fraction(remaining, interval), bar_w), Style::default().fg(color)),
            Span::styled(label, Style::default().fg(C_MUTED)),
        ])),
        area,
    );
}

fn fraction(remaining: Duration, interval: Duration) -> f64 {
    if interval.is_zero() {
        return 0.0;
    }
    (remaining.as_secs_f64() / interval.as_secs_f64()).clamp(0.0, 1.0)
}

/// `width` cells filled to `progress` in eighths of a cell.
fn bar(progress: f64, width: usize) -> String {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full = eighths / 8;
    let mut out = String::with_capacity(width * 3);
    out.extend(std::iter::repeat('█').take(full));
    if full < width {
        out.push(BLOCKS[eighths % 8]);
        out.extend(std::iter::repeat(' ').take(width - full - 1));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_width_is_constant() {
        for p in [0.0, 0.13, 0.5, 0.99, 1.0] {
            assert_eq!(bar(p, 20).chars().count(), 20);
        }
        assert_eq!(bar(1.0, 4), "████");
        assert_eq!(bar(0.5, 4), "██  ");
    }

    #[test]
    fn test_fraction_bounds() {
        let i = Duration::from_secs(600);
        assert_eq!(fraction(i, i), 1.0);
        assert_eq!(fraction(Duration::ZERO, i), 0.0);
        assert_eq!(fraction(Duration::from_secs(5), Duration::ZERO), 0.0);
    }
}
