//! Vertical scroll offset for the text panels.

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::text::Line;

#[derive(Debug, Default, Clone, Copy)]
pub struct ScrollState {
    pub offset: u16,
}

impl ScrollState {
    /// Apply a scroll key. Returns false for keys that are not scroll keys.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.up(1),
            KeyCode::Down | KeyCode::Char('j') => self.down(1),
            KeyCode::PageUp => self.up(10),
            KeyCode::PageDown => self.down(10),
            KeyCode::Home => self.offset = 0,
            KeyCode::End | KeyCode::Char('G') => self.offset = u16::MAX,
            _ => return false,
        }
        true
    }

    pub fn up(&mut self, n: u16) {
        self.offset = self.offset.saturating_sub(n);
    }

    pub fn down(&mut self, n: u16) {
        self.offset = self.offset.saturating_add(n);
    }

    pub fn reset(&mut self) {
        self.offset = 0;
    }

    /// Clamp so the last content row can reach the bottom of the viewport
    /// but never scrolls past it.
    pub fn clamp(&mut self, content_rows: u16, viewport_rows: u16) -> u16 {
        self.offset = self.offset.min(content_rows.saturating_sub(viewport_rows));
        self.offset
    }
}

/// Rows `lines` occupy once wrapped to `width` columns.
pub fn wrapped_rows(lines: &[Line], width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    let rows: usize = lines
        .iter()
        .map(|l| l.width().div_ceil(width as usize).max(1))
        .sum();
    rows.min(u16::MAX as usize) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_scroll_keys_and_clamp() {
        let mut s = ScrollState::default();
        assert!(s.handle_key(&key(KeyCode::Char('j'))));
        assert!(s.handle_key(&key(KeyCode::PageDown)));
        assert_eq!(s.offset, 11);
        assert_eq!(s.clamp(15, 10), 5);
        assert!(s.handle_key(&key(KeyCode::Char('k'))));
        assert_eq!(s.offset, 4);
        assert!(s.handle_key(&key(KeyCode::End)));
        assert_eq!(s.clamp(15, 10), 5);
        assert!(!s.handle_key(&key(KeyCode::Char('x'))));
        assert_eq!(s.clamp(3, 10), 0);
    }

    #[test]
    fn test_wrapped_rows() {
        let lines = vec![Line::from("abcdefghij"), Line::from(""), Line::from("abc")];
        assert_eq!(wrapped_rows(&lines, 4), 3 + 1 + 1);
        assert_eq!(wrapped_rows(&lines, 0), 0);
    }
}
