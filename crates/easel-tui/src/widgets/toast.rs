//! Toast notifications: transient status messages in the top-right corner.
//!
//! Loading work (analysis, narration) shows a keyed spinner that animates
//! until the owner dismisses it; finished work pushes an expiring toast.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_TOAST_ERROR, C_TOAST_INFO, C_TOAST_SUCCESS, C_TOAST_WARNING};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    fn icon(self) -> &'static str {
        match self {
            Self::Info => "ℹ",
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Error => "✗",
        }
    }

    fn lifetime(self) -> Duration {
        match self {
            Self::Info | Self::Success => Duration::from_secs(3),
            Self::Warning => Duration::from_secs(4),
            Self::Error => Duration::from_secs(6),
        }
    }
}

struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

struct Spinner {
    key: &'static str,
    message: String,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];
const MAX_VISIBLE: usize = 4;

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinners: Vec<Spinner>,
    frame: usize,
}

impl ToastManager {
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            spinners: Vec::new(),
            frame: 0,
        }
    }

    pub fn push(&mut self, message: impl Into<String>, severity: Severity) {
        self.push_at(message, severity, Instant::now());
    }

    fn push_at(&mut self, message: impl Into<String>, severity: Severity, now: Instant) {
        let message = message.into();
        self.toasts.retain(|t| t.message != message);
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: now + severity.lifetime(),
        });
        while self.toasts.len() > MAX_VISIBLE * 2 {
            self.toasts.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Info);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Success);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Warning);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(message, Severity::Error);
    }

    /// Start or replace the spinner registered under `key`.
    pub fn spinner(&mut self, key: &'static str, message: impl Into<String>) {
        let message = message.into();
        match self.spinners.iter_mut().find(|s| s.key == key) {
            Some(s) => s.message = message,
            None => self.spinners.push(Spinner { key, message }),
        }
    }

    pub fn dismiss_spinner(&mut self, key: &'static str) {
        self.spinners.retain(|s| s.key != key);
    }

    #[cfg(test)]
    pub fn has_spinner(&self, key: &str) -> bool {
        self.spinners.iter().any(|s| s.key == key)
    }

    /// Drop expired toasts and advance the spinner animation.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires > now);
        if !self.spinners.is_empty() {
            self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinners.is_empty()
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30.min(area.width), 60);
        let bottom = area.y + area.height;

        let spinner_rows = self.spinners.iter().map(|s| {
            (SPINNER_FRAMES[self.frame], s.message.as_str(), C_TOAST_INFO)
        });
        let toast_rows = self.toasts.iter().rev().take(MAX_VISIBLE).map(|t| {
            let color = match t.severity {
                Severity::Info => C_TOAST_INFO,
                Severity::Success => C_TOAST_SUCCESS,
                Severity::Warning => C_TOAST_WARNING,
                Severity::Error => C_TOAST_ERROR,
            };
            (t.severity.icon(), t.message.as_str(), color)
        });

        for (row, (icon, message, color)) in spinner_rows.chain(toast_rows).enumerate() {
            let y = area.y + 1 + row as u16;
            if y >= bottom {
                break;
            }
            let w = (message.width() as u16 + 4).min(max_width);
            let toast_area = Rect {
                x: area.x + area.width.saturating_sub(w + 1),
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!(" {} {} ", icon, message),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))),
                toast_area,
            );
        }
    }
}

impl Default for ToastManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_messages_collapse() {
        let mut t = ToastManager::new();
        let now = Instant::now();
        t.push_at("copied", Severity::Success, now);
        t.push_at("copied", Severity::Success, now);
        assert_eq!(t.toasts.len(), 1);
    }

    #[test]
    fn test_toasts_expire() {
        let mut t = ToastManager::new();
        let now = Instant::now();
        t.push_at("hello", Severity::Info, now);
        t.push_at("bad", Severity::Error, now);
        t.tick_at(now + Duration::from_secs(4));
        assert_eq!(t.toasts.len(), 1);
        assert_eq!(t.toasts[0].message, "bad");
        t.tick_at(now + Duration::from_secs(7));
        assert!(t.is_empty());
    }

    #[test]
    fn test_spinners_are_keyed() {
        let mut t = ToastManager::new();
        t.spinner("analysis", "analysing…");
        t.spinner("narration", "preparing speech…");
        t.spinner("analysis", "still analysing…");
        assert_eq!(t.spinners.len(), 2);
        t.dismiss_spinner("analysis");
        assert_eq!(t.spinners.len(), 1);
        assert_eq!(t.spinners[0].key, "narration");
        t.dismiss_spinner("narration");
        assert!(t.is_empty());
    }
}
