//! Minimal SGR transitions.
//!
//! Tracks the style the real terminal currently has active and emits the
//! smallest SGR sequence that reaches a target style. Decorations can only
//! be added incrementally; removing one (or clearing a color entirely)
//! requires a reset followed by re-emission of everything the target keeps.

use crate::cell::{CellStyle, StyleFlags};

/// Tracks the terminal's active style across emitted output.
#[derive(Debug, Clone, Default)]
pub struct StyleTracker {
    current: CellStyle,
}

impl StyleTracker {
    /// A tracker assuming the terminal is at the default style.
    pub fn new() -> Self {
        StyleTracker {
            current: CellStyle::default(),
        }
    }

    /// Whether a non-default style is believed active.
    pub fn is_active(&self) -> bool {
        !self.current.is_default()
    }

    /// The SGR sequence (possibly empty) bringing the terminal from the
    /// tracked style to `target`; updates the tracked style.
    pub fn transition(&mut self, target: &CellStyle) -> String {
        if self.current == *target {
            return String::new();
        }

        let turned_off = self.current.flags.bits() & !target.flags.bits();
        let needs_reset = turned_off != 0
            || (self.current.has_fg() && !target.has_fg())
            || (self.current.has_bg() && !target.has_bg())
            || (self.current.fg_ext.is_some() && target.fg_ext.is_none())
            || (self.current.bg_ext.is_some() && target.bg_ext.is_none());

        let mut codes: Vec<String> = Vec::new();
        if needs_reset {
            codes.push(String::from("0"));
            for code in target.flags.sgr_codes() {
                codes.push(code.to_string());
            }
            push_fg(&mut codes, target);
            push_bg(&mut codes, target);
        } else {
            let added = target.flags.bits() & !self.current.flags.bits();
            for code in StyleFlags::new(added).sgr_codes() {
                codes.push(code.to_string());
            }
            if (self.current.fg, self.current.fg_ext) != (target.fg, target.fg_ext) {
                push_fg(&mut codes, target);
            }
            if (self.current.bg, self.current.bg_ext) != (target.bg, target.bg_ext) {
                push_bg(&mut codes, target);
            }
        }

        self.current = *target;
        if codes.is_empty() {
            String::new()
        } else {
            format!("\x1b[{}m", codes.join(";"))
        }
    }

    /// `ESC[0m` if a style is active, empty otherwise; tracked style
    /// returns to default.
    pub fn reset(&mut self) -> String {
        if self.is_active() {
            self.current = CellStyle::default();
            String::from("\x1b[0m")
        } else {
            String::new()
        }
    }
}

fn push_fg(codes: &mut Vec<String>, style: &CellStyle) {
    if let Some(ext) = style.fg_ext {
        codes.push(ext.sgr_params(38));
    } else if let Some(fg) = style.fg {
        codes.push(fg.to_string());
    }
}

fn push_bg(codes: &mut Vec<String>, style: &CellStyle) {
    if let Some(ext) = style.bg_ext {
        codes.push(ext.sgr_params(48));
    } else if let Some(bg) = style.bg {
        codes.push(bg.to_string());
    }
}
