//! ANSI output generation.
//!
//! Two forms:
//! - **Full frame**: rows rendered relative to the caller's cursor using
//!   `ESC 7` / `ESC 8` and cursor-down, with no `\r`, `\n`, or absolute
//!   addressing. The frame can be painted at any cursor offset (a popup, a
//!   panel) and sidesteps terminal-dependent pending-wrap behavior at row
//!   ends.
//! - **Differential**: every row changed since a caller checkpoint is
//!   rewritten in place with absolute addressing and erased to end of
//!   line.
//!
//! Both forms seed a fresh style tracker per row and reset before leaving
//! a styled row, so styles never bleed across rows or into caller output.

use crate::cell::CellStyle;
use crate::engine::Engine;
use crate::sgr::StyleTracker;

impl Engine {
    /// Render the entire viewport relative to the caller's current cursor
    /// position.
    ///
    /// Writing the returned bytes to a terminal whose cursor sits at the
    /// frame origin reproduces the viewport; the cursor returns to the
    /// last rendered row's end rather than advancing past the frame.
    pub fn render(&mut self) -> Vec<u8> {
        let mut out = String::new();
        out.push_str("\x1b7");
        for v in 0..self.height {
            out.push_str("\x1b8");
            if v > 0 {
                out.push_str(&format!("\x1b[{}B", v));
            }
            self.render_row(self.lines_off_screen + v, false, &mut out);
        }
        self.last_rendered_seq = self.tracker.current_seq();
        out.into_bytes()
    }

    /// Rewrite every viewport row modified since `seq`, addressing each
    /// absolutely and erasing to end of line. Empty if nothing changed.
    ///
    /// Unlike [`Engine::render`], the output assumes it owns the whole
    /// terminal (row 1 is the viewport's first row), so it does not
    /// compose with a caller offset.
    pub fn render_since(&mut self, seq: u64) -> Vec<u8> {
        let mut out = String::new();
        let top = self.lines_off_screen;
        let bottom = self.viewport_bottom();
        for row in self.tracker.rows_changed_since(seq) {
            if row < top || row > bottom {
                continue;
            }
            out.push_str(&format!("\x1b[{};1H", row - top + 1));
            self.render_row(row, true, &mut out);
            out.push_str("\x1b[K");
        }
        self.last_rendered_seq = self.tracker.current_seq();
        out.into_bytes()
    }

    /// Append one row's cells. With `trim_trailing`, blank cells at the
    /// row's end are omitted (the caller erases to end of line instead).
    fn render_row(&self, row: usize, trim_trailing: bool, out: &mut String) {
        let line = self.grid.line(row);
        let mut end = self.width;
        if trim_trailing {
            while end > 0 {
                let blank = match line.and_then(|l| l.get(end - 1)) {
                    Some(cell) => cell.is_blank(),
                    None => true,
                };
                if !blank {
                    break;
                }
                end -= 1;
            }
        }

        let mut styles = StyleTracker::new();
        let default_style = CellStyle::default();
        for col in 0..end {
            match line.and_then(|l| l.get(col)) {
                Some(cell) if cell.is_continuation() => {
                    // The wide cluster to the left already consumed this
                    // column on the real terminal.
                }
                Some(cell) => {
                    out.push_str(&styles.transition(&cell.style));
                    out.push_str(&cell.cluster);
                }
                None => {
                    out.push_str(&styles.transition(&default_style));
                    out.push(' ');
                }
            }
        }
        out.push_str(&styles.reset());
    }
}
