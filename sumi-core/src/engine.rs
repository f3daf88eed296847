//! Virtual terminal engine.
//!
//! The engine owns the grid, cursor, active style, saved-cursor slot, and
//! change tracker. `write` interprets bytes as if delivered to a terminal
//! of the configured size; rendering (in `renderer`) reads the resulting
//! state back out as minimal ANSI.
//!
//! The viewport is always exactly `height` rows starting at
//! `lines_off_screen`; rows above it have scrolled off and are retained up
//! to the buffer cap. Cursor coordinates are absolute buffer positions.
//!
//! `write` and the dispatch helpers are total: malformed sequences degrade
//! to text, out-of-range motion clamps, and unknown commands are ignored
//! with a log line.

use log::{debug, trace};

use sumi_parser::{parse, Token};

use crate::buffer::CellBuffer;
use crate::cell::{Cell, CellStyle};
use crate::grid::Grid;
use crate::tracker::ChangeTracker;
use crate::width::{cluster_width, clusters};

/// Callback invoked with query replies (DSR, color queries).
pub type QueryResponder = Box<dyn FnMut(&[u8])>;

pub struct Engine {
    pub(crate) width: usize,
    pub(crate) height: usize,
    pub(crate) grid: Grid,
    pub(crate) cursor_row: usize,
    pub(crate) cursor_col: usize,
    pub(crate) lines_off_screen: usize,
    active: CellStyle,
    /// (col, viewport-relative row) stashed by DECSC.
    saved_cursor: Option<(usize, usize)>,
    pub(crate) tracker: ChangeTracker,
    pub(crate) last_rendered_seq: u64,
    responder: Option<QueryResponder>,
}

impl Engine {
    /// Create an engine with a fixed viewport size.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is 0.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "terminal dimensions must be > 0");
        Engine {
            width,
            height,
            grid: Grid::new(width),
            cursor_row: 0,
            cursor_col: 0,
            lines_off_screen: 0,
            active: CellStyle::default(),
            saved_cursor: None,
            tracker: ChangeTracker::new(),
            last_rendered_seq: 0,
            responder: None,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Absolute cursor position `(row, col)` in the buffer.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    /// Rows scrolled above the viewport.
    pub fn lines_off_screen(&self) -> usize {
        self.lines_off_screen
    }

    pub fn current_seq(&self) -> u64 {
        self.tracker.current_seq()
    }

    /// The change sequence captured at the most recent render call.
    pub fn last_rendered_seq(&self) -> u64 {
        self.last_rendered_seq
    }

    /// The style stamped onto the next written cell.
    pub fn active_style(&self) -> CellStyle {
        self.active
    }

    /// Register the callback that receives query replies (`ESC[6n`,
    /// `ESC[?10n`, `ESC[?11n`). Without one, replies are dropped.
    pub fn set_query_responder<F>(&mut self, responder: F)
    where
        F: FnMut(&[u8]) + 'static,
    {
        self.responder = Some(Box::new(responder));
    }

    /// Cell at a viewport-relative position; blank if that row was never
    /// materialized.
    pub fn viewport_cell(&self, row: usize, col: usize) -> Cell {
        self.grid
            .cell(self.lines_off_screen + row, col)
            .cloned()
            .unwrap_or_default()
    }

    /// Project the viewport into a unified cell buffer for value-based
    /// comparison and cell-level diff rendering.
    pub fn snapshot(&self) -> CellBuffer {
        CellBuffer::from_engine(self)
    }

    /// Interpret `bytes` as terminal input, mutating grid and cursor.
    ///
    /// Backspace (0x08) and carriage return (0x0D) are rewritten to their
    /// CSI equivalents before tokenizing, so all cursor motion funnels
    /// through one dispatch path.
    pub fn write(&mut self, bytes: &[u8]) {
        let prepared = preprocess(bytes);
        for token in parse(&prepared) {
            self.apply(token);
        }
    }

    /// Write `bytes` followed by a newline. If the cursor sits mid-line, a
    /// newline is inserted first so the payload starts in column 0.
    pub fn writeln(&mut self, bytes: &[u8]) {
        if self.cursor_col != 0 {
            self.write(b"\n");
        }
        self.write(bytes);
        self.write(b"\n");
    }

    fn apply(&mut self, token: Token) {
        match token {
            Token::Text(bytes) => {
                self.input_text(&String::from_utf8_lossy(&bytes));
            }
            Token::Invalid(bytes) => {
                if bytes == b"\x1b" {
                    trace!("dropped lone ESC");
                } else {
                    // Malformed escapes pass through as text.
                    self.input_text(&String::from_utf8_lossy(&bytes));
                }
            }
            Token::Csi {
                command, params, ..
            } => self.dispatch_csi(command, &params),
            Token::SimpleEsc { command, .. } => match command {
                b'7' => self.save_cursor(),
                b'8' => self.restore_cursor(),
                _ => trace!("ignored simple escape: ESC {}", command as char),
            },
            Token::Osc { .. } => trace!("OSC sequence consumed"),
            Token::CharsetEsc { .. } => trace!("charset designation consumed"),
        }
    }

    // ── Printable text ──────────────────────────────────────────────

    fn input_text(&mut self, text: &str) {
        let mut first = true;
        for segment in text.split('\n') {
            if !first {
                self.newline_scroll();
            }
            first = false;
            self.write_segment(segment);
        }
    }

    fn write_segment(&mut self, segment: &str) {
        for cluster in clusters(segment) {
            if cluster == "\t" {
                self.forward_tab(1);
                continue;
            }
            let w = cluster_width(cluster);
            if w == 0 {
                continue;
            }
            // Wrap exactly when the cluster does not fit; a wide cluster
            // at the last column moves to the next row whole.
            if self.cursor_col + w > self.width {
                self.newline_scroll();
            }
            self.put_cluster(cluster, w);
        }
    }

    fn put_cluster(&mut self, cluster: &str, w: usize) {
        let (row, col) = (self.cursor_row, self.cursor_col);
        let style = self.active;
        let line = self.grid.line_mut(row);
        // Blank first so a wide pair straddling the write is severed.
        line.fill_range(col, col + w, &Cell::blank());
        line.set(col, Cell::new(cluster, style));
        if w == 2 {
            line.set(col + 1, Cell::continuation(style));
        }
        self.tracker.touch(row);
        self.cursor_col += w;
        self.trim_excess();
    }

    /// Advance to the next row, column 0, scrolling the viewport when the
    /// cursor is on its last row.
    fn newline_scroll(&mut self) {
        if self.cursor_row >= self.viewport_bottom() {
            self.lines_off_screen += 1;
            self.cursor_row += 1;
            self.grid.ensure_row(self.cursor_row);
            self.touch_viewport();
            self.trim_excess();
        } else {
            self.cursor_row += 1;
        }
        self.cursor_col = 0;
    }

    fn forward_tab(&mut self, stops: usize) {
        let next = (self.cursor_col / 8 + stops) * 8;
        self.cursor_col = next.min(self.width - 1);
    }

    // ── Viewport geometry ───────────────────────────────────────────

    fn viewport_top(&self) -> usize {
        self.lines_off_screen
    }

    pub(crate) fn viewport_bottom(&self) -> usize {
        self.lines_off_screen + self.height - 1
    }

    /// Every cell in the viewport changed position on screen; mark all
    /// visible rows modified.
    fn touch_viewport(&mut self) {
        self.tracker
            .touch_range(self.viewport_top(), self.viewport_bottom());
    }

    /// Enforce the buffer cap, shifting all row-indexed state down in
    /// lockstep with the trimmed rows.
    fn trim_excess(&mut self) {
        let n = self.grid.excess();
        if n == 0 {
            return;
        }
        self.grid.trim_front(n);
        self.tracker.trim_front(n);
        self.lines_off_screen = self.lines_off_screen.saturating_sub(n);
        self.cursor_row = self.cursor_row.saturating_sub(n);
    }

    // ── CSI dispatch ────────────────────────────────────────────────

    fn dispatch_csi(&mut self, command: u8, params: &str) {
        match command {
            b'A' => {
                let n = p_one(params);
                self.cursor_row = self
                    .cursor_row
                    .saturating_sub(n)
                    .max(self.viewport_top());
            }
            b'B' => {
                let n = p_one(params);
                self.cursor_row = (self.cursor_row + n).min(self.viewport_bottom());
            }
            b'C' => {
                let n = p_one(params);
                self.cursor_col = (self.cursor_col + n).min(self.width - 1);
            }
            b'D' => {
                let n = p_one(params);
                self.cursor_col = self.cursor_col.min(self.width - 1).saturating_sub(n);
            }
            b'E' => {
                let n = p_one(params);
                self.cursor_row = (self.cursor_row + n).min(self.viewport_bottom());
                self.cursor_col = 0;
            }
            b'F' => {
                let n = p_one(params);
                self.cursor_row = self
                    .cursor_row
                    .saturating_sub(n)
                    .max(self.viewport_top());
                self.cursor_col = 0;
            }
            b'G' => {
                let col = p_one(params);
                self.cursor_col = (col - 1).min(self.width - 1);
            }
            b'H' | b'f' => {
                let (row, col) = two_params_one_based(params);
                self.cursor_row = (self.viewport_top() + row - 1).min(self.viewport_bottom());
                self.cursor_col = (col - 1).min(self.width - 1);
            }
            b'I' => {
                let n = p_one(params);
                self.forward_tab(n);
            }
            b'J' => self.erase_display(p_zero(params)),
            b'K' => self.erase_line(p_zero(params)),
            b'L' => self.insert_lines(p_one(params)),
            b'M' => self.delete_lines(p_one(params)),
            b'X' => self.erase_chars(p_one(params)),
            b'S' => self.scroll_up(p_one(params)),
            b'T' => self.scroll_down(p_one(params)),
            b'm' => {
                let codes = parse_params(params);
                self.active.apply_sgr(&codes);
            }
            b'h' | b'l' => {
                trace!("ignored mode change: {:?} {}", params, command as char);
            }
            b'n' => self.device_status_report(params),
            _ => {
                debug!(
                    "unhandled CSI: params={:?} final={}",
                    params, command as char
                );
            }
        }
    }

    // ── Erase ───────────────────────────────────────────────────────

    fn erase_display(&mut self, mode: usize) {
        let (top, bottom) = (self.viewport_top(), self.viewport_bottom());
        let (row, col) = (self.cursor_row, self.cursor_col);
        match mode {
            0 => {
                if let Some(line) = self.grid.get_line_mut(row) {
                    line.clear_range(col, self.width);
                    self.tracker.touch(row);
                }
                for r in (row + 1)..=bottom {
                    self.clear_row(r);
                }
            }
            1 => {
                for r in top..row {
                    self.clear_row(r);
                }
                if let Some(line) = self.grid.get_line_mut(row) {
                    line.clear_range(0, col + 1);
                    self.tracker.touch(row);
                }
            }
            2 => {
                for r in top..=bottom {
                    self.clear_row(r);
                }
            }
            _ => debug!("unhandled erase-display mode: {}", mode),
        }
    }

    fn clear_row(&mut self, row: usize) {
        if let Some(line) = self.grid.get_line_mut(row) {
            line.clear();
            self.tracker.touch(row);
        }
    }

    /// Erase within the cursor row.
    ///
    /// Mode 0 (cursor to end of line) stamps the active background onto
    /// the erased cells when it is non-default. This matches xterm but is
    /// not universal terminal behavior; callers who disagree can reset the
    /// background before erasing.
    fn erase_line(&mut self, mode: usize) {
        let (row, col) = (self.cursor_row, self.cursor_col);
        match mode {
            0 => {
                let template = if self.active.has_bg() {
                    Cell::blank_with_style(self.active.bg_only())
                } else {
                    Cell::blank()
                };
                let width = self.width;
                let stamps_bg = self.active.has_bg();
                let line = if stamps_bg {
                    Some(self.grid.line_mut(row))
                } else {
                    self.grid.get_line_mut(row)
                };
                if let Some(line) = line {
                    line.fill_range(col, width, &template);
                    self.tracker.touch(row);
                }
            }
            1 => {
                if let Some(line) = self.grid.get_line_mut(row) {
                    line.clear_range(0, col + 1);
                    self.tracker.touch(row);
                }
            }
            2 => self.clear_row(row),
            _ => debug!("unhandled erase-line mode: {}", mode),
        }
    }

    fn erase_chars(&mut self, n: usize) {
        let (row, col) = (self.cursor_row, self.cursor_col);
        if let Some(line) = self.grid.get_line_mut(row) {
            line.clear_range(col, col + n);
            self.tracker.touch(row);
        }
    }

    // ── Line insertion, deletion, scrolling ─────────────────────────

    fn insert_lines(&mut self, n: usize) {
        let bottom = self.viewport_bottom();
        self.grid.insert_blank_lines(self.cursor_row, n, bottom);
        self.touch_viewport();
    }

    fn delete_lines(&mut self, n: usize) {
        let bottom = self.viewport_bottom();
        self.grid.delete_lines(self.cursor_row, n, bottom);
        self.touch_viewport();
    }

    fn scroll_up(&mut self, n: usize) {
        self.lines_off_screen += n;
        // The cursor keeps its position on screen.
        self.cursor_row += n;
        self.grid.ensure_row(self.viewport_bottom());
        self.touch_viewport();
        self.trim_excess();
    }

    fn scroll_down(&mut self, n: usize) {
        let top = self.viewport_top();
        let bottom = self.viewport_bottom();
        self.grid.insert_blank_lines(top, n, bottom);
        self.touch_viewport();
    }

    // ── Save / restore, queries ─────────────────────────────────────

    fn save_cursor(&mut self) {
        let rel = self.cursor_row - self.lines_off_screen;
        self.saved_cursor = Some((self.cursor_col.min(self.width - 1), rel));
    }

    fn restore_cursor(&mut self) {
        if let Some((col, rel)) = self.saved_cursor {
            self.cursor_col = col.min(self.width - 1);
            self.cursor_row = (self.lines_off_screen + rel).min(self.viewport_bottom());
        }
    }

    fn device_status_report(&mut self, params: &str) {
        match params {
            "6" => {
                let row = self.cursor_row - self.lines_off_screen + 1;
                let col = self.cursor_col.min(self.width - 1) + 1;
                let reply = format!("\x1b[{};{}R", row, col);
                self.respond(reply.as_bytes());
            }
            "?10" => self.respond(b"\x1b]10;rgb:0000/0000/0000\x1b\\"),
            "?11" => self.respond(b"\x1b]11;rgb:FFFF/FFFF/FFFF\x1b\\"),
            _ => debug!("unhandled status report: {:?}", params),
        }
    }

    fn respond(&mut self, reply: &[u8]) {
        match &mut self.responder {
            Some(responder) => responder(reply),
            None => debug!("query reply dropped, no responder registered"),
        }
    }
}

/// Rewrite backspace and carriage return into their CSI equivalents.
fn preprocess(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for &byte in bytes {
        match byte {
            0x08 => out.extend_from_slice(b"\x1b[D"),
            0x0D => out.extend_from_slice(b"\x1b[G"),
            _ => out.push(byte),
        }
    }
    out
}

fn parse_params(params: &str) -> Vec<u16> {
    params
        .split(';')
        .map(|p| p.parse::<u16>().unwrap_or(0))
        .collect()
}

/// First numeric parameter, defaulting to 0 when absent or empty.
fn p_zero(params: &str) -> usize {
    params
        .split(';')
        .next()
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(0)
}

/// First numeric parameter, defaulting to 1 when absent, empty, or zero.
fn p_one(params: &str) -> usize {
    p_zero(params).max(1)
}

/// `"r;c"` with either side empty or zero defaulting to 1.
fn two_params_one_based(params: &str) -> (usize, usize) {
    let mut parts = params.split(';');
    let row = parts
        .next()
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    let col = parts
        .next()
        .and_then(|p| p.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);
    (row, col)
}
