//! Viewport snapshots for testing and debugging.
//!
//! Snapshots capture the visible grid in a serializable form so tests can
//! assert on terminal state deterministically and failures can be diffed
//! as JSON.

use serde::{Deserialize, Serialize};

use crate::cell::CellStyle;
use crate::engine::Engine;

/// A snapshot of the viewport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: usize,
    pub cols: usize,
    /// Viewport content in row-major order.
    pub cells: Vec<Vec<CellSnapshot>>,
    /// Cursor position relative to the viewport.
    pub cursor_row: usize,
    pub cursor_col: usize,
    pub lines_off_screen: usize,
}

/// Snapshot of a single cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSnapshot {
    pub cluster: String,
    pub style: CellStyle,
}

impl Snapshot {
    pub fn from_engine(engine: &Engine) -> Self {
        let rows = engine.height();
        let cols = engine.width();
        let cells = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let cell = engine.viewport_cell(row, col);
                        CellSnapshot {
                            cluster: cell.cluster,
                            style: cell.style,
                        }
                    })
                    .collect()
            })
            .collect();

        let (row, col) = engine.cursor();
        Snapshot {
            rows,
            cols,
            cells,
            cursor_row: row - engine.lines_off_screen(),
            cursor_col: col,
            lines_off_screen: engine.lines_off_screen(),
        }
    }

    /// Text content of a viewport row: clusters joined, continuation cells
    /// skipped, trailing whitespace trimmed.
    pub fn row_text(&self, row: usize) -> String {
        match self.cells.get(row) {
            Some(cells) => cells
                .iter()
                .map(|cell| cell.cluster.as_str())
                .collect::<String>()
                .trim_end()
                .to_string(),
            None => String::new(),
        }
    }

    /// All rows joined with newlines.
    pub fn text(&self) -> String {
        (0..self.rows)
            .map(|row| self.row_text(row))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Text-only snapshot for golden assertions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSnapshot {
    pub rows: Vec<String>,
    pub cursor_row: usize,
    pub cursor_col: usize,
}

impl TextSnapshot {
    pub fn from_engine(engine: &Engine) -> Self {
        let snapshot = Snapshot::from_engine(engine);
        TextSnapshot {
            rows: (0..snapshot.rows).map(|r| snapshot.row_text(r)).collect(),
            cursor_row: snapshot.cursor_row,
            cursor_col: snapshot.cursor_col,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_text() {
        let mut engine = Engine::new(10, 3);
        engine.write(b"Hello\nWorld");
        let snapshot = Snapshot::from_engine(&engine);
        assert_eq!(snapshot.row_text(0), "Hello");
        assert_eq!(snapshot.row_text(1), "World");
        assert_eq!(snapshot.row_text(2), "");
        assert_eq!(snapshot.row_text(9), "");
    }

    #[test]
    fn test_text_joins_rows() {
        let mut engine = Engine::new(10, 2);
        engine.write(b"a\nb");
        assert_eq!(Snapshot::from_engine(&engine).text(), "a\nb");
    }

    #[test]
    fn test_wide_cluster_text() {
        let mut engine = Engine::new(10, 1);
        engine.write("世x".as_bytes());
        assert_eq!(Snapshot::from_engine(&engine).row_text(0), "世x");
    }

    #[test]
    fn test_cursor_is_viewport_relative() {
        let mut engine = Engine::new(10, 2);
        engine.write(b"a\nb\nc");
        let snapshot = Snapshot::from_engine(&engine);
        assert_eq!(snapshot.lines_off_screen, 1);
        assert_eq!(snapshot.cursor_row, 1);
        assert_eq!(snapshot.cursor_col, 1);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut engine = Engine::new(8, 2);
        engine.write(b"\x1b[1;31mhi");
        let snapshot = Snapshot::from_engine(&engine);
        let restored = Snapshot::from_json(&snapshot.to_json()).unwrap();
        assert_eq!(snapshot, restored);
    }

    #[test]
    fn test_text_snapshot_json_roundtrip() {
        let mut engine = Engine::new(8, 2);
        engine.write(b"ab\ncd");
        let snapshot = TextSnapshot::from_engine(&engine);
        let restored = TextSnapshot::from_json(&snapshot.to_json()).unwrap();
        assert_eq!(snapshot, restored);
    }
}
