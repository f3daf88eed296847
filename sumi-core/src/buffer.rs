//! Unified double-buffered cell view.
//!
//! `CellBuffer` projects the engine's viewport into a plain per-cell array
//! for value-based comparison: a front buffer holding the current frame
//! and a back buffer holding the previous one. `diff_render` walks the two
//! and emits updates only for cells whose `(cluster, style)` changed,
//! positioning with the cursor optimizer and styling with minimal SGR
//! deltas.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::engine::Engine;
use crate::motion::CursorTracker;
use crate::sgr::StyleTracker;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CellBuffer {
    width: usize,
    height: usize,
    front: Vec<Vec<Cell>>,
    back: Vec<Vec<Cell>>,
}

impl CellBuffer {
    pub(crate) fn from_engine(engine: &Engine) -> Self {
        let width = engine.width();
        let height = engine.height();
        let front = (0..height)
            .map(|row| (0..width).map(|col| engine.viewport_cell(row, col)).collect())
            .collect();
        let back = vec![vec![Cell::blank(); width]; height];
        CellBuffer {
            width,
            height,
            front,
            back,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Cell in the current (front) frame.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        &self.front[row][col]
    }

    /// Exchange the front and back frames. Typically called after a diff
    /// render so the presented frame becomes the comparison base.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.front, &mut self.back);
    }

    /// Refill the front frame from the engine's current viewport.
    ///
    /// # Panics
    ///
    /// Panics if the engine's dimensions differ from this buffer's.
    pub fn capture(&mut self, engine: &Engine) {
        assert_eq!(
            (engine.width(), engine.height()),
            (self.width, self.height),
            "engine dimensions changed under the buffer"
        );
        for (row, line) in self.front.iter_mut().enumerate() {
            for (col, cell) in line.iter_mut().enumerate() {
                *cell = engine.viewport_cell(row, col);
            }
        }
    }

    /// Emit updates for every cell that differs between the front and back
    /// frames, offset by `(base_row, base_col)` for rendering inside a
    /// larger display. Ends with a style reset if any style was emitted.
    pub fn diff_render(&self, base_row: usize, base_col: usize) -> Vec<u8> {
        let mut out = String::new();
        let mut cursor = CursorTracker::new();
        let mut styles = StyleTracker::new();

        for row in 0..self.height {
            for col in 0..self.width {
                let cell = &self.front[row][col];
                if *cell == self.back[row][col] {
                    continue;
                }
                if cell.is_continuation() {
                    // Repainted together with the wide cluster to its left.
                    continue;
                }
                out.push_str(&cursor.move_to(base_row + row, base_col + col));
                out.push_str(&styles.transition(&cell.style));
                out.push_str(&cell.cluster);
                cursor.advance(cell.width());
            }
        }

        out.push_str(&styles.reset());
        out.into_bytes()
    }

    /// Hash of a front-frame row, for cheap row-level comparison.
    pub fn row_hash(&self, row: usize) -> u64 {
        let mut hasher = FxHasher::default();
        self.front[row].hash(&mut hasher);
        hasher.finish()
    }

    /// Whether `row` holds identical cells in this buffer's and `other`'s
    /// front frames.
    pub fn row_equals(&self, row: usize, other: &CellBuffer) -> bool {
        self.front.get(row) == other.front.get(row)
    }
}
