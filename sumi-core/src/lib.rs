//! Sumi virtual terminal core
//!
//! An in-memory terminal that other ANSI-speaking programs can safely
//! write into. Bytes go in through [`Engine::write`]; the engine keeps a
//! fixed-size viewport over a growing cell buffer, interpreting cursor
//! motion, wrapping, scrolling, erasure, and SGR styling. Rendering reads
//! the state back out as minimal ANSI:
//! - [`Engine::render`]: the full viewport in a relative, embeddable form
//! - [`Engine::render_since`]: only the rows changed since a checkpoint
//! - [`CellBuffer::diff_render`]: a cell-level diff between two frames
//!
//! A host TUI composes sub-program output through an engine so that, for
//! example, a child's "clear screen" clears its panel and nothing else,
//! while frame-rate updates write only what actually changed.
//!
//! This crate performs no I/O and has no platform dependencies; bytes are
//! passed in and returned by value. An engine is a unit of exclusive
//! mutation; wrap it in a lock if shared across threads.

pub mod buffer;
pub mod cell;
pub mod color;
pub mod engine;
pub mod grid;
pub mod motion;
mod renderer;
pub mod sgr;
pub mod snapshot;
pub mod tracker;
pub mod width;

pub use buffer::CellBuffer;
pub use cell::{Cell, CellStyle, StyleFlags};
pub use color::ExtendedColor;
pub use engine::Engine;
pub use grid::{Grid, Line, MAX_BUFFER_ROWS};
pub use motion::CursorTracker;
pub use sgr::StyleTracker;
pub use snapshot::{Snapshot, TextSnapshot};
pub use tracker::ChangeTracker;
