//! Terminal cell representation
//!
//! A cell is a single column position in the grid. Each cell contains:
//! - A grapheme cluster (possibly multi-byte; empty marks the continuation
//!   half of a wide cluster)
//! - A style: decoration bitmask plus basic and extended colors
//!
//! The same style record doubles as the engine's "active" style: the
//! snapshot stamped onto every newly written cell.

use serde::{Deserialize, Serialize};

use crate::color::{is_basic_fg, is_basic_bg, ExtendedColor};

/// Bitmask over the nine SGR decoration codes (1–9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StyleFlags {
    bits: u16,
}

impl StyleFlags {
    pub const NONE: u16 = 0;
    pub const BOLD: u16 = 1 << 0; // SGR 1
    pub const DIM: u16 = 1 << 1; // SGR 2
    pub const ITALIC: u16 = 1 << 2; // SGR 3
    pub const UNDERLINE: u16 = 1 << 3; // SGR 4
    pub const BLINK: u16 = 1 << 4; // SGR 5
    pub const RAPID_BLINK: u16 = 1 << 5; // SGR 6
    pub const INVERSE: u16 = 1 << 6; // SGR 7
    pub const HIDDEN: u16 = 1 << 7; // SGR 8
    pub const STRIKETHROUGH: u16 = 1 << 8; // SGR 9

    pub const fn empty() -> Self {
        StyleFlags { bits: Self::NONE }
    }

    pub const fn new(bits: u16) -> Self {
        StyleFlags { bits }
    }

    pub fn contains(&self, flag: u16) -> bool {
        self.bits & flag != 0
    }

    pub fn insert(&mut self, flag: u16) {
        self.bits |= flag;
    }

    pub fn remove(&mut self, flag: u16) {
        self.bits &= !flag;
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// The flag bit for an SGR enable code (1–9), if any.
    pub fn from_sgr(code: u16) -> Option<u16> {
        if (1..=9).contains(&code) {
            Some(1 << (code - 1))
        } else {
            None
        }
    }

    /// The SGR enable codes (1–9) for every set bit, in ascending order.
    pub fn sgr_codes(&self) -> impl Iterator<Item = u16> + '_ {
        (1..=9u16).filter(|code| self.bits & (1 << (code - 1)) != 0)
    }
}

/// A complete style: decorations plus foreground/background color state.
///
/// `fg`/`fg_ext` are mutually exclusive (likewise `bg`/`bg_ext`); setting
/// one side clears the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CellStyle {
    pub flags: StyleFlags,
    /// Basic foreground as its SGR code (30–37, 90–97).
    pub fg: Option<u8>,
    /// Basic background as its SGR code (40–47, 100–107).
    pub bg: Option<u8>,
    pub fg_ext: Option<ExtendedColor>,
    pub bg_ext: Option<ExtendedColor>,
}

impl CellStyle {
    pub fn is_default(&self) -> bool {
        *self == CellStyle::default()
    }

    pub fn reset(&mut self) {
        *self = CellStyle::default();
    }

    pub fn has_fg(&self) -> bool {
        self.fg.is_some() || self.fg_ext.is_some()
    }

    pub fn has_bg(&self) -> bool {
        self.bg.is_some() || self.bg_ext.is_some()
    }

    /// A style carrying only this style's background, as stamped onto
    /// cells erased to end of line.
    pub fn bg_only(&self) -> CellStyle {
        CellStyle {
            bg: self.bg,
            bg_ext: self.bg_ext,
            ..CellStyle::default()
        }
    }

    /// Apply a full SGR parameter list, left to right.
    ///
    /// Codes 38/48 consume their extended-color arguments (`5;n` or
    /// `2;r;g;b`); a malformed extended selector discards the remainder of
    /// the list. Unknown codes are ignored.
    pub fn apply_sgr(&mut self, codes: &[u16]) {
        let mut i = 0;
        while i < codes.len() {
            let code = codes[i];
            match code {
                0 => self.reset(),
                1..=9 => {
                    if let Some(flag) = StyleFlags::from_sgr(code) {
                        self.flags.insert(flag);
                    }
                }
                22 => {
                    self.flags.remove(StyleFlags::BOLD);
                    self.flags.remove(StyleFlags::DIM);
                }
                23..=29 => {
                    // Disable codes mirror enable codes 3..=9.
                    if let Some(flag) = StyleFlags::from_sgr(code - 20) {
                        self.flags.remove(flag);
                    }
                }
                30..=37 | 90..=97 => {
                    self.fg = Some(code as u8);
                    self.fg_ext = None;
                }
                39 => {
                    self.fg = None;
                    self.fg_ext = None;
                }
                40..=47 | 100..=107 => {
                    self.bg = Some(code as u8);
                    self.bg_ext = None;
                }
                49 => {
                    self.bg = None;
                    self.bg_ext = None;
                }
                38 | 48 => {
                    let Some((color, consumed)) = parse_extended_color(&codes[i..]) else {
                        return;
                    };
                    if code == 38 {
                        self.fg_ext = Some(color);
                        self.fg = None;
                    } else {
                        self.bg_ext = Some(color);
                        self.bg = None;
                    }
                    i += consumed - 1;
                }
                _ => {}
            }
            i += 1;
        }

        debug_assert!(!(self.fg.is_some() && self.fg_ext.is_some()));
        debug_assert!(!(self.bg.is_some() && self.bg_ext.is_some()));
        debug_assert!(self.fg.map_or(true, |c| is_basic_fg(c as u16)));
        debug_assert!(self.bg.map_or(true, |c| is_basic_bg(c as u16)));
    }
}

/// Parse a `38;5;n` / `38;2;r;g;b` run (or the 48 equivalents) starting at
/// the selector. Returns the color and the number of codes consumed.
fn parse_extended_color(codes: &[u16]) -> Option<(ExtendedColor, usize)> {
    match codes.get(1) {
        Some(5) => codes
            .get(2)
            .map(|&n| (ExtendedColor::Palette(n as u8), 3)),
        Some(2) if codes.len() >= 5 => Some((
            ExtendedColor::Rgb(codes[2] as u8, codes[3] as u8, codes[4] as u8),
            5,
        )),
        _ => None,
    }
}

/// A single cell in the terminal grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// The grapheme cluster stored in this cell. Empty marks the
    /// continuation (right) half of a wide cluster.
    pub cluster: String,
    pub style: CellStyle,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            cluster: String::from(" "),
            style: CellStyle::default(),
        }
    }
}

impl Cell {
    pub fn new(cluster: &str, style: CellStyle) -> Self {
        Cell {
            cluster: cluster.to_string(),
            style,
        }
    }

    /// A blank cell: space cluster, no decorations, no colors.
    pub fn blank() -> Self {
        Cell::default()
    }

    /// A blank cell carrying only a background, as produced by
    /// background-stamped erasure.
    pub fn blank_with_style(style: CellStyle) -> Self {
        Cell {
            cluster: String::from(" "),
            style,
        }
    }

    /// The continuation half of a wide cluster; mirrors the style of the
    /// cluster to its left.
    pub fn continuation(style: CellStyle) -> Self {
        Cell {
            cluster: String::new(),
            style,
        }
    }

    pub fn is_continuation(&self) -> bool {
        self.cluster.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.cluster == " " && self.style.is_default()
    }

    /// Display width of this cell's cluster: 0 for a continuation cell,
    /// 2 for a wide cluster, otherwise 1.
    pub fn width(&self) -> usize {
        if self.cluster.is_empty() {
            0
        } else {
            crate::width::cluster_width(&self.cluster)
        }
    }

    pub fn reset(&mut self) {
        self.cluster.clear();
        self.cluster.push(' ');
        self.style.reset();
    }
}
