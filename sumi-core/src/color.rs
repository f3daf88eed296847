//! Terminal color representation
//!
//! Supports:
//! - Basic ANSI colors, referenced by their literal SGR parameter
//!   (30–37 / 90–97 for foreground, 40–47 / 100–107 for background)
//! - 256-color indexed palette
//! - 24-bit true color (RGB)
//!
//! Basic and extended colors are tracked separately: a cell's foreground is
//! either a basic SGR code or an extended color, never both.

use serde::{Deserialize, Serialize};

/// Extended color introduced by SGR 38 (foreground) / 48 (background).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtendedColor {
    /// 256-color palette index.
    Palette(u8),
    /// 24-bit RGB color.
    Rgb(u8, u8, u8),
}

impl ExtendedColor {
    /// SGR parameter string under the given selector (38 or 48):
    /// `38;5;n` for palette entries, `38;2;r;g;b` for RGB.
    pub fn sgr_params(&self, selector: u8) -> String {
        match self {
            ExtendedColor::Palette(n) => format!("{};5;{}", selector, n),
            ExtendedColor::Rgb(r, g, b) => format!("{};2;{};{};{}", selector, r, g, b),
        }
    }
}

/// Whether `code` names a basic foreground color (30–37, 90–97).
pub fn is_basic_fg(code: u16) -> bool {
    matches!(code, 30..=37 | 90..=97)
}

/// Whether `code` names a basic background color (40–47, 100–107).
pub fn is_basic_bg(code: u16) -> bool {
    matches!(code, 40..=47 | 100..=107)
}
