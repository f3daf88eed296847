//! Sumi escape-sequence tokenizer
//!
//! This crate turns a byte stream containing printable text and ANSI/VT
//! escape sequences into an ordered sequence of [`Token`]s:
//! - Text runs (everything between escapes)
//! - CSI sequences with their command byte and raw parameter string
//! - OSC sequences (consumed whole, up to BEL or ST)
//! - Two-byte escapes such as `ESC 7` / `ESC 8`
//! - Charset designations (`ESC (`, `ESC )`, `ESC #`)
//! - Malformed or truncated escapes, reported as `Invalid`
//!
//! The tokenizer is lossless: concatenating the raw bytes of every token
//! reproduces the input exactly. It never fails; malformed input degrades
//! to `Invalid` tokens that callers can pass through as text.
//!
//! Parameter content is not interpreted here. The params of `\x1b[1;31m`
//! are the literal string `"1;31"`; numeric defaulting is the consumer's
//! concern.

pub mod parser;
pub mod token;

pub use parser::parse;
pub use token::Token;
