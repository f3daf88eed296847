//! Byte-level escape sequence scanner.
//!
//! Scans input in a single pass and emits [`Token`]s. Byte classes follow
//! ECMA-48:
//! - CSI parameter bytes: 0x30–0x3F (digits, `;`, `:`, and the private
//!   markers `< = > ?`)
//! - CSI intermediate bytes: 0x20–0x2F
//! - CSI final byte: 0x40–0x7E
//!
//! The stream is single-shot: an escape truncated at end of input becomes
//! an `Invalid` token rather than suspended state to resume.

use crate::token::{c0, Token, ST};

/// Two-byte escapes recognized as `SimpleEsc`.
const SIMPLE_ESC_COMMANDS: &[u8] = b"78cDEHMNOZ=><12su";

const fn is_csi_param(byte: u8) -> bool {
    matches!(byte, 0x30..=0x3F)
}

const fn is_csi_intermediate(byte: u8) -> bool {
    matches!(byte, 0x20..=0x2F)
}

const fn is_csi_final(byte: u8) -> bool {
    matches!(byte, 0x40..=0x7E)
}

/// Tokenize `input` into an ordered sequence of tokens.
///
/// Never fails; malformed sequences become [`Token::Invalid`]. Adjacent
/// text runs are never combined, and concatenating `raw()` over the result
/// reproduces `input` byte for byte.
pub fn parse(input: &[u8]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < input.len() {
        if input[pos] != c0::ESC {
            let start = pos;
            while pos < input.len() && input[pos] != c0::ESC {
                pos += 1;
            }
            tokens.push(Token::Text(input[start..pos].to_vec()));
            continue;
        }

        match input.get(pos + 1) {
            None => {
                tokens.push(Token::Invalid(vec![c0::ESC]));
                pos += 1;
            }
            Some(b'[') => pos = lex_csi(input, pos, &mut tokens),
            Some(b']') => pos = lex_osc(input, pos, &mut tokens),
            Some(b'(') | Some(b')') | Some(b'#') => pos = lex_charset(input, pos, &mut tokens),
            Some(&byte) if SIMPLE_ESC_COMMANDS.contains(&byte) => {
                tokens.push(Token::SimpleEsc {
                    command: byte,
                    raw: input[pos..pos + 2].to_vec(),
                });
                pos += 2;
            }
            Some(_) => {
                // Unrecognized escape introducer: report the lone ESC and
                // rescan from the byte that follows it.
                tokens.push(Token::Invalid(vec![c0::ESC]));
                pos += 1;
            }
        }
    }

    tokens
}

/// Lex a CSI sequence starting at the ESC at `start`. Returns the position
/// after the consumed bytes.
fn lex_csi(input: &[u8], start: usize, tokens: &mut Vec<Token>) -> usize {
    let mut pos = start + 2;

    let params_start = pos;
    while pos < input.len() && is_csi_param(input[pos]) {
        pos += 1;
    }
    let params_end = pos;

    while pos < input.len() && is_csi_intermediate(input[pos]) {
        pos += 1;
    }

    match input.get(pos) {
        Some(&byte) if is_csi_final(byte) => {
            pos += 1;
            tokens.push(Token::Csi {
                command: byte,
                params: String::from_utf8_lossy(&input[params_start..params_end]).into_owned(),
                raw: input[start..pos].to_vec(),
            });
        }
        _ => {
            // Truncated, or interrupted by a byte outside every CSI class.
            // Report what was consumed; the offending byte (if any) is
            // rescanned as ordinary input.
            tokens.push(Token::Invalid(input[start..pos].to_vec()));
        }
    }

    pos
}

/// Lex an OSC sequence: `ESC ]` through BEL, 0x9C, or `ESC \`.
fn lex_osc(input: &[u8], start: usize, tokens: &mut Vec<Token>) -> usize {
    let mut pos = start + 2;

    while pos < input.len() {
        match input[pos] {
            c0::BEL | ST => {
                pos += 1;
                tokens.push(Token::Osc {
                    raw: input[start..pos].to_vec(),
                });
                return pos;
            }
            c0::ESC if input.get(pos + 1) == Some(&b'\\') => {
                pos += 2;
                tokens.push(Token::Osc {
                    raw: input[start..pos].to_vec(),
                });
                return pos;
            }
            _ => pos += 1,
        }
    }

    tokens.push(Token::Invalid(input[start..pos].to_vec()));
    pos
}

/// Lex `ESC (`, `ESC )`, or `ESC #` plus one selector byte.
fn lex_charset(input: &[u8], start: usize, tokens: &mut Vec<Token>) -> usize {
    if start + 2 < input.len() {
        tokens.push(Token::CharsetEsc {
            raw: input[start..start + 3].to_vec(),
        });
        start + 3
    } else {
        tokens.push(Token::Invalid(input[start..].to_vec()));
        input.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(input: &[u8]) -> Token {
        let mut tokens = parse(input);
        assert_eq!(tokens.len(), 1, "expected one token for {:?}", input);
        tokens.remove(0)
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_one(b"Hello"), Token::Text(b"Hello".to_vec()));
    }

    #[test]
    fn test_csi_sgr() {
        match parse_one(b"\x1b[1;31;44m") {
            Token::Csi {
                command,
                params,
                raw,
            } => {
                assert_eq!(command, b'm');
                assert_eq!(params, "1;31;44");
                assert_eq!(raw, b"\x1b[1;31;44m");
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_no_params() {
        match parse_one(b"\x1b[H") {
            Token::Csi {
                command, params, ..
            } => {
                assert_eq!(command, b'H');
                assert_eq!(params, "");
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_private_marker_lands_in_params() {
        match parse_one(b"\x1b[?25h") {
            Token::Csi {
                command, params, ..
            } => {
                assert_eq!(command, b'h');
                assert_eq!(params, "?25");
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_csi_with_intermediate() {
        match parse_one(b"\x1b[0 q") {
            Token::Csi {
                command, params, ..
            } => {
                assert_eq!(command, b'q');
                assert_eq!(params, "0");
            }
            other => panic!("expected Csi, got {:?}", other),
        }
    }

    #[test]
    fn test_osc_bel_terminated() {
        assert_eq!(
            parse_one(b"\x1b]0;My Title\x07"),
            Token::Osc {
                raw: b"\x1b]0;My Title\x07".to_vec()
            }
        );
    }

    #[test]
    fn test_osc_st_terminated() {
        assert_eq!(
            parse_one(b"\x1b]2;Window Title\x1b\\"),
            Token::Osc {
                raw: b"\x1b]2;Window Title\x1b\\".to_vec()
            }
        );
    }

    #[test]
    fn test_simple_esc() {
        assert_eq!(
            parse_one(b"\x1b7"),
            Token::SimpleEsc {
                command: b'7',
                raw: b"\x1b7".to_vec()
            }
        );
        assert_eq!(
            parse_one(b"\x1b8"),
            Token::SimpleEsc {
                command: b'8',
                raw: b"\x1b8".to_vec()
            }
        );
    }

    #[test]
    fn test_charset_esc() {
        assert_eq!(
            parse_one(b"\x1b(B"),
            Token::CharsetEsc {
                raw: b"\x1b(B".to_vec()
            }
        );
        assert_eq!(
            parse_one(b"\x1b#8"),
            Token::CharsetEsc {
                raw: b"\x1b#8".to_vec()
            }
        );
    }

    #[test]
    fn test_mixed_stream_order() {
        let tokens = parse(b"ab\x1b[1mcd\x1b7ef");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0], Token::Text(b"ab".to_vec()));
        assert!(tokens[1].is_csi());
        assert_eq!(tokens[2], Token::Text(b"cd".to_vec()));
        assert!(matches!(tokens[3], Token::SimpleEsc { command: b'7', .. }));
        assert_eq!(tokens[4], Token::Text(b"ef".to_vec()));
    }

    #[test]
    fn test_truncated_csi() {
        assert_eq!(parse_one(b"\x1b[1;3"), Token::Invalid(b"\x1b[1;3".to_vec()));
    }

    #[test]
    fn test_truncated_osc() {
        assert_eq!(
            parse_one(b"\x1b]0;abc"),
            Token::Invalid(b"\x1b]0;abc".to_vec())
        );
    }

    #[test]
    fn test_truncated_charset() {
        assert_eq!(parse_one(b"\x1b("), Token::Invalid(b"\x1b(".to_vec()));
    }

    #[test]
    fn test_lone_esc_at_end() {
        assert_eq!(parse_one(b"\x1b"), Token::Invalid(b"\x1b".to_vec()));
    }

    #[test]
    fn test_unknown_escape_reports_lone_esc() {
        let tokens = parse(b"\x1bqrest");
        assert_eq!(tokens[0], Token::Invalid(b"\x1b".to_vec()));
        assert_eq!(tokens[1], Token::Text(b"qrest".to_vec()));
    }

    #[test]
    fn test_csi_interrupted_by_control_byte() {
        // BEL is outside every CSI byte class; the prefix is reported and
        // the BEL rescans as text.
        let tokens = parse(b"\x1b[1;\x07x");
        assert_eq!(tokens[0], Token::Invalid(b"\x1b[1;".to_vec()));
        assert_eq!(tokens[1], Token::Text(b"\x07x".to_vec()));
    }

    #[test]
    fn test_text_runs_never_combined_across_escapes() {
        let tokens = parse(b"a\x1b[mb");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0], Token::Text(b"a".to_vec()));
        assert_eq!(tokens[2], Token::Text(b"b".to_vec()));
    }

    #[test]
    fn test_lossless_roundtrip() {
        let inputs: &[&[u8]] = &[
            b"plain",
            b"\x1b[1;32mWorld!\x1b[0m",
            b"\x1b]0;title\x07body\x1b[2J\x1b7\x1b8",
            b"\x1b[5;10H\x1b(0lq\x1b(Bdone",
            b"bad\x1bZ\x1bq\x1b",
            b"\x1b[1;3",
            b"\x1b]unterminated",
            b"utf8: \xe4\xb8\x96\xe7\x95\x8c \x1b[31m\xf0\x9f\x8e\x89\x1b[0m",
        ];
        for input in inputs {
            let rebuilt: Vec<u8> = parse(input)
                .iter()
                .flat_map(|t| t.raw().to_vec())
                .collect();
            assert_eq!(&rebuilt, input, "roundtrip failed for {:?}", input);
        }
    }
}
