// zxtap - A ZX Spectrum BASIC tokenizer creating TAP and TZX tape images
// Copyright (C) 2026  Marcel Joachim Kloubert <marcel@kloubert.dev>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Brace escape sequences.
//!
//! Authors write characters that have no ASCII spelling as `{...}`:
//! - `{(C)}`, `{CODE}`, `{CAT}` for special characters
//! - `{A}` to `{U}` for user defined graphics
//! - `{-1}` to `{-8}` and `{+1}` to `{+8}` for block graphics
//! - `{7F}` for any byte in hex
//! - `{INK 2}`, `{AT 5 10}` and friends for embedded control codes

use super::grammar::GrammarValidator;
use super::helpers::ScanHelpers;
use super::line::LineScanner;
use super::state::Dialect;
use super::tokens::{BLOCK_GRAPHICS, SHIFTED_BLOCK_GRAPHICS, UDG_A};
use crate::error::{ErrorCode, Result};

/// An unclosed `{` is only an error when at least this many bytes follow.
const UNCLOSED_LIMIT: usize = 10;

/// An expanded escape sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceMatch {
    pub bytes: Vec<u8>,
    /// Bytes consumed from the input, braces included.
    pub length: usize,
}

impl SequenceMatch {
    fn new(bytes: Vec<u8>, length: usize) -> Self {
        Self { bytes, length }
    }
}

/// An embedded control code and its parameter limits.
struct ControlCode {
    name: &'static str,
    byte: u8,
    /// Inclusive upper bound of each parameter. All lower bounds are zero.
    limits: &'static [i64],
    print_only: bool,
}

static CONTROL_CODES: [ControlCode; 8] = [
    ControlCode { name: "INK", byte: 0x10, limits: &[7], print_only: false },
    ControlCode { name: "PAPER", byte: 0x11, limits: &[7], print_only: false },
    ControlCode { name: "FLASH", byte: 0x12, limits: &[1], print_only: false },
    ControlCode { name: "BRIGHT", byte: 0x13, limits: &[1], print_only: false },
    ControlCode { name: "INVERSE", byte: 0x14, limits: &[1], print_only: false },
    ControlCode { name: "OVER", byte: 0x15, limits: &[1], print_only: false },
    ControlCode { name: "AT", byte: 0x16, limits: &[23, 31], print_only: true },
    ControlCode { name: "TAB", byte: 0x17, limits: &[31], print_only: true },
];

fn control_code(name: &str) -> Option<&'static ControlCode> {
    CONTROL_CODES.iter().find(|code| code.name == name)
}

fn parameter_name(code: &ControlCode, index: usize) -> &'static str {
    match (code.name, index) {
        ("AT", 0) => "row",
        ("AT", _) => "column",
        ("TAB", _) => "position",
        ("INK" | "PAPER", _) => "colour",
        _ => "value",
    }
}

/// Trait for escape sequence expansion.
pub trait SequenceExpander {
    /// Expand the escape sequence at the start of `text`.
    ///
    /// Returns `Ok(None)` when `text` does not start with a valid escape; the
    /// caller then copies the brace literally. With `strip_spaces` set, spaces
    /// following the sequence are consumed as well.
    fn expand_sequence(&mut self, text: &[u8], strip_spaces: bool) -> Result<Option<SequenceMatch>>;

    /// Expand at the current position and write the result.
    /// Returns `false` if there is no escape here.
    fn scan_sequence(&mut self, strip_spaces: bool) -> Result<bool>;
}

impl<'src> SequenceExpander for LineScanner<'src> {
    fn expand_sequence(&mut self, text: &[u8], strip_spaces: bool) -> Result<Option<SequenceMatch>> {
        if text.first() != Some(&b'{') {
            return Ok(None);
        }

        let Some(end) = text.iter().position(|&b| b == b'}') else {
            if text.len() > UNCLOSED_LIMIT {
                return Err(self
                    .error(ErrorCode::UnclosedSequence, "Unclosed sequence")
                    .with_hint("close the escape sequence with '}'"));
            }
            return Ok(None);
        };

        // Bounded by ASCII braces, so this only fails on invalid input bytes
        let Ok(content) = std::str::from_utf8(&text[1..end]) else {
            return Ok(None);
        };
        if content.is_empty() {
            return Ok(None);
        }

        let length = end + 1;
        let bytes = match special_character(content) {
            Some(byte) => Some(vec![byte]),
            None => match self.user_graphic(content)? {
                Some(byte) => Some(vec![byte]),
                None => match block_graphic(content).or_else(|| hex_byte(content)) {
                    Some(byte) => Some(vec![byte]),
                    None => self.control_sequence(content)?,
                },
            },
        };

        Ok(bytes.map(|bytes| {
            let mut length = length;
            if strip_spaces {
                length += text[length..].iter().take_while(|&&b| b == b' ').count();
            }
            SequenceMatch::new(bytes, length)
        }))
    }

    fn scan_sequence(&mut self, strip_spaces: bool) -> Result<bool> {
        let text = self.remaining();
        match self.expand_sequence(text, strip_spaces)? {
            Some(found) => {
                self.emit_all(&found.bytes);
                self.advance_by(found.length);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn special_character(content: &str) -> Option<u8> {
    match content.to_ascii_uppercase().as_str() {
        "(C)" => Some(0x7F),
        "CODE" => Some(0xAF),
        "CAT" => Some(0xCF),
        _ => None,
    }
}

fn block_graphic(content: &str) -> Option<u8> {
    let &[sign, digit] = content.as_bytes() else {
        return None;
    };
    if !(b'1'..=b'8').contains(&digit) {
        return None;
    }
    let n = (digit - b'0') % 8;
    match sign {
        b'+' => Some(SHIFTED_BLOCK_GRAPHICS + (n ^ 7)),
        b'-' => Some(BLOCK_GRAPHICS + n),
        _ => None,
    }
}

fn hex_byte(content: &str) -> Option<u8> {
    if content.len() != 2 || !content.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(content, 16).ok()
}

impl<'src> LineScanner<'src> {
    fn user_graphic(&mut self, content: &str) -> Result<Option<u8>> {
        let &[letter] = content.as_bytes() else {
            return Ok(None);
        };
        let letter = letter.to_ascii_uppercase();
        if !(b'A'..=b'U').contains(&letter) {
            return Ok(None);
        }

        if letter == b'T' || letter == b'U' {
            self.update_dialect(
                Dialect::Only48K,
                &format!("UDG '{}' is not available on the 128K", letter as char),
            )?;
        }

        Ok(Some(UDG_A + (letter - b'A')))
    }

    fn control_sequence(&mut self, content: &str) -> Result<Option<Vec<u8>>> {
        let mut parts = content.split_whitespace();
        let Some(name) = parts.next() else {
            return Ok(None);
        };
        let name = name.to_ascii_uppercase();
        let code = control_code(&name);

        let mut params = Vec::new();
        for part in parts {
            let Ok(value) = part.parse::<i64>() else {
                return Ok(None);
            };

            let Some(code) = code else {
                return Err(self
                    .error(
                        ErrorCode::UnknownControlCode,
                        format!("Unknown control sequence: {}", name),
                    )
                    .with_hint("known control codes are INK, PAPER, FLASH, BRIGHT, INVERSE, OVER, AT and TAB"));
            };

            let index = params.len();
            let Some(&limit) = code.limits.get(index) else {
                return Err(self.error(
                    ErrorCode::ControlParameterCount,
                    parameter_count_message(code),
                ));
            };
            if !(0..=limit).contains(&value) {
                return Err(self.error(
                    ErrorCode::ControlParameterOutOfRange,
                    format!(
                        "{} {} must be between 0 and {}",
                        code.name,
                        parameter_name(code, index),
                        limit
                    ),
                ));
            }
            params.push(value);
        }

        if !params.is_empty() {
            self.state.pending_params.clear();
            self.state.pending_params.extend_from_slice(&params);
        }

        let Some(code) = code else {
            return Ok(None);
        };

        if code.print_only && !self.state.in_print {
            return Err(self.error(
                ErrorCode::PrintOnlyOutsidePrint,
                format!("{} only allowed in PRINT statements", code.name),
            ));
        }
        if params.len() != code.limits.len() {
            return Err(self.error(
                ErrorCode::ControlParameterCount,
                parameter_count_message(code),
            ));
        }

        let mut bytes = Vec::with_capacity(params.len() + 1);
        bytes.push(code.byte);
        bytes.extend(params.iter().map(|&value| value as u8));
        Ok(Some(bytes))
    }
}

fn parameter_count_message(code: &ControlCode) -> String {
    match code.limits.len() {
        1 => format!("{} requires one parameter", code.name),
        _ => format!("{} requires row and column parameters", code.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenizerOptions;

    fn scanner() -> LineScanner<'static> {
        LineScanner::new(b"", 1, TokenizerOptions::default())
    }

    fn expand(text: &str) -> Option<SequenceMatch> {
        scanner().expand_sequence(text.as_bytes(), false).unwrap()
    }

    fn expand_in_print(text: &str) -> Result<Option<SequenceMatch>> {
        let mut scanner = scanner();
        scanner.state.in_print = true;
        scanner.expand_sequence(text.as_bytes(), false)
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(expand("{(C)}"), Some(SequenceMatch::new(vec![0x7F], 5)));
        assert_eq!(expand("{(c)}"), Some(SequenceMatch::new(vec![0x7F], 5)));
        assert_eq!(expand("{CODE}"), Some(SequenceMatch::new(vec![0xAF], 6)));
        assert_eq!(expand("{cat}"), Some(SequenceMatch::new(vec![0xCF], 5)));
    }

    #[test]
    fn test_user_graphics() {
        assert_eq!(expand("{A}").unwrap().bytes, vec![0x90]);
        assert_eq!(expand("{s}").unwrap().bytes, vec![0xA2]);
        assert_eq!(expand("{V}"), None);
    }

    #[test]
    fn test_user_graphics_mark_48k() {
        let mut scanner = scanner();
        let found = scanner.expand_sequence(b"{T}", false).unwrap().unwrap();
        assert_eq!(found.bytes, vec![0xA3]);
        assert_eq!(scanner.dialect, Dialect::Only48K);
    }

    #[test]
    fn test_user_graphics_conflict_with_128k() {
        let mut scanner = scanner();
        scanner.dialect = Dialect::Only128K;
        let err = scanner.expand_sequence(b"{U}", false).unwrap_err();
        assert_eq!(err.code, ErrorCode::MixedDialect);
    }

    #[test]
    fn test_block_graphics() {
        assert_eq!(expand("{-1}").unwrap().bytes, vec![0x81]);
        assert_eq!(expand("{-8}").unwrap().bytes, vec![0x80]);
        assert_eq!(expand("{+1}").unwrap().bytes, vec![0x8E]);
        assert_eq!(expand("{+8}").unwrap().bytes, vec![0x8F]);
        assert_eq!(expand("{+7}").unwrap().bytes, vec![0x88]);
        assert_eq!(expand("{+9}"), None);
    }

    #[test]
    fn test_hex_bytes() {
        assert_eq!(expand("{7F}").unwrap().bytes, vec![0x7F]);
        assert_eq!(expand("{00}").unwrap().bytes, vec![0x00]);
        assert_eq!(expand("{ab}").unwrap().bytes, vec![0xAB]);
        assert_eq!(expand("{GG}"), None);
    }

    #[test]
    fn test_control_codes() {
        assert_eq!(expand("{INK 2}").unwrap().bytes, vec![0x10, 2]);
        assert_eq!(expand("{paper 7}").unwrap().bytes, vec![0x11, 7]);
        assert_eq!(expand("{OVER 1}").unwrap().bytes, vec![0x15, 1]);
        assert_eq!(
            expand_in_print("{AT 5 10}").unwrap().unwrap().bytes,
            vec![0x16, 5, 10]
        );
        assert_eq!(
            expand_in_print("{TAB 31}").unwrap().unwrap().bytes,
            vec![0x17, 31]
        );
    }

    #[test]
    fn test_control_codes_remember_parameters() {
        let mut scanner = scanner();
        scanner.state.in_print = true;
        scanner.expand_sequence(b"{AT 3 4}", false).unwrap();
        assert_eq!(scanner.state.pending_params, vec![3, 4]);
    }

    #[test]
    fn test_not_an_escape() {
        assert_eq!(expand("{}"), None);
        assert_eq!(expand("{hello}"), None);
        assert_eq!(expand("{INK x}"), None);
        assert_eq!(expand("{short"), None);
        assert_eq!(expand("plain"), None);
    }

    #[test]
    fn test_strip_trailing_spaces() {
        let found = scanner().expand_sequence(b"{A}   X", true).unwrap().unwrap();
        assert_eq!(found.length, 6);
        let found = scanner().expand_sequence(b"{A}   X", false).unwrap().unwrap();
        assert_eq!(found.length, 3);
    }

    #[test]
    fn test_errors() {
        let cases: [(&str, ErrorCode); 7] = [
            ("{this is never closed", ErrorCode::UnclosedSequence),
            ("{FOO 1}", ErrorCode::UnknownControlCode),
            ("{INK 8}", ErrorCode::ControlParameterOutOfRange),
            ("{BRIGHT 2}", ErrorCode::ControlParameterOutOfRange),
            ("{INK}", ErrorCode::ControlParameterCount),
            ("{INK 1 2}", ErrorCode::ControlParameterCount),
            ("{AT 1 2}", ErrorCode::PrintOnlyOutsidePrint),
        ];
        for (text, code) in cases {
            let err = scanner().expand_sequence(text.as_bytes(), false).unwrap_err();
            assert_eq!(err.code, code, "for {}", text);
        }
    }

    #[test]
    fn test_at_range_errors_in_print() {
        let err = expand_in_print("{AT 24 0}").unwrap_err();
        assert_eq!(err.code, ErrorCode::ControlParameterOutOfRange);
        assert!(err.message.contains("row"));

        let err = expand_in_print("{AT 0 32}").unwrap_err();
        assert!(err.message.contains("column"));

        let err = expand_in_print("{AT 1}").unwrap_err();
        assert_eq!(err.code, ErrorCode::ControlParameterCount);
    }
}
