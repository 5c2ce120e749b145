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

//! Line assembler.
//!
//! Scans the statement text of one program line and produces its tokenized
//! payload. Each position is tried in order as a bracket, a keyword, a
//! decimal number, a `BIN` literal and an escape sequence; anything else is
//! copied verbatim.

use super::helpers::{is_alpha, ScanHelpers};
use super::matcher::{KeywordMatcher, TokenMatch};
use super::numbers::NumberScanner;
use super::sequences::SequenceExpander;
use super::state::{DefFnState, Dialect, LineState, ScanState};
use super::tokens::{BIN, COLON, DEF_FN, LPRINT, NUMBER_MARKER, PRINT, REM, THEN};
use super::TokenizerOptions;
use crate::error::{ErrorCode, Result};

/// Room the ROM reserves after each DEF FN parameter for its value.
const PARAMETER_PLACEHOLDER: [u8; 6] = [NUMBER_MARKER, 0, 0, 0, 0, 0];

/// Scanner over the statement text of a single line.
#[derive(Debug)]
pub struct LineScanner<'src> {
    pub(crate) text: &'src [u8],
    pub(crate) position: usize,
    pub(crate) output: Vec<u8>,
    pub(crate) state: LineState,
    pub(crate) dialect: Dialect,
    pub(crate) options: TokenizerOptions,
    /// Source line number for error reporting.
    pub(crate) line: usize,
}

impl<'src> LineScanner<'src> {
    pub fn new(text: &'src [u8], line: usize, options: TokenizerOptions) -> Self {
        Self {
            text,
            position: 0,
            output: Vec::with_capacity(text.len() + 16),
            state: LineState::new(),
            dialect: Dialect::Unknown,
            options,
            line,
        }
    }

    /// Continue with the dialect detected by earlier lines.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// The payload written so far.
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    pub fn state(&self) -> &LineState {
        &self.state
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Scan the whole line.
    pub fn scan(&mut self) -> Result<()> {
        while !self.is_at_end() {
            match self.state.scan {
                ScanState::InComment => self.scan_comment()?,
                ScanState::InString => self.scan_string()?,
                ScanState::Normal => {
                    if self.skip_spaces() > 0 {
                        self.state.in_identifier = false;
                    }
                    if let Some(byte) = self.peek() {
                        self.scan_normal(byte)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Everything after REM is kept, only escapes are expanded.
    fn scan_comment(&mut self) -> Result<()> {
        while let Some(byte) = self.peek() {
            if !self.scan_sequence(false)? {
                self.emit(byte);
                self.advance_by(1);
            }
        }
        Ok(())
    }

    fn scan_string(&mut self) -> Result<()> {
        let Some(byte) = self.peek() else {
            return Ok(());
        };
        if byte == b'"' {
            self.state.scan = ScanState::Normal;
            self.emit(byte);
            self.advance_by(1);
        } else if !self.scan_sequence(false)? {
            self.emit(byte);
            self.advance_by(1);
        }
        Ok(())
    }

    fn scan_normal(&mut self, byte: u8) -> Result<()> {
        match byte {
            b'"' => {
                self.state.scan = ScanState::InString;
                self.state.in_identifier = false;
                self.emit(byte);
                self.advance_by(1);
                return Ok(());
            }
            b'(' => {
                self.open_bracket();
                return Ok(());
            }
            b')' => return self.close_bracket(),
            b',' if self.take_pending_parameter() => {
                self.emit(byte);
                self.advance_by(1);
                return Ok(());
            }
            _ => {}
        }

        if let Some(found) = self.match_keyword()? {
            return self.apply_keyword(found);
        }

        if !self.state.in_identifier && self.scan_decimal_number()? {
            self.state.expect_keyword = false;
            return Ok(());
        }

        if self.scan_binary_number()? {
            self.state.expect_keyword = false;
            self.state.in_identifier = false;
            return Ok(());
        }

        if self.scan_sequence(true)? {
            self.state.in_identifier = false;
            return Ok(());
        }

        self.emit(byte);
        self.advance_by(1);
        self.state.expect_keyword = false;
        self.state.in_identifier =
            is_alpha(byte) || (self.state.in_identifier && byte.is_ascii_digit());
        if is_alpha(byte) {
            if let DefFnState::Parameters { pending } = &mut self.state.def_fn {
                *pending = true;
            }
        }
        Ok(())
    }

    fn apply_keyword(&mut self, found: TokenMatch) -> Result<()> {
        self.state.in_identifier = false;

        if found.byte == COLON {
            self.emit(COLON);
            self.advance_by(found.length);
            self.state.next_statement();
            return Ok(());
        }

        if found.byte == BIN {
            self.scan_binary_digits(found.length)?;
            self.state.expect_keyword = false;
            return Ok(());
        }

        self.emit(found.byte);
        self.advance_by(found.length);
        self.state.expect_keyword = found.byte == THEN;

        match found.byte {
            REM => self.state.scan = ScanState::InComment,
            DEF_FN => self.state.def_fn = DefFnState::Header,
            PRINT | LPRINT => self.state.in_print = true,
            _ => {}
        }
        Ok(())
    }

    fn open_bracket(&mut self) {
        self.state.depth += 1;
        if self.state.def_fn == DefFnState::Header {
            self.state.def_fn = DefFnState::Parameters { pending: false };
        }
        self.state.after_open_bracket = true;
        self.state.in_identifier = false;
        self.emit(b'(');
        self.advance_by(1);
    }

    fn close_bracket(&mut self) -> Result<()> {
        if self.state.depth == 0 {
            return Err(self.error(ErrorCode::TooManyClosingBrackets, "Too many closing brackets"));
        }
        self.state.depth -= 1;

        if let DefFnState::Parameters { .. } = self.state.def_fn {
            self.take_pending_parameter();
            self.state.def_fn = DefFnState::Inactive;
        }

        self.state.after_open_bracket = false;
        self.state.in_identifier = false;
        self.emit(b')');
        self.advance_by(1);
        Ok(())
    }

    /// Write the value placeholder for a DEF FN parameter that still lacks one.
    fn take_pending_parameter(&mut self) -> bool {
        if self.state.def_fn != (DefFnState::Parameters { pending: true }) {
            return false;
        }
        self.state.def_fn = DefFnState::Parameters { pending: false };
        self.state.in_identifier = false;
        self.emit_all(&PARAMETER_PLACEHOLDER);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scan(text: &str) -> Vec<u8> {
        let mut scanner = LineScanner::new(text.as_bytes(), 1, TokenizerOptions::default());
        scanner.scan().expect("line should scan");
        scanner.output
    }

    fn scan_err(text: &str) -> ErrorCode {
        let mut scanner = LineScanner::new(text.as_bytes(), 1, TokenizerOptions::default());
        scanner.scan().expect_err("line should fail").code
    }

    #[test]
    fn test_print_string() {
        assert_eq!(scan("PRINT \"HI\""), vec![0xF5, b'"', b'H', b'I', b'"']);
    }

    #[test]
    fn test_spaces_kept_in_strings() {
        assert_eq!(
            scan("PRINT \"A B\""),
            vec![0xF5, b'"', b'A', b' ', b'B', b'"']
        );
    }

    #[test]
    fn test_numbers_keep_their_digits() {
        assert_eq!(
            scan("GO TO 10"),
            vec![0xEC, b'1', b'0', 0x0E, 0x00, 0x00, 0x0A, 0x00, 0x00]
        );
    }

    #[test]
    fn test_digits_in_identifiers() {
        assert_eq!(
            scan("LET a1=2"),
            vec![0xF1, b'a', b'1', b'=', b'2', 0x0E, 0x00, 0x00, 0x02, 0x00, 0x00]
        );
    }

    #[test]
    fn test_bin_literal() {
        assert_eq!(
            scan("LET a=BIN 1010"),
            vec![
                0xF1, b'a', b'=', 0xC4, b'1', b'0', b'1', b'0', 0x0E, 0x00, 0x00, 0x0A, 0x00,
                0x00
            ]
        );
    }

    #[test]
    fn test_separator_starts_new_statement() {
        let mut scanner = LineScanner::new(b"CLS: PRINT", 1, TokenizerOptions::default());
        scanner.scan().unwrap();
        assert_eq!(scanner.output, vec![0xFB, b':', 0xF5]);
        assert_eq!(scanner.state.statement_count, 1);
        assert!(scanner.state.in_print);
    }

    #[test]
    fn test_keyword_after_then() {
        assert_eq!(
            scan("IF a THEN CLS"),
            vec![0xFA, b'a', 0xCB, 0xFB]
        );
    }

    #[test]
    fn test_rem_keeps_text() {
        assert_eq!(
            scan("REM  a PRINT \"x"),
            vec![0xEA, b' ', b' ', b'a', b' ', b'P', b'R', b'I', b'N', b'T', b' ', b'"', b'x']
        );
    }

    #[test]
    fn test_rem_expands_escapes() {
        assert_eq!(scan("REM {A}"), vec![0xEA, b' ', 0x90]);
    }

    #[test]
    fn test_def_fn_placeholders() {
        let mut expected = vec![0xCE, b'f', b'(', b'x'];
        expected.extend_from_slice(&PARAMETER_PLACEHOLDER);
        expected.push(b',');
        expected.push(b'y');
        expected.extend_from_slice(&PARAMETER_PLACEHOLDER);
        expected.extend_from_slice(&[b')', b'=', b'x', b'+', b'y']);
        assert_eq!(scan("DEF FN f(x,y)=x+y"), expected);
    }

    #[test]
    fn test_def_fn_without_parameters() {
        assert_eq!(
            scan("DEF FN p()=PI"),
            vec![0xCE, b'p', b'(', b')', b'=', 0xA7]
        );
    }

    #[test]
    fn test_print_escapes_strip_spaces() {
        assert_eq!(
            scan("PRINT {INK 2} \"X\""),
            vec![0xF5, 0x10, 0x02, b'"', b'X', b'"']
        );
    }

    #[test]
    fn test_errors() {
        assert_eq!(scan_err("PRINT 1)"), ErrorCode::TooManyClosingBrackets);
        assert_eq!(scan_err("PRINT (1: IF"), ErrorCode::NotAllowedInBrackets);
        assert_eq!(scan_err("DEF FN SIN"), ErrorCode::ExpressionInDefFnHeader);
        assert_eq!(scan_err("PRINT 1.2.3"), ErrorCode::MultipleDecimalPoints);
        assert_eq!(scan_err("CLS: {AT 1 1}"), ErrorCode::PrintOnlyOutsidePrint);
    }

    #[test]
    fn test_bracket_depth_is_tracked() {
        let mut scanner = LineScanner::new(b"PRINT ((1)", 1, TokenizerOptions::default());
        scanner.scan().unwrap();
        assert_eq!(scanner.state.depth, 1);
    }
}
