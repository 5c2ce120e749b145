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

//! Tokenizer for Sinclair BASIC program text.
//!
//! This module turns program listings into the byte format the Spectrum
//! keeps in memory. It handles:
//! - Keywords, matched longest first against the token table
//! - Number literals, stored with their hidden five byte value
//! - Escape sequences for graphics and control codes (`{A}`, `{INK 2}`)
//! - Strings and REM comments, copied verbatim
//! - 48K/128K dialect detection
//! - Line records with line number, length and terminator

mod grammar;
mod helpers;
mod line;
mod matcher;
mod numbers;
mod sequences;
mod state;
pub mod tokens;

use std::io::BufRead;

use tracing::{debug, warn};

pub use line::LineScanner;
pub use matcher::{longest_keyword, TokenMatch};
pub use numbers::{
    decode_number, encode_binary_literal, encode_float, encode_number, encode_small_int,
    NumberMatch,
};
pub use sequences::SequenceMatch;
pub use state::{DefFnState, Dialect, LineState, ScanState};
pub use tokens::{lookup, TokenDef, TokenKind};

use crate::error::{ErrorCode, Result, TokenizeError, TokenizeWarning, WarningCode};

/// Longest accepted source line in bytes.
pub const MAX_LINE_LENGTH: usize = 1024;
/// Most `:` separators allowed on one line.
pub const MAX_STATEMENTS: usize = 127;
/// Highest BASIC line number.
pub const MAX_LINE_NUMBER: u16 = 9999;

/// Options fixed for one tokenizer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Match keywords regardless of case.
    pub case_insensitive: bool,
}

/// Program assembler. Tokenizes whole programs line by line.
///
/// One tokenizer holds the state of one run; use separate instances to
/// tokenize programs concurrently.
#[derive(Debug, Default)]
pub struct Tokenizer {
    options: TokenizerOptions,
    dialect: Dialect,
    /// Physical source line being processed (1-indexed).
    current_line: usize,
    /// Separators on the last tokenized line.
    statement_count: usize,
    previous_number: Option<u16>,
    warnings: Vec<TokenizeWarning>,
}

impl Tokenizer {
    /// Create a tokenizer with case sensitive keyword matching.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: TokenizerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> TokenizerOptions {
        self.options
    }

    /// Whether the last run used 128K only keywords.
    pub fn requires_128k(&self) -> bool {
        self.dialect.requires_128k()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The source line being processed, or the last one after a run.
    pub fn current_line(&self) -> usize {
        self.current_line
    }

    pub fn statement_count(&self) -> usize {
        self.statement_count
    }

    /// Warnings collected during the last run.
    pub fn warnings(&self) -> &[TokenizeWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<TokenizeWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn reset(&mut self) {
        self.dialect = Dialect::Unknown;
        self.current_line = 0;
        self.statement_count = 0;
        self.previous_number = None;
        self.warnings.clear();
    }

    /// Tokenize a complete program.
    ///
    /// Returns the concatenated line records. The first error aborts the run
    /// and no output is produced.
    pub fn parse(&mut self, source: &str) -> Result<Vec<u8>> {
        self.reset();
        let mut output = Vec::with_capacity(source.len());
        for text in source.lines() {
            self.process_line(text, &mut output)?;
        }
        Ok(output)
    }

    /// Tokenize a program read line by line from `reader`.
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<Vec<u8>> {
        self.reset();
        let mut output = Vec::new();
        for text in reader.lines() {
            let text = text.map_err(|e| {
                TokenizeError::new(
                    ErrorCode::InputRead,
                    format!("Reading input: {}", e),
                    self.current_line + 1,
                )
            })?;
            self.process_line(&text, &mut output)?;
        }
        Ok(output)
    }

    fn process_line(&mut self, text: &str, output: &mut Vec<u8>) -> Result<()> {
        self.current_line += 1;

        if text.len() > MAX_LINE_LENGTH {
            return Err(TokenizeError::new(
                ErrorCode::LineTooLong,
                format!("Exceeds maximum length of {} characters", MAX_LINE_LENGTH),
                self.current_line,
            ));
        }

        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(());
        }

        let (number, record) = self.tokenize_line(trimmed)?;

        if let Some(previous) = self.previous_number {
            if number < previous {
                return Err(TokenizeError::new(
                    ErrorCode::LineNumberDecreasing,
                    format!(
                        "Number {} is smaller than previous line number {}",
                        number, previous
                    ),
                    self.current_line,
                )
                .with_hint("BASIC lines must be in ascending order"));
            }
            if number == previous {
                warn!(line = self.current_line, number, "duplicate line number");
                self.warnings.push(TokenizeWarning::new(
                    WarningCode::DuplicateLineNumber,
                    format!("Duplicate use of line number {}", number),
                    self.current_line,
                ));
            }
        }
        self.previous_number = Some(number);

        debug!(
            line = self.current_line,
            number,
            bytes = record.len(),
            "tokenized line"
        );
        output.extend_from_slice(&record);
        Ok(())
    }

    /// Tokenize one line, returning its BASIC line number and record.
    fn tokenize_line(&mut self, text: &str) -> Result<(u16, Vec<u8>)> {
        let (number, rest) = self.split_line_number(text)?;

        let mut scanner = LineScanner::new(rest.as_bytes(), self.current_line, self.options)
            .with_dialect(self.dialect);
        let scanned = scanner.scan();
        self.dialect = scanner.dialect();
        scanned?;

        let state = scanner.state();
        self.statement_count = state.statement_count;
        if state.statement_count > MAX_STATEMENTS {
            return Err(self.line_error(
                ErrorCode::TooManyStatements,
                format!("Too many statements (maximum is {})", MAX_STATEMENTS),
            ));
        }
        if state.depth != 0 {
            return Err(self.line_error(
                ErrorCode::UnbalancedBrackets,
                format!("Mismatched brackets ({} left open)", state.depth),
            ));
        }

        Ok((number, encode_line(number, scanner.output())))
    }

    fn split_line_number<'a>(&self, text: &'a str) -> Result<(u16, &'a str)> {
        let digits = text.bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self
                .line_error(ErrorCode::MissingLineNumber, "Line must start with a number")
                .with_hint("prefix every line with a line number, e.g. 10 PRINT \"HI\""));
        }

        let number = text[..digits]
            .parse::<u32>()
            .ok()
            .filter(|&n| n <= MAX_LINE_NUMBER as u32)
            .ok_or_else(|| {
                self.line_error(
                    ErrorCode::LineNumberOutOfRange,
                    format!("Line number must be between 0 and {}", MAX_LINE_NUMBER),
                )
            })?;

        let rest = text[digits..].trim();
        if rest.is_empty() {
            return Err(self.line_error(ErrorCode::EmptyLine, "Line contains no statements"));
        }

        Ok((number as u16, rest))
    }

    fn line_error(&self, code: ErrorCode, message: impl Into<String>) -> TokenizeError {
        TokenizeError::new(code, message, self.current_line)
    }
}

/// Build a line record: number (high byte first), payload length including
/// the terminator (low byte first), payload, terminator.
pub fn encode_line(number: u16, payload: &[u8]) -> Vec<u8> {
    let length = (payload.len() + 1) as u16;
    let mut record = Vec::with_capacity(payload.len() + 5);
    record.extend_from_slice(&number.to_be_bytes());
    record.extend_from_slice(&length.to_le_bytes());
    record.extend_from_slice(payload);
    record.push(tokens::END_OF_LINE);
    record
}

/// Tokenize a program with default options.
pub fn tokenize(source: &str) -> Result<Vec<u8>> {
    Tokenizer::new().parse(source)
}
