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

//! Helper methods for scanning a line.
//!
//! This module provides basic operations for the line scanner:
//! - Byte stream navigation (peek, advance, remaining)
//! - Output emission
//! - Error creation tagged with the source line

use super::line::LineScanner;
use crate::error::{ErrorCode, TokenizeError};

/// Trait for line scanner helper operations.
pub trait ScanHelpers<'src> {
    /// The unscanned rest of the line.
    fn remaining(&self) -> &'src [u8];

    /// Check if we've reached the end of the line.
    fn is_at_end(&self) -> bool;

    /// Peek at the current byte without advancing.
    fn peek(&self) -> Option<u8>;

    /// Advance by `count` bytes.
    fn advance_by(&mut self, count: usize);

    /// Skip space characters. Returns the number of spaces skipped.
    fn skip_spaces(&mut self) -> usize;

    /// Append one byte to the line payload.
    fn emit(&mut self, byte: u8);

    /// Append bytes to the line payload.
    fn emit_all(&mut self, bytes: &[u8]);

    /// Create an error for the line being scanned.
    fn error(&self, code: ErrorCode, message: impl Into<String>) -> TokenizeError;
}

impl<'src> ScanHelpers<'src> for LineScanner<'src> {
    fn remaining(&self) -> &'src [u8] {
        let text: &'src [u8] = self.text;
        &text[self.position.min(text.len())..]
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.text.len()
    }

    fn peek(&self) -> Option<u8> {
        self.text.get(self.position).copied()
    }

    fn advance_by(&mut self, count: usize) {
        self.position = (self.position + count).min(self.text.len());
    }

    fn skip_spaces(&mut self) -> usize {
        let start = self.position;
        while self.peek() == Some(b' ') {
            self.position += 1;
        }
        self.position - start
    }

    fn emit(&mut self, byte: u8) {
        self.output.push(byte);
    }

    fn emit_all(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> TokenizeError {
        TokenizeError::new(code, message, self.line)
    }
}

/// ASCII letter test used by the keyword boundary rule.
pub fn is_alpha(byte: u8) -> bool {
    byte.is_ascii_alphabetic()
}
