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

//! Longest match keyword recognition.

use std::iter;

use tracing::trace;

use super::grammar::GrammarValidator;
use super::helpers::{is_alpha, ScanHelpers};
use super::line::LineScanner;
use super::tokens::{lookup, TokenKind, COLON, FIRST_KEYWORD};
use crate::error::Result;

/// A keyword found at the start of some input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMatch {
    /// The token byte.
    pub byte: u8,
    /// Length of the matched text.
    pub length: usize,
}

/// Find the longest keyword text that prefixes `text`.
///
/// A candidate whose last character is a letter is skipped when the input
/// continues with another letter, so `TO` does not match the start of `TOTAL`.
/// Symbolic keywords like `<=` are not protected this way.
pub fn longest_keyword(text: &[u8], case_insensitive: bool) -> Option<TokenMatch> {
    let mut best: Option<TokenMatch> = None;

    for byte in iter::once(COLON).chain(FIRST_KEYWORD..=0xFF) {
        let candidate = lookup(byte).text.as_bytes();
        let length = candidate.len();
        if length == 0 || length > text.len() {
            continue;
        }
        if best.is_some_and(|found| found.length >= length) {
            continue;
        }

        let prefix = &text[..length];
        let matches = if case_insensitive {
            prefix.eq_ignore_ascii_case(candidate)
        } else {
            prefix == candidate
        };
        if !matches {
            continue;
        }

        if let Some(&next) = text.get(length) {
            if is_alpha(next) && is_alpha(text[length - 1]) {
                continue;
            }
        }

        best = Some(TokenMatch { byte, length });
    }

    best
}

/// Trait for keyword matching at the scan position.
pub trait KeywordMatcher {
    /// Match a keyword at the current position.
    ///
    /// Returns `Ok(None)` when no keyword matches or when the keyword's kind
    /// does not fit the position. A match that is illegal in context is an
    /// error.
    fn match_keyword(&mut self) -> Result<Option<TokenMatch>>;
}

impl<'src> KeywordMatcher for LineScanner<'src> {
    fn match_keyword(&mut self) -> Result<Option<TokenMatch>> {
        let Some(found) = longest_keyword(self.remaining(), self.options.case_insensitive) else {
            return Ok(None);
        };

        let def = lookup(found.byte);
        if found.byte != COLON {
            if self.state.expect_keyword && !def.kind.starts_statement() {
                return Ok(None);
            }
            if !self.state.expect_keyword && def.kind == TokenKind::Keyword {
                return Ok(None);
            }
        }

        self.validate_token(found.byte, def)?;
        self.observe_token(found.byte)?;

        trace!(line = self.line, token = def.text, byte = found.byte, "matched keyword");
        Ok(Some(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::TokenizerOptions;

    fn longest(text: &str) -> Option<(u8, usize)> {
        longest_keyword(text.as_bytes(), false).map(|m| (m.byte, m.length))
    }

    #[test]
    fn test_simple_keywords() {
        assert_eq!(longest("PRINT \"HI\""), Some((0xF5, 5)));
        assert_eq!(longest("CLS"), Some((0xFB, 3)));
        assert_eq!(longest("GO TO 10"), Some((0xEC, 5)));
        assert_eq!(longest("DEF FN a(x)"), Some((0xCE, 6)));
        assert_eq!(longest(":PRINT"), Some((COLON, 1)));
    }

    #[test]
    fn test_longest_match_wins() {
        // VAL$ over VAL, INKEY$ over IN, <> over nothing shorter
        assert_eq!(longest("VAL$ a$"), Some((0xAE, 4)));
        assert_eq!(longest("VAL a$"), Some((0xB0, 3)));
        assert_eq!(longest("INKEY$"), Some((0xA6, 6)));
        assert_eq!(longest("IN 254"), Some((0xBF, 2)));
        assert_eq!(longest("<>0"), Some((0xC9, 2)));
    }

    #[test]
    fn test_alphabetic_continuation_rejected() {
        assert_eq!(longest("TOTAL"), None);
        assert_eq!(longest("INTEREST"), None);
        assert_eq!(longest("PRINTER"), None);
        // A digit is not a continuation
        assert_eq!(longest("TO10"), Some((0xCC, 2)));
    }

    #[test]
    fn test_case_sensitivity() {
        assert_eq!(longest("print"), None);
        assert_eq!(
            longest_keyword(b"print", true).map(|m| m.byte),
            Some(0xF5)
        );
        assert_eq!(
            longest_keyword(b"Go Sub 100", true).map(|m| m.byte),
            Some(0xED)
        );
    }

    #[test]
    fn test_position_filters_kinds() {
        let mut scanner = LineScanner::new(b"SIN x", 1, TokenizerOptions::default());
        assert_eq!(scanner.match_keyword().unwrap(), None);

        let mut scanner = LineScanner::new(b"PRINT", 1, TokenizerOptions::default());
        scanner.state.expect_keyword = false;
        assert_eq!(scanner.match_keyword().unwrap(), None);

        let mut scanner = LineScanner::new(b"INK 2", 1, TokenizerOptions::default());
        assert!(scanner.match_keyword().unwrap().is_some());
        scanner.state.expect_keyword = false;
        assert!(scanner.match_keyword().unwrap().is_some());
    }

    #[test]
    fn test_separator_matches_anywhere() {
        let mut scanner = LineScanner::new(b": CLS", 1, TokenizerOptions::default());
        scanner.state.expect_keyword = false;
        assert_eq!(
            scanner.match_keyword().unwrap(),
            Some(TokenMatch { byte: COLON, length: 1 })
        );
    }

    #[test]
    fn test_match_marks_dialect() {
        let mut scanner = LineScanner::new(b"PLAY \"a\"", 1, TokenizerOptions::default());
        scanner.match_keyword().unwrap();
        assert!(scanner.dialect.requires_128k());
    }
}
