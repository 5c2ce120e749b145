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

//! Numeric literals in the Spectrum's five byte format.
//!
//! Every number in a program line is stored twice: once as the digits the
//! author typed, followed by a hidden six byte form (the `0x0E` marker and
//! five bytes of value). Two value layouts exist:
//! - Small integers (-65535 to 65535): `00 sign lo hi 00`
//! - Floats: biased exponent, then a 31 bit mantissa with the sign in bit 7
//!
//! `BIN` literals are always stored as small integers.

use std::ops::Range;

use super::helpers::ScanHelpers;
use super::line::LineScanner;
use super::tokens::{BIN, NUMBER_MARKER};
use crate::error::{ErrorCode, Result, TokenizeError};

/// Largest magnitude stored as a small integer.
pub const MAX_SMALL_INT: i32 = 65535;
/// Smallest value stored as a small integer.
pub const MIN_SMALL_INT: i32 = -65535;
/// Largest binary exponent of a float.
pub const MAX_EXPONENT: i32 = 126;
/// Smallest binary exponent of a float. Lower values would collide with the
/// small integer exponent byte of zero.
pub const MIN_EXPONENT: i32 = -128;
/// Added to the binary exponent to form the exponent byte.
pub const EXPONENT_BIAS: i32 = 0x81;

const SIGN_BIT: u8 = 0x80;
const MANTISSA_SCALE: f64 = 2147483648.0;

/// A number literal found at the start of some input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberMatch {
    /// The hidden six byte form, marker included.
    pub encoded: [u8; 6],
    /// Bytes consumed from the input.
    pub length: usize,
    /// Where the literal's digits are within the consumed input.
    pub digits: Range<usize>,
}

/// Encode a value in the small integer layout.
///
/// Returns `None` when the value is outside -65535..=65535.
pub fn encode_small_int(value: i32) -> Option<[u8; 6]> {
    if !(MIN_SMALL_INT..=MAX_SMALL_INT).contains(&value) {
        return None;
    }

    let sign = if value < 0 { 0xFF } else { 0x00 };
    let magnitude = value.unsigned_abs();
    Some([
        NUMBER_MARKER,
        0x00,
        sign,
        (magnitude & 0xFF) as u8,
        (magnitude >> 8) as u8,
        0x00,
    ])
}

/// Encode a value in the float layout.
///
/// Returns `None` when the binary exponent is outside the representable range
/// (this includes infinities and NaN).
pub fn encode_float(value: f64) -> Option<[u8; 6]> {
    let mut encoded = [NUMBER_MARKER, 0, 0, 0, 0, 0];
    if value == 0.0 {
        return Some(encoded);
    }
    if !value.is_finite() {
        return None;
    }

    let sign = if value < 0.0 { SIGN_BIT } else { 0 };
    let magnitude = value.abs();

    let mut exponent = magnitude.log2().floor() as i32;
    let mantissa = magnitude / 2f64.powi(exponent);
    let mut bits = ((mantissa - 1.0) * MANTISSA_SCALE + 0.5).floor() as u64;
    if bits >= 1 << 31 {
        // Rounded up to the next power of two
        bits = 0;
        exponent += 1;
    }

    if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
        return None;
    }

    encoded[1] = (exponent + EXPONENT_BIAS) as u8;
    encoded[2] = ((bits >> 24) as u8 & 0x7F) | sign;
    encoded[3] = (bits >> 16) as u8;
    encoded[4] = (bits >> 8) as u8;
    encoded[5] = bits as u8;
    Some(encoded)
}

/// Decode a hidden number (marker included) back to its value.
pub fn decode_number(bytes: &[u8]) -> Option<f64> {
    let &[marker, exponent, b1, b2, b3, b4] = bytes else {
        return None;
    };
    if marker != NUMBER_MARKER {
        return None;
    }

    if exponent == 0 {
        let magnitude = (b2 as u32 | (b3 as u32) << 8) as f64;
        return Some(if b1 == 0xFF { -magnitude } else { magnitude });
    }

    let bits = ((b1 & 0x7F) as u32) << 24 | (b2 as u32) << 16 | (b3 as u32) << 8 | b4 as u32;
    let mantissa = 1.0 + bits as f64 / MANTISSA_SCALE;
    let value = mantissa * 2f64.powi(exponent as i32 - EXPONENT_BIAS);
    Some(if b1 & SIGN_BIT != 0 { -value } else { value })
}

/// Find a decimal literal at the start of `text` and encode it.
///
/// Returns `Ok(None)` if `text` does not start with a digit or a decimal
/// point. Literals without a decimal point or exponent that fit are stored as
/// small integers, everything else as floats.
pub fn encode_number(text: &[u8], line: usize) -> Result<Option<NumberMatch>> {
    let mut end = 0;
    let mut has_decimal_point = false;
    let mut has_exponent = false;

    while let Some(&byte) = text.get(end) {
        if byte == b'.' {
            if has_decimal_point {
                return Err(TokenizeError::new(
                    ErrorCode::MultipleDecimalPoints,
                    "Multiple decimal points in number",
                    line,
                ));
            }
            has_decimal_point = true;
        } else if !byte.is_ascii_digit() {
            break;
        }
        end += 1;
    }

    if end == 0 {
        return Ok(None);
    }

    if matches!(text.get(end), Some(b'e' | b'E')) {
        has_exponent = true;
        end += 1;
        if matches!(text.get(end), Some(b'+' | b'-')) {
            end += 1;
        }
        while text.get(end).is_some_and(|b| b.is_ascii_digit()) {
            end += 1;
        }
    }

    let literal = String::from_utf8_lossy(&text[..end]);
    let value: f64 = literal.parse().map_err(|_| {
        TokenizeError::new(
            ErrorCode::InvalidNumber,
            format!("Invalid number format: {}", literal),
            line,
        )
    })?;

    if !has_decimal_point && !has_exponent {
        let floored = value.floor();
        if (MIN_SMALL_INT as f64..=MAX_SMALL_INT as f64).contains(&floored) {
            if let Some(encoded) = encode_small_int(floored as i32) {
                return Ok(Some(NumberMatch {
                    encoded,
                    length: end,
                    digits: 0..end,
                }));
            }
        }
    }

    let encoded = encode_float(value).ok_or_else(|| {
        TokenizeError::new(
            ErrorCode::NumberOutOfRange,
            format!("Number out of range: {}", literal),
            line,
        )
        .with_hint(format!(
            "binary exponents must be between {} and {}",
            MIN_EXPONENT, MAX_EXPONENT
        ))
    })?;

    Ok(Some(NumberMatch {
        encoded,
        length: end,
        digits: 0..end,
    }))
}

/// Encode the digits following a `BIN` keyword.
///
/// Leading spaces are skipped. `text` starts right after the keyword.
pub fn encode_binary_digits(text: &[u8], line: usize) -> Result<NumberMatch> {
    let start = text.iter().take_while(|&&b| b == b' ').count();
    let mut end = start;
    let mut value: i32 = 0;

    while let Some(&byte @ (b'0' | b'1')) = text.get(end) {
        value = value * 2 + (byte - b'0') as i32;
        if value > MAX_SMALL_INT {
            return Err(TokenizeError::new(
                ErrorCode::BinaryNumberTooLarge,
                format!("Binary number too large (maximum is {})", MAX_SMALL_INT),
                line,
            ));
        }
        end += 1;
    }

    if end == start {
        return Err(TokenizeError::new(
            ErrorCode::MissingBinaryDigits,
            "Expected binary digits after BIN",
            line,
        ));
    }

    let encoded = encode_small_int(value).ok_or_else(|| {
        TokenizeError::new(
            ErrorCode::BinaryNumberTooLarge,
            format!("Binary number too large (maximum is {})", MAX_SMALL_INT),
            line,
        )
    })?;

    Ok(NumberMatch {
        encoded,
        length: end,
        digits: start..end,
    })
}

/// Find a `BIN` literal at the start of `text` and encode it.
///
/// Returns `Ok(None)` if `text` does not start with `BIN`. Offsets in the
/// returned match include the three prefix bytes.
pub fn encode_binary_literal(text: &[u8], line: usize) -> Result<Option<NumberMatch>> {
    let Some(rest) = text.strip_prefix(b"BIN") else {
        return Ok(None);
    };

    let found = encode_binary_digits(rest, line)?;
    Ok(Some(NumberMatch {
        encoded: found.encoded,
        length: found.length + 3,
        digits: found.digits.start + 3..found.digits.end + 3,
    }))
}

/// Trait for number scanning operations.
pub trait NumberScanner {
    /// Scan a decimal literal, writing its digits and hidden form.
    /// Returns `false` if there is no number at the current position.
    fn scan_decimal_number(&mut self) -> Result<bool>;

    /// Scan a `BIN` literal spelled out at the current position.
    fn scan_binary_number(&mut self) -> Result<bool>;

    /// Scan the digits after an already matched `BIN` token of `prefix` bytes.
    fn scan_binary_digits(&mut self, prefix: usize) -> Result<()>;
}

impl<'src> LineScanner<'src> {
    fn emit_number(&mut self, text: &'src [u8], found: &NumberMatch) {
        self.emit_all(&text[found.digits.clone()]);
        self.emit_all(&found.encoded);
        self.advance_by(found.length);
    }
}

impl<'src> NumberScanner for LineScanner<'src> {
    fn scan_decimal_number(&mut self) -> Result<bool> {
        let text = self.remaining();
        let Some(found) = encode_number(text, self.line)? else {
            return Ok(false);
        };
        self.emit_number(text, &found);
        Ok(true)
    }

    fn scan_binary_number(&mut self) -> Result<bool> {
        let text = self.remaining();
        let Some(found) = encode_binary_literal(text, self.line)? else {
            return Ok(false);
        };
        self.emit(BIN);
        self.emit_number(text, &found);
        Ok(true)
    }

    fn scan_binary_digits(&mut self, prefix: usize) -> Result<()> {
        self.emit(BIN);
        self.advance_by(prefix);
        let text = self.remaining();
        let found = encode_binary_digits(text, self.line)?;
        self.emit_number(text, &found);
        Ok(())
    }
}
