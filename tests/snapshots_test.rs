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


//! Snapshot tests for zxtap.
//!
//! These tests use the `insta` crate to capture and verify tokenized
//! programs, tape images and diagnostics.

use zxtap::error::{format_error, format_warning};
use zxtap::output::tap::{basic_tap, hex_lines};
use zxtap::{tokenize, tokenize_program, TokenizerOptions};

/// One line record per output line, in hex.
fn format_records(bytes: &[u8]) -> String {
    let mut output = String::new();
    let mut offset = 0;
    while offset + 4 <= bytes.len() {
        let length = u16::from_le_bytes([bytes[offset + 2], bytes[offset + 3]]) as usize;
        let end = (offset + 4 + length).min(bytes.len());
        let record: Vec<String> = bytes[offset..end]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        output.push_str(&record.join(" "));
        output.push('\n');
        offset = end;
    }
    output
}

// ============================================================================
// Tokenizer Snapshots
// ============================================================================

#[test]
fn test_tokenizer_snapshot_loop() {
    let bytes = tokenize(include_str!("fixtures/loop.bas")).unwrap();
    insta::assert_snapshot!(format_records(&bytes), @r"
00 0A 07 00 EA 20 64 65 6D 6F 0D
00 14 13 00 EB 69 3D 31 0E 00 00 01 00 00 CC 33 0E 00 00 03 00 00 0D
00 1E 03 00 F5 69 0D
00 28 03 00 F3 69 0D
");
}

#[test]
fn test_tokenizer_snapshot_graphics() {
    let bytes = tokenize("10 PRINT \"{-1}{+1}{(C)}{7F}\"").unwrap();
    insta::assert_snapshot!(format_records(&bytes), @"00 0A 08 00 F5 22 81 8E 7F 7F 22 0D");
}

// ============================================================================
// Tape Snapshots
// ============================================================================

#[test]
fn test_tap_snapshot_program() {
    let program = tokenize("10 CLS").unwrap();
    let image = basic_tap("hello", &program, Some(10)).unwrap();
    insta::assert_snapshot!(hex_lines(&image).join("\n"), @r"
13 00 00 00 68 65 6C 6C 6F 20 20 20 20 20 06 00
0A 00 06 00 48 08 00 FF 00 0A 02 00 FB 0D 01
");
}

// ============================================================================
// Diagnostic Snapshots
// ============================================================================

#[test]
fn test_error_snapshot_brackets() {
    let source = include_str!("fixtures/broken.bas");
    let err = tokenize(source).unwrap_err();
    insta::assert_snapshot!(format_error(&err, source, Some("broken.bas")), @r"
error[E107]: Mismatched brackets (1 left open)
  --> broken.bas:2
  |
2 | 20 PRINT (1
  | ^^^^^^^^^^^
");
}

#[test]
fn test_error_snapshot_with_hint() {
    let source = "10 CLS\nCLS";
    let err = tokenize(source).unwrap_err();
    insta::assert_snapshot!(format_error(&err, source, None), @r#"
error[E200]: Line must start with a number
  --> <input>:2
  |
2 | CLS
  | ^^^
  = hint: prefix every line with a line number, e.g. 10 PRINT "HI"
"#);
}

#[test]
fn test_warning_snapshot_duplicate() {
    let source = "10 CLS\n10 CLS";
    let program = tokenize_program(source, TokenizerOptions::default()).unwrap();
    insta::assert_snapshot!(format_warning(&program.warnings[0], source, Some("dup.bas")), @r"
warning[W001]: Duplicate use of line number 10
  --> dup.bas:2
  |
2 | 10 CLS
  | ^^^^^^
");
}
