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


//! Integration tests for TAP file generation and reading.

use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;
use zxtap::output::tap::{
    default_name, read_tap, write_basic_tap, write_code_tap, BlockType, NO_AUTOSTART,
};
use zxtap::output::{format_from_extension, write_output, OutputFormat};
use zxtap::tokenize;

/// Test that a tokenized program is written as header and data block.
#[test]
fn test_program_tap_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("loop.tap");

    let program = tokenize(include_str!("fixtures/loop.bas")).unwrap();
    write_basic_tap(&path, "loop", &program, Some(10)).unwrap();

    let blocks = read_tap(&path).unwrap();
    assert_eq!(blocks.len(), 2);

    let header = blocks[0].header.as_ref().expect("first block is a header");
    assert_eq!(header.kind(), Some(BlockType::Program));
    assert_eq!(header.name_str(), "loop");
    assert_eq!(header.data_length as usize, program.len());
    assert_eq!(header.param1, 10);
    assert_eq!(header.param2 as usize, program.len());

    assert!(!blocks[1].is_header());
    assert_eq!(blocks[1].data, program);
    assert!(blocks.iter().all(|b| b.is_valid()));
}

/// Test that a program without autostart is marked as such.
#[test]
fn test_program_without_autostart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("plain.tap");

    write_basic_tap(&path, "plain", &tokenize("10 CLS").unwrap(), None).unwrap();
    let blocks = read_tap(&path).unwrap();
    assert_eq!(blocks[0].header.as_ref().unwrap().param1, NO_AUTOSTART);
}

/// Test that a code block carries its load address.
#[test]
fn test_code_tap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("screen.tap");
    let code = vec![0xAA; 6912];

    write_code_tap(&path, "screen", &code, 16384).unwrap();
    let blocks = read_tap(&path).unwrap();

    let header = blocks[0].header.as_ref().unwrap();
    assert_eq!(header.kind(), Some(BlockType::Code));
    assert_eq!(header.param1, 16384);
    assert_eq!(header.param2, 32768);
    assert_eq!(header.data_length, 6912);
    assert_eq!(blocks[1].data.len(), 6912);
}

/// Test that long names are cut to ten characters.
#[test]
fn test_long_name_truncated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("long.tap");

    write_basic_tap(&path, "averylongprogramname", &tokenize("10 CLS").unwrap(), None).unwrap();
    let blocks = read_tap(&path).unwrap();
    assert_eq!(blocks[0].header.as_ref().unwrap().name_str(), "averylongp");
}

#[test]
fn test_default_name() {
    assert_eq!(default_name(Path::new("dir/game.bas")), "game");
    assert_eq!(default_name(Path::new("a_very_long_name.bas")), "a_very_lon");
}

/// Test writing through the format dispatcher.
#[test]
fn test_write_output_tap() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.tap");
    let format = format_from_extension(&path).unwrap();
    assert_eq!(format, OutputFormat::Tap);

    let image = zxtap::output::basic_tap("out", &tokenize("10 CLS").unwrap(), None).unwrap();
    write_output(&image, &path, format, false).unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), image);
}

/// Test that a damaged checksum is detected.
#[test]
fn test_corrupted_checksum_detected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.tap");

    let mut image = zxtap::output::basic_tap("bad", &tokenize("10 CLS").unwrap(), None).unwrap();
    let last = image.len() - 1;
    image[last] ^= 0xFF;
    std::fs::write(&path, &image).unwrap();

    let blocks = read_tap(&path).unwrap();
    assert!(blocks[0].is_valid());
    assert!(!blocks[1].is_valid());
}

/// Test that reading a missing file is an I/O error naming the path.
#[test]
fn test_missing_file() {
    let err = read_tap(Path::new("does/not/exist.tap")).unwrap_err();
    assert!(err.to_string().contains("does/not/exist.tap"));
}
