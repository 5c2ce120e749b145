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


//! Integration tests for TZX image generation.

use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zxtap::error::ContainerError;
use zxtap::output::tap::{basic_tap, code_tap};
use zxtap::output::tzx::{
    build_from_inputs, ArchiveInfo, HardwareInfo, InputLayout, TzxBlock, DEFAULT_PAUSE,
};
use zxtap::output::{format_from_extension, write_output, OutputFormat};
use zxtap::{tokenize, TzxConfig};

fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

fn program_tap() -> Vec<u8> {
    basic_tap("loader", &tokenize("10 LOAD \"\" CODE").unwrap(), Some(10)).unwrap()
}

fn block_ids(blocks: &[TzxBlock]) -> Vec<u8> {
    blocks.iter().map(TzxBlock::id).collect()
}

/// Test the command line layout with every option.
#[test]
fn test_inputs_layout() {
    let dir = TempDir::new().unwrap();
    let loader = write_file(dir.path(), "loader.tap", &program_tap());
    let note = write_file(dir.path(), "note.desc", b"Side A");
    let screen = write_file(dir.path(), "screen.tap", &code_tap("scr", &[0; 16], 16384).unwrap());

    let layout = InputLayout {
        pause: 500,
        archive: ArchiveInfo {
            title: Some("Game".to_string()),
            ..Default::default()
        },
        hardware: HardwareInfo {
            uses_ay: true,
            ..Default::default()
        },
        multiload: true,
        group: Some("Game".to_string()),
    };
    let inputs = [loader.as_path(), note.as_path(), screen.as_path()];
    let builder = build_from_inputs(&inputs, &layout).unwrap();

    assert_eq!(
        block_ids(builder.blocks()),
        vec![0x32, 0x33, 0x21, 0x10, 0x10, 0x2A, 0x30, 0x2A, 0x10, 0x10, 0x22]
    );
    assert_eq!(
        builder.blocks()[6],
        TzxBlock::TextDescription("Side A".to_string())
    );
    match &builder.blocks()[3] {
        TzxBlock::StandardSpeed { pause, data } => {
            assert_eq!(*pause, 500);
            assert_eq!(data.len(), 19);
        }
        other => panic!("unexpected block {:?}", other),
    }
}

/// Test that plain inputs produce only data blocks.
#[test]
fn test_inputs_without_options() {
    let dir = TempDir::new().unwrap();
    let loader = write_file(dir.path(), "loader.tap", &program_tap());

    let builder = build_from_inputs(&[loader.as_path()], &InputLayout::default()).unwrap();
    assert_eq!(block_ids(builder.blocks()), vec![0x10, 0x10]);

    let bytes = builder.to_bytes().unwrap();
    assert_eq!(&bytes[..10], b"ZXTape!\x1a\x01\x14");
    assert_eq!(&bytes[10..13], &[0x10, 0xE8, 0x03]);
    assert_eq!(DEFAULT_PAUSE, 1000);
}

/// Test that a broken TAP input is rejected.
#[test]
fn test_inputs_invalid_tap() {
    let dir = TempDir::new().unwrap();
    let broken = write_file(dir.path(), "broken.tap", &[0x10, 0x00, 0xFF]);

    let err = build_from_inputs(&[broken.as_path()], &InputLayout::default()).unwrap_err();
    assert!(matches!(err, ContainerError::InvalidTap(_)));
}

/// Test a layout file with relative paths and a jump.
#[test]
fn test_config_layout() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "menu.tap", &program_tap());
    write_file(dir.path(), "level.tap", &code_tap("level", &[1, 2, 3], 32768).unwrap());
    let config_path = write_file(
        dir.path(),
        "layout.toml",
        br#"
[metadata]
title = "Game"
author = "Someone"

[hardware]
128k_only = true

[[blocks]]
id = "menu"
group = "Menu"
file = "menu.tap"
group_end = true

[[blocks]]
desc = "Level 1"
file = "level.tap"
pause = 0

[[blocks]]
jump_to = "menu"
"#,
    );

    let config = TzxConfig::load(&config_path).unwrap();
    let builder = config.build().unwrap();

    assert_eq!(
        block_ids(builder.blocks()),
        vec![0x32, 0x33, 0x21, 0x10, 0x10, 0x22, 0x30, 0x10, 0x10, 0x23]
    );
    // Jump at index 9 back to the group start at index 2
    assert_eq!(builder.blocks()[9], TzxBlock::Jump(-7));
    assert_eq!(
        builder.blocks()[7],
        TzxBlock::StandardSpeed {
            pause: 0,
            data: code_tap("level", &[1, 2, 3], 32768).unwrap()[2..21].to_vec(),
        }
    );

    let output = dir.path().join("game.tzx");
    builder.write(&output).unwrap();
    let written = std::fs::read(&output).unwrap();
    assert_eq!(written, builder.to_bytes().unwrap());
}

/// Test that a layout file naming a missing TAP file fails with its path.
#[test]
fn test_config_missing_file() {
    let dir = TempDir::new().unwrap();
    let config_path = write_file(dir.path(), "layout.toml", b"[[blocks]]\nfile = \"gone.tap\"\n");

    let err = TzxConfig::load(&config_path).unwrap().build().unwrap_err();
    match err {
        ContainerError::Io { path, .. } => assert!(path.ends_with("gone.tap")),
        other => panic!("unexpected error {:?}", other),
    }
}

/// Test that a malformed layout file is a TOML error.
#[test]
fn test_config_invalid_toml() {
    let dir = TempDir::new().unwrap();
    let config_path = write_file(dir.path(), "layout.toml", b"[[blocks]\n");

    let err = TzxConfig::load(&config_path).unwrap_err();
    assert!(matches!(err, ContainerError::Toml { .. }));
}

/// Test that a 128K program written as TZX is marked as such.
#[test]
fn test_write_output_tzx_marks_128k() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("music.tzx");
    assert_eq!(format_from_extension(&path), Some(OutputFormat::Tzx));

    let image = basic_tap("music", &tokenize("10 PLAY \"c\"").unwrap(), None).unwrap();
    write_output(&image, &path, OutputFormat::Tzx, true).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[10..18], &[0x33, 0x02, 0x00, 0x03, 0x01, 0x00, 0x01, 0x03]);
    assert_eq!(bytes[18], 0x10);
}
