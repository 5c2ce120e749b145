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

//! Tape image output.
//!
//! This module writes tokenized programs and raw code to tape images:
//! - TAP files (header and data blocks as the ROM saves them)
//! - TZX files (TAP blocks plus metadata and control blocks)

pub mod tap;
pub mod tzx;

pub use tap::{basic_tap, code_tap, parse_tap, read_tap, write_basic_tap, write_code_tap};
pub use tzx::{TzxBlock, TzxBuilder};

use std::path::Path;

use tracing::info;

use crate::error::ContainerError;
use tzx::HardwareInfo;

/// Determine the output format from a file extension.
pub fn format_from_extension(path: &Path) -> Option<OutputFormat> {
    match path.extension()?.to_str()?.to_lowercase().as_str() {
        "tap" => Some(OutputFormat::Tap),
        "tzx" => Some(OutputFormat::Tzx),
        _ => None,
    }
}

/// The output format for tape images.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// TAP file.
    Tap,
    /// TZX file.
    Tzx,
}

/// Write a TAP image to a file in the specified format.
///
/// A TZX image gets a hardware block in front when the program needs a
/// 128K machine.
pub fn write_output(
    tap_image: &[u8],
    path: &Path,
    format: OutputFormat,
    requires_128k: bool,
) -> Result<(), ContainerError> {
    match format {
        OutputFormat::Tap => {
            std::fs::write(path, tap_image).map_err(|e| ContainerError::io(path, e))?;
            info!(path = %path.display(), bytes = tap_image.len(), "wrote TAP file");
            Ok(())
        }
        OutputFormat::Tzx => tzx_image(tap_image, requires_128k)?.write(path),
    }
}

/// Wrap a TAP image in a TZX image.
pub fn tzx_image(tap_image: &[u8], requires_128k: bool) -> Result<TzxBuilder, ContainerError> {
    let mut builder = TzxBuilder::new();
    if requires_128k {
        builder.push(TzxBlock::HardwareInfo(HardwareInfo {
            requires_128k: true,
            ..Default::default()
        }));
    }
    builder.push_tap(tap_image, tzx::DEFAULT_PAUSE)?;
    Ok(builder)
}
