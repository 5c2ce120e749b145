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

//! TZX tape image writer.
//!
//! TZX wraps TAP blocks as "standard speed data" blocks and adds blocks for
//! metadata and tape control:
//! - Archive info (title, author, year) and hardware requirements
//! - Text descriptions and named groups
//! - Jumps, loops and "stop the tape on a 48K machine"
//!
//! The file starts with the `ZXTape!` signature, an end-of-text marker and
//! the format version.

use std::path::Path;

use tracing::info;

use super::tap::raw_blocks;
use crate::error::ContainerError;

/// File signature.
pub const SIGNATURE: &[u8; 7] = b"ZXTape!";
/// Marker following the signature.
pub const END_OF_TEXT: u8 = 0x1A;
pub const MAJOR_VERSION: u8 = 1;
pub const MINOR_VERSION: u8 = 20;
/// Pause after a data block in milliseconds when none is given.
pub const DEFAULT_PAUSE: u16 = 1000;

/// Longest text stored behind a one byte length.
const MAX_TEXT: usize = 255;

/// Spectrum models a tape can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Spectrum128,
    Plus2,
    Plus2A,
    Plus3,
}

impl Model {
    /// Parse a model name as given on the command line or in a layout file.
    /// Unknown names mean the plain 128K.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "+2" => Model::Plus2,
            "+2A" => Model::Plus2A,
            "+3" => Model::Plus3,
            _ => Model::Spectrum128,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Model::Spectrum128 => "128",
            Model::Plus2 => "+2",
            Model::Plus2A => "+2A",
            Model::Plus3 => "+3",
        }
    }

    /// Hardware ID in the computer table.
    pub fn hardware_id(self) -> u8 {
        match self {
            Model::Spectrum128 => 0x03,
            Model::Plus2 => 0x04,
            // Same hardware as far as tapes are concerned
            Model::Plus2A | Model::Plus3 => 0x05,
        }
    }
}

/// Contents of an archive info block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
}

impl ArchiveInfo {
    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }

    fn entries(&self) -> impl Iterator<Item = (u8, &str)> {
        [(0x00, &self.title), (0x02, &self.author), (0x03, &self.year)]
            .into_iter()
            .filter_map(|(id, text)| {
                text.as_deref()
                    .filter(|t| !t.is_empty())
                    .map(|t| (id, t))
            })
    }
}

/// Contents of a hardware type block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HardwareInfo {
    pub requires_128k: bool,
    pub uses_ay: bool,
    /// Memory paging is implied by the 128K entries; it only forces the block.
    pub uses_paging: bool,
    pub model: Option<Model>,
}

impl HardwareInfo {
    pub fn is_empty(&self) -> bool {
        !self.requires_128k && !self.uses_ay && !self.uses_paging && self.model.is_none()
    }

    /// Entries as (hardware type, hardware id, information) triples.
    fn entries(&self) -> Vec<[u8; 3]> {
        let mut entries = Vec::new();
        if self.requires_128k {
            // Runs on the 128K, does not run on the 48K
            entries.push([0x00, 0x03, 0x01]);
            entries.push([0x00, 0x01, 0x03]);
        }
        if self.uses_ay {
            entries.push([0x03, 0x00, 0x01]);
        }
        if let Some(model) = self.model {
            entries.push([0x00, model.hardware_id(), 0x01]);
        }
        entries
    }
}

/// One TZX block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TzxBlock {
    /// A TAP block (flag to checksum) played at normal speed.
    StandardSpeed { pause: u16, data: Vec<u8> },
    GroupStart(String),
    GroupEnd,
    /// Relative jump in blocks; 1 is the next block.
    Jump(i16),
    LoopStart(u16),
    LoopEnd,
    StopIf48K,
    TextDescription(String),
    ArchiveInfo(ArchiveInfo),
    HardwareInfo(HardwareInfo),
}

impl TzxBlock {
    pub fn id(&self) -> u8 {
        match self {
            TzxBlock::StandardSpeed { .. } => 0x10,
            TzxBlock::GroupStart(_) => 0x21,
            TzxBlock::GroupEnd => 0x22,
            TzxBlock::Jump(_) => 0x23,
            TzxBlock::LoopStart(_) => 0x24,
            TzxBlock::LoopEnd => 0x25,
            TzxBlock::StopIf48K => 0x2A,
            TzxBlock::TextDescription(_) => 0x30,
            TzxBlock::ArchiveInfo(_) => 0x32,
            TzxBlock::HardwareInfo(_) => 0x33,
        }
    }

    /// Encode the block, ID byte included.
    pub fn encode(&self) -> Result<Vec<u8>, ContainerError> {
        let mut bytes = vec![self.id()];
        match self {
            TzxBlock::StandardSpeed { pause, data } => {
                let length = u16::try_from(data.len()).map_err(|_| ContainerError::TextTooLong {
                    what: "Data block",
                    length: data.len(),
                    limit: u16::MAX as usize,
                })?;
                bytes.extend_from_slice(&pause.to_le_bytes());
                bytes.extend_from_slice(&length.to_le_bytes());
                bytes.extend_from_slice(data);
            }
            TzxBlock::GroupStart(name) => push_text(&mut bytes, "Group name", name)?,
            TzxBlock::TextDescription(text) => push_text(&mut bytes, "Description", text)?,
            TzxBlock::Jump(distance) => bytes.extend_from_slice(&distance.to_le_bytes()),
            TzxBlock::LoopStart(repetitions) => {
                bytes.extend_from_slice(&repetitions.to_le_bytes())
            }
            TzxBlock::StopIf48K => bytes.extend_from_slice(&0u32.to_le_bytes()),
            TzxBlock::GroupEnd | TzxBlock::LoopEnd => {}
            TzxBlock::ArchiveInfo(archive) => {
                let mut body = Vec::new();
                let mut count = 0u8;
                for (id, text) in archive.entries() {
                    body.push(id);
                    push_text(&mut body, "Archive text", text)?;
                    count += 1;
                }
                bytes.extend_from_slice(&((body.len() + 1) as u16).to_le_bytes());
                bytes.push(count);
                bytes.extend(body);
            }
            TzxBlock::HardwareInfo(hardware) => {
                let entries = hardware.entries();
                bytes.push(entries.len() as u8);
                for entry in entries {
                    bytes.extend_from_slice(&entry);
                }
            }
        }
        Ok(bytes)
    }
}

fn push_text(bytes: &mut Vec<u8>, what: &'static str, text: &str) -> Result<(), ContainerError> {
    if text.len() > MAX_TEXT {
        return Err(ContainerError::TextTooLong {
            what,
            length: text.len(),
            limit: MAX_TEXT,
        });
    }
    bytes.push(text.len() as u8);
    bytes.extend_from_slice(text.as_bytes());
    Ok(())
}

/// A TZX image under construction.
#[derive(Debug, Clone, Default)]
pub struct TzxBuilder {
    blocks: Vec<TzxBlock>,
}

impl TzxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block and return its index.
    pub fn push(&mut self, block: TzxBlock) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// Replace the block at `index`.
    pub fn replace(&mut self, index: usize, block: TzxBlock) {
        if let Some(slot) = self.blocks.get_mut(index) {
            *slot = block;
        }
    }

    /// Append archive and hardware blocks unless they are empty.
    pub fn push_info(&mut self, archive: &ArchiveInfo, hardware: &HardwareInfo) {
        if !archive.is_empty() {
            self.push(TzxBlock::ArchiveInfo(archive.clone()));
        }
        if !hardware.is_empty() {
            self.push(TzxBlock::HardwareInfo(hardware.clone()));
        }
    }

    /// Append every block of a TAP image as a standard speed block.
    /// Returns the number of blocks added.
    pub fn push_tap(&mut self, tap: &[u8], pause: u16) -> Result<usize, ContainerError> {
        let blocks = raw_blocks(tap)?;
        let count = blocks.len();
        for data in blocks {
            self.push(TzxBlock::StandardSpeed {
                pause,
                data: data.to_vec(),
            });
        }
        Ok(count)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[TzxBlock] {
        &self.blocks
    }

    /// Encode the whole image.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ContainerError> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(SIGNATURE);
        bytes.push(END_OF_TEXT);
        bytes.push(MAJOR_VERSION);
        bytes.push(MINOR_VERSION);
        for block in &self.blocks {
            bytes.extend(block.encode()?);
        }
        Ok(bytes)
    }

    pub fn write(&self, path: &Path) -> Result<(), ContainerError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|e| ContainerError::io(path, e))?;
        info!(
            path = %path.display(),
            blocks = self.blocks.len(),
            bytes = bytes.len(),
            "wrote TZX image"
        );
        Ok(())
    }
}

/// Settings for building a TZX from a list of input files.
#[derive(Debug, Clone)]
pub struct InputLayout {
    pub pause: u16,
    pub archive: ArchiveInfo,
    pub hardware: HardwareInfo,
    /// Put a 48K stop block between inputs.
    pub multiload: bool,
    /// Wrap all inputs in a group of this name.
    pub group: Option<String>,
}

impl Default for InputLayout {
    fn default() -> Self {
        Self {
            pause: DEFAULT_PAUSE,
            archive: ArchiveInfo::default(),
            hardware: HardwareInfo::default(),
            multiload: false,
            group: None,
        }
    }
}

/// Build a TZX from input files in order. Files ending in `.desc` become
/// text descriptions, everything else is read as a TAP image.
pub fn build_from_inputs(inputs: &[&Path], layout: &InputLayout) -> Result<TzxBuilder, ContainerError> {
    let mut builder = TzxBuilder::new();
    builder.push_info(&layout.archive, &layout.hardware);

    let group = layout.group.as_deref().filter(|g| !g.is_empty() && !inputs.is_empty());
    if let Some(name) = group {
        builder.push(TzxBlock::GroupStart(name.to_string()));
    }

    for (index, path) in inputs.iter().enumerate() {
        let bytes = std::fs::read(path).map_err(|e| ContainerError::io(path, e))?;
        if is_description(path) {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if !text.is_empty() {
                builder.push(TzxBlock::TextDescription(text));
            }
        } else {
            builder.push_tap(&bytes, layout.pause)?;
        }

        if layout.multiload && index + 1 < inputs.len() {
            builder.push(TzxBlock::StopIf48K);
        }
    }

    if group.is_some() {
        builder.push(TzxBlock::GroupEnd);
    }
    Ok(builder)
}

fn is_description(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("desc"))
}
