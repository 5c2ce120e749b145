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

//! TAP tape image writer and reader.
//!
//! A TAP file is a sequence of blocks, each stored as:
//! - 2-byte block length (little-endian)
//! - Flag byte (0x00 header, 0xFF data)
//! - Block data
//! - Checksum byte, the XOR of flag and data
//!
//! Files saved by the ROM are a 19 byte header block followed by a data block.

use std::path::Path;

use tracing::info;

use crate::error::ContainerError;

/// Length field of a header block.
pub const HEADER_LENGTH: u16 = 0x13;
/// Flag byte of header blocks.
pub const HEADER_FLAG: u8 = 0x00;
/// Flag byte of data blocks.
pub const DATA_FLAG: u8 = 0xFF;
/// Length of the file name field.
pub const NAME_LENGTH: usize = 10;
/// Autostart value meaning "do not run after loading".
pub const NO_AUTOSTART: u16 = 0x8000;
/// Load address used for CODE files when none is given.
pub const DEFAULT_CODE_ADDRESS: u16 = 32768;

/// File type stored in a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    Program,
    NumberArray,
    CharacterArray,
    Code,
}

impl BlockType {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(BlockType::Program),
            1 => Some(BlockType::NumberArray),
            2 => Some(BlockType::CharacterArray),
            3 => Some(BlockType::Code),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            BlockType::Program => 0,
            BlockType::NumberArray => 1,
            BlockType::CharacterArray => 2,
            BlockType::Code => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Program => "Program",
            BlockType::NumberArray => "Number array",
            BlockType::CharacterArray => "Character array",
            BlockType::Code => "Bytes",
        }
    }
}

/// Contents of a header block between flag and checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapHeader {
    /// Raw type byte; see [`BlockType`].
    pub block_type: u8,
    /// Space padded file name.
    pub name: [u8; NAME_LENGTH],
    pub data_length: u16,
    /// Autostart line for programs, load address for code.
    pub param1: u16,
    /// Program length without variables for programs, 32768 for code.
    pub param2: u16,
}

impl TapHeader {
    /// Header for a BASIC program without variables.
    pub fn program(name: &str, length: u16, autostart: Option<u16>) -> Self {
        Self {
            block_type: BlockType::Program.to_byte(),
            name: pad_name(name),
            data_length: length,
            param1: autostart.unwrap_or(NO_AUTOSTART),
            param2: length,
        }
    }

    /// Header for a block of machine code or data.
    pub fn code(name: &str, length: u16, address: u16) -> Self {
        Self {
            block_type: BlockType::Code.to_byte(),
            name: pad_name(name),
            data_length: length,
            param1: address,
            param2: 32768,
        }
    }

    /// Decode the 17 bytes between flag and checksum.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != 17 {
            return None;
        }
        let mut name = [b' '; NAME_LENGTH];
        name.copy_from_slice(&bytes[1..11]);
        Some(Self {
            block_type: bytes[0],
            name,
            data_length: u16::from_le_bytes([bytes[11], bytes[12]]),
            param1: u16::from_le_bytes([bytes[13], bytes[14]]),
            param2: u16::from_le_bytes([bytes[15], bytes[16]]),
        })
    }

    /// The 17 bytes between flag and checksum.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(17);
        bytes.push(self.block_type);
        bytes.extend_from_slice(&self.name);
        bytes.extend_from_slice(&self.data_length.to_le_bytes());
        bytes.extend_from_slice(&self.param1.to_le_bytes());
        bytes.extend_from_slice(&self.param2.to_le_bytes());
        bytes
    }

    pub fn kind(&self) -> Option<BlockType> {
        BlockType::from_byte(self.block_type)
    }

    /// File name with padding removed.
    pub fn name_str(&self) -> String {
        String::from_utf8_lossy(&self.name).trim_end().to_string()
    }
}

/// Pad or truncate a file name to the header's ten bytes.
fn pad_name(name: &str) -> [u8; NAME_LENGTH] {
    let mut padded = [b' '; NAME_LENGTH];
    for (slot, byte) in padded.iter_mut().zip(name.bytes()) {
        *slot = byte;
    }
    padded
}

/// XOR of all bytes.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &b| acc ^ b)
}

/// Build a complete block: length, flag, data, checksum.
pub fn block(flag: u8, data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    let length = u16::try_from(data.len() + 2).map_err(|_| {
        ContainerError::InvalidTap(format!(
            "{} bytes do not fit into a single block",
            data.len()
        ))
    })?;

    let mut bytes = Vec::with_capacity(data.len() + 4);
    bytes.extend_from_slice(&length.to_le_bytes());
    bytes.push(flag);
    bytes.extend_from_slice(data);
    bytes.push(checksum(&bytes[2..]));
    Ok(bytes)
}

pub fn header_block(header: &TapHeader) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(HEADER_LENGTH as usize + 2);
    bytes.extend_from_slice(&HEADER_LENGTH.to_le_bytes());
    bytes.push(HEADER_FLAG);
    bytes.extend_from_slice(&header.to_bytes());
    bytes.push(checksum(&bytes[2..]));
    bytes
}

pub fn data_block(data: &[u8]) -> Result<Vec<u8>, ContainerError> {
    block(DATA_FLAG, data)
}

fn data_length(data: &[u8]) -> Result<u16, ContainerError> {
    u16::try_from(data.len()).map_err(|_| {
        ContainerError::InvalidTap(format!("{} bytes exceed the 64K address space", data.len()))
    })
}

/// A tokenized BASIC program as a TAP image.
pub fn basic_tap(name: &str, program: &[u8], autostart: Option<u16>) -> Result<Vec<u8>, ContainerError> {
    let header = TapHeader::program(name, data_length(program)?, autostart);
    let mut bytes = header_block(&header);
    bytes.extend(data_block(program)?);
    Ok(bytes)
}

/// A block of bytes loaded at `address` as a TAP image.
pub fn code_tap(name: &str, code: &[u8], address: u16) -> Result<Vec<u8>, ContainerError> {
    let header = TapHeader::code(name, data_length(code)?, address);
    let mut bytes = header_block(&header);
    bytes.extend(data_block(code)?);
    Ok(bytes)
}

/// Write a BASIC program TAP file.
pub fn write_basic_tap(
    path: &Path,
    name: &str,
    program: &[u8],
    autostart: Option<u16>,
) -> Result<(), ContainerError> {
    let bytes = basic_tap(name, program, autostart)?;
    std::fs::write(path, &bytes).map_err(|e| ContainerError::io(path, e))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote TAP program");
    Ok(())
}

/// Write a CODE TAP file.
pub fn write_code_tap(path: &Path, name: &str, code: &[u8], address: u16) -> Result<(), ContainerError> {
    let bytes = code_tap(name, code, address)?;
    std::fs::write(path, &bytes).map_err(|e| ContainerError::io(path, e))?;
    info!(path = %path.display(), bytes = bytes.len(), "wrote TAP code");
    Ok(())
}

/// A block read back from a TAP image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapBlock {
    pub flag: u8,
    /// Bytes between flag and checksum.
    pub data: Vec<u8>,
    pub checksum: u8,
    /// Decoded header for 19 byte header blocks.
    pub header: Option<TapHeader>,
}

impl TapBlock {
    fn from_raw(raw: &[u8]) -> Result<Self, ContainerError> {
        let (&flag, rest) = raw
            .split_first()
            .ok_or_else(|| ContainerError::InvalidTap("empty block".to_string()))?;
        let (&checksum, data) = rest
            .split_last()
            .ok_or_else(|| ContainerError::InvalidTap("block without checksum".to_string()))?;

        let header = if flag == HEADER_FLAG {
            TapHeader::from_bytes(data)
        } else {
            None
        };

        Ok(Self {
            flag,
            data: data.to_vec(),
            checksum,
            header,
        })
    }

    pub fn is_header(&self) -> bool {
        self.flag == HEADER_FLAG
    }

    /// Whether the stored checksum matches flag and data.
    pub fn is_valid(&self) -> bool {
        checksum(&self.data) ^ self.flag == self.checksum
    }

    /// Length as stored in the length field.
    pub fn length(&self) -> usize {
        self.data.len() + 2
    }
}

/// Split a TAP image into its blocks, each from flag to checksum.
pub fn raw_blocks(bytes: &[u8]) -> Result<Vec<&[u8]>, ContainerError> {
    let mut blocks = Vec::new();
    let mut rest = bytes;

    while !rest.is_empty() {
        let [lo, hi, tail @ ..] = rest else {
            return Err(ContainerError::InvalidTap(
                "truncated block length".to_string(),
            ));
        };
        let length = u16::from_le_bytes([*lo, *hi]) as usize;
        if tail.len() < length {
            return Err(ContainerError::InvalidTap(format!(
                "block {} claims {} bytes but only {} remain",
                blocks.len(),
                length,
                tail.len()
            )));
        }
        let (block, next) = tail.split_at(length);
        blocks.push(block);
        rest = next;
    }

    Ok(blocks)
}

/// Parse a TAP image.
pub fn parse_tap(bytes: &[u8]) -> Result<Vec<TapBlock>, ContainerError> {
    raw_blocks(bytes)?
        .into_iter()
        .map(TapBlock::from_raw)
        .collect()
}

/// Read and parse a TAP file.
pub fn read_tap(path: &Path) -> Result<Vec<TapBlock>, ContainerError> {
    let bytes = std::fs::read(path).map_err(|e| ContainerError::io(path, e))?;
    parse_tap(&bytes)
}

/// Default tape name for an input file: its stem, cut to ten bytes.
pub fn default_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut end = stem.len().min(NAME_LENGTH);
    while !stem.is_char_boundary(end) {
        end -= 1;
    }
    stem[..end].to_string()
}

/// Hex dump lines of sixteen bytes each.
pub fn hex_lines(data: &[u8]) -> Vec<String> {
    data.chunks(16)
        .map(|chunk| {
            chunk
                .iter()
                .map(|b| format!("{:02X}", b))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checksum() {
        assert_eq!(checksum(&[]), 0);
        assert_eq!(checksum(&[0xFF, 0x0F]), 0xF0);
        assert_eq!(checksum(&[0x12, 0x12]), 0);
    }

    #[test]
    fn test_header_block_layout() {
        let header = TapHeader::program("hello", 6, Some(10));
        let block = header_block(&header);

        assert_eq!(block.len(), 21);
        assert_eq!(&block[0..2], &[0x13, 0x00]);
        assert_eq!(block[2], HEADER_FLAG);
        assert_eq!(block[3], 0x00);
        assert_eq!(&block[4..14], b"hello     ");
        assert_eq!(&block[14..16], &[6, 0]);
        assert_eq!(&block[16..18], &[10, 0]);
        assert_eq!(&block[18..20], &[6, 0]);
        assert_eq!(block[20], checksum(&block[2..20]));
    }

    #[test]
    fn test_no_autostart() {
        let header = TapHeader::program("x", 1, None);
        assert_eq!(header.param1, NO_AUTOSTART);
    }

    #[test]
    fn test_code_header() {
        let header = TapHeader::code("screen", 6912, 16384);
        assert_eq!(header.kind(), Some(BlockType::Code));
        assert_eq!(header.param1, 16384);
        assert_eq!(header.param2, 32768);
    }

    #[test]
    fn test_long_names_are_truncated() {
        let header = TapHeader::program("averylongname", 1, None);
        assert_eq!(&header.name, b"averylongn");
        assert_eq!(header.name_str(), "averylongn");
    }

    #[test]
    fn test_data_block_layout() {
        let block = data_block(&[0x01, 0x02]).unwrap();
        assert_eq!(block, vec![0x04, 0x00, 0xFF, 0x01, 0x02, 0xFF ^ 0x01 ^ 0x02]);
    }

    #[test]
    fn test_parse_basic_tap() {
        let program = [0x00, 0x0A, 0x02, 0x00, 0xFB, 0x0D];
        let bytes = basic_tap("demo", &program, Some(10)).unwrap();
        let blocks = parse_tap(&bytes).unwrap();

        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(TapBlock::is_valid));

        let header = blocks[0].header.as_ref().unwrap();
        assert_eq!(header.name_str(), "demo");
        assert_eq!(header.kind(), Some(BlockType::Program));
        assert_eq!(header.data_length, 6);
        assert_eq!(header.param1, 10);

        assert_eq!(blocks[1].flag, DATA_FLAG);
        assert_eq!(blocks[1].data, program.to_vec());
        assert_eq!(blocks[1].length(), 8);
    }

    #[test]
    fn test_bad_checksum_detected() {
        let mut bytes = code_tap("c", &[1, 2, 3], 32768).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;
        let blocks = parse_tap(&bytes).unwrap();
        assert!(blocks[0].is_valid());
        assert!(!blocks[1].is_valid());
    }

    #[test]
    fn test_truncated_tap() {
        let bytes = code_tap("c", &[1, 2, 3], 32768).unwrap();
        assert!(matches!(
            parse_tap(&bytes[..bytes.len() - 1]),
            Err(ContainerError::InvalidTap(_))
        ));
        assert!(matches!(parse_tap(&[0x05]), Err(ContainerError::InvalidTap(_))));
        assert!(matches!(
            parse_tap(&[0x00, 0x00]),
            Err(ContainerError::InvalidTap(_))
        ));
    }

    #[test]
    fn test_raw_blocks() {
        let bytes = code_tap("c", &[9], 0).unwrap();
        let blocks = raw_blocks(&bytes).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].len(), 19);
        assert_eq!(blocks[1], &[DATA_FLAG, 9, DATA_FLAG ^ 9]);
    }

    #[test]
    fn test_default_name() {
        assert_eq!(default_name(Path::new("dir/game.bas")), "game");
        assert_eq!(default_name(Path::new("a_very_long_file.bas")), "a_very_lon");
    }

    #[test]
    fn test_hex_lines() {
        let data: Vec<u8> = (0..20).collect();
        let lines = hex_lines(&data);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00 01 02"));
        assert_eq!(lines[1], "10 11 12 13");
    }
}
