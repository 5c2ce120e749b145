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

//! TOML layout files for TZX images.
//!
//! A layout lists the blocks of a tape in order. Entries can carry an `id`
//! that other entries jump to, open or close groups, add descriptions and
//! wrap their blocks in a loop.
//!
//! ```toml
//! [metadata]
//! title = "Game"
//!
//! [hardware]
//! 128k_only = true
//!
//! [[blocks]]
//! id = "menu"
//! group = "Menu"
//! file = "menu.tap"
//!
//! [[blocks]]
//! desc = "Back to the menu"
//! jump_to = "menu"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ContainerError;
use crate::output::tzx::{
    ArchiveInfo, HardwareInfo, Model, TzxBlock, TzxBuilder, DEFAULT_PAUSE,
};

/// A complete layout file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TzxConfig {
    pub metadata: MetadataConfig,
    pub hardware: HardwareConfig,
    pub blocks: Vec<BlockConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HardwareConfig {
    #[serde(rename = "128k_only")]
    pub k128_only: bool,
    pub use_ay: bool,
    pub use_paging: bool,
    pub model: Option<String>,
}

/// One entry of the block list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlockConfig {
    /// TAP image whose blocks are added.
    pub file: Option<PathBuf>,
    /// Opens a group of this name.
    pub group: Option<String>,
    /// Closes the open group after this entry.
    pub group_end: bool,
    pub desc: Option<String>,
    /// Jump target name.
    pub id: Option<String>,
    pub jump_to: Option<String>,
    /// Repetitions of a loop around this entry's file blocks.
    pub loop_start: Option<u16>,
    pub loop_end: bool,
    /// Pause after each file block in milliseconds.
    #[serde(default = "default_pause")]
    pub pause: u16,
}

fn default_pause() -> u16 {
    DEFAULT_PAUSE
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            file: None,
            group: None,
            group_end: false,
            desc: None,
            id: None,
            jump_to: None,
            loop_start: None,
            loop_end: false,
            pause: default_pause(),
        }
    }
}

impl MetadataConfig {
    pub fn archive_info(&self) -> ArchiveInfo {
        ArchiveInfo {
            title: self.title.clone(),
            author: self.author.clone(),
            year: self.year.clone(),
        }
    }
}

impl HardwareConfig {
    pub fn hardware_info(&self) -> HardwareInfo {
        HardwareInfo {
            requires_128k: self.k128_only,
            uses_ay: self.use_ay,
            uses_paging: self.use_paging,
            model: self
                .model
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(Model::from_name),
        }
    }
}

impl TzxConfig {
    /// Read a layout file.
    pub fn load(path: &Path) -> Result<Self, ContainerError> {
        let text = std::fs::read_to_string(path).map_err(|e| ContainerError::io(path, e))?;
        let mut config = Self::parse(&text).map_err(|source| ContainerError::Toml {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_files(base);
        }
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Make relative file paths relative to `base`.
    pub fn resolve_files(&mut self, base: &Path) {
        for block in &mut self.blocks {
            if let Some(file) = &block.file {
                if file.is_relative() {
                    block.file = Some(base.join(file));
                }
            }
        }
    }

    /// Build the image, reading TAP files from disk.
    pub fn build(&self) -> Result<TzxBuilder, ContainerError> {
        self.build_with(|path| std::fs::read(path).map_err(|e| ContainerError::io(path, e)))
    }

    /// Build the image with `read` supplying the TAP file contents.
    pub fn build_with<F>(&self, mut read: F) -> Result<TzxBuilder, ContainerError>
    where
        F: FnMut(&Path) -> Result<Vec<u8>, ContainerError>,
    {
        let mut builder = TzxBuilder::new();
        builder.push_info(&self.metadata.archive_info(), &self.hardware.hardware_info());

        let mut anchors: HashMap<&str, usize> = HashMap::new();
        let mut jumps: Vec<(usize, &str)> = Vec::new();

        for block in &self.blocks {
            if let Some(id) = block.id.as_deref() {
                anchors.insert(id, builder.len());
            }
            if let Some(group) = block.group.as_deref().filter(|g| !g.is_empty()) {
                builder.push(TzxBlock::GroupStart(group.to_string()));
            }
            if let Some(desc) = block.desc.as_deref().filter(|d| !d.is_empty()) {
                builder.push(TzxBlock::TextDescription(desc.to_string()));
            }
            if let Some(target) = block.jump_to.as_deref() {
                // Patched once every anchor is known
                jumps.push((builder.push(TzxBlock::Jump(0)), target));
            }
            if let Some(repetitions) = block.loop_start.filter(|&r| r > 0) {
                builder.push(TzxBlock::LoopStart(repetitions));
            }
            if let Some(file) = &block.file {
                let tap = read(file)?;
                let count = builder.push_tap(&tap, block.pause)?;
                debug!(file = %file.display(), blocks = count, "added TAP file");
            }
            if block.loop_end {
                builder.push(TzxBlock::LoopEnd);
            }
            if block.group_end {
                builder.push(TzxBlock::GroupEnd);
            }
        }

        for (index, target) in jumps {
            let anchor = anchors
                .get(target)
                .copied()
                .ok_or_else(|| ContainerError::UnknownJumpTarget(target.to_string()))?;
            let distance = anchor as i64 - index as i64;
            let relative = i16::try_from(distance).map_err(|_| ContainerError::JumpOutOfRange {
                target: target.to_string(),
                distance,
            })?;
            builder.replace(index, TzxBlock::Jump(relative));
        }

        Ok(builder)
    }
}
