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

//! Fuzz target for the TAP reader and the TZX builder.
//!
//! Random bytes go through the TAP parser, and random program images
//! go through the TAP writer and back into a TZX image.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_tap

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use zxtap::output::tap::{basic_tap, parse_tap};
use zxtap::output::tzx::TzxBuilder;

#[derive(Debug, Arbitrary)]
struct Input {
    raw: Vec<u8>,
    name: String,
    autostart: Option<u16>,
    program: Vec<u8>,
    pause: u16,
}

fuzz_target!(|input: Input| {
    let _ = parse_tap(&input.raw);

    let mut builder = TzxBuilder::new();
    if builder.push_tap(&input.raw, input.pause).is_ok() {
        let _ = builder.to_bytes();
    }

    if let Ok(image) = basic_tap(&input.name, &input.program, input.autostart) {
        let blocks = parse_tap(&image).expect("written image parses");
        assert!(blocks.iter().all(|block| block.is_valid()));
    }
});
