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

//! Fuzz target for the zxtap tokenizer.
//!
//! Feeds random listings to the tokenizer looking for panics.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_tokenizer
//!
//! Run for a specific duration:
//!   cargo +nightly fuzz run fuzz_tokenizer -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(source) = std::str::from_utf8(data) {
        // Only Ok or Err, never a panic
        let _ = zxtap::tokenize(source);
    }
});
