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

//! zxtap Library
//!
//! This library turns ZX Spectrum BASIC listings into the tokenized form the
//! ROM stores in memory and wraps programs in TAP and TZX tape images.
//!
//! # Modules
//!
//! - [`error`] - Error types and error reporting
//! - [`tokenizer`] - Keyword matching, number encoding and line assembly
//! - [`output`] - TAP and TZX file writing and TAP reading
//! - [`config`] - TOML layout files for TZX images
//!
//! # Example
//!
//! ```no_run
//! use zxtap::{output, tokenizer};
//! use std::path::Path;
//!
//! fn convert(source: &str, output_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
//!     // Tokenize
//!     let program = tokenizer::tokenize(source)?;
//!
//!     // Write a TAP file that starts at line 10
//!     output::write_basic_tap(output_path, "demo", &program, Some(10))?;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod output;
pub mod tokenizer;

// Re-export commonly used types
pub use config::TzxConfig;
pub use error::{
    format_error, format_warning, ContainerError, ErrorCode, Result, TokenizeError,
    TokenizeWarning,
};
pub use tokenizer::{tokenize, Dialect, Tokenizer, TokenizerOptions};

/// The version of zxtap.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of the tool.
pub const NAME: &str = "zxtap";

/// A tokenized BASIC program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedProgram {
    /// Concatenated line records.
    pub bytes: Vec<u8>,
    /// The program uses 128K only keywords.
    pub requires_128k: bool,
    pub warnings: Vec<TokenizeWarning>,
}

/// Tokenize a BASIC listing.
///
/// This is the main entry point for converting source text. Besides the
/// bytes it reports the detected dialect and any duplicate line numbers.
///
/// # Example
///
/// ```no_run
/// let source = "10 PRINT \"HELLO\"\n20 GO TO 10\n";
///
/// match zxtap::tokenize_program(source, Default::default()) {
///     Ok(program) => println!("Tokenized {} bytes", program.bytes.len()),
///     Err(e) => eprintln!("Tokenizer error: {}", e),
/// }
/// ```
pub fn tokenize_program(source: &str, options: TokenizerOptions) -> Result<TokenizedProgram> {
    let mut tokenizer = Tokenizer::with_options(options);
    let bytes = tokenizer.parse(source)?;
    Ok(TokenizedProgram {
        bytes,
        requires_128k: tokenizer.requires_128k(),
        warnings: tokenizer.take_warnings(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name() {
        assert_eq!(NAME, "zxtap");
    }

    #[test]
    fn test_tokenize_program_reports_dialect() {
        let program = tokenize_program("10 PLAY \"a\"\n", TokenizerOptions::default()).unwrap();
        assert!(program.requires_128k);
        assert!(program.warnings.is_empty());
        assert_eq!(&program.bytes[..2], &[0x00, 0x0A]);
    }

    #[test]
    fn test_tokenize_program_collects_warnings() {
        let program =
            tokenize_program("10 REM a\n10 REM b\n", TokenizerOptions::default()).unwrap();
        assert_eq!(program.warnings.len(), 1);
        assert!(!program.requires_128k);
    }
}
