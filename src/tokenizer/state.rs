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

//! Scan state carried while tokenizing.

/// Which Spectrum model a program was detected to need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Nothing model specific has been seen yet.
    #[default]
    Unknown,
    /// The program uses UDG `{T}` or `{U}`, which the 128K replaced with keywords.
    Only48K,
    /// The program uses SPECTRUM or PLAY.
    Only128K,
}

impl Dialect {
    pub fn requires_128k(&self) -> bool {
        *self == Dialect::Only128K
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Unknown => "any",
            Dialect::Only48K => "48K",
            Dialect::Only128K => "128K",
        }
    }
}

/// Where the scanner is inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Normal,
    InString,
    /// After REM. Never left until the end of the line.
    InComment,
}

/// Progress through a `DEF FN name(params)=expr` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefFnState {
    #[default]
    Inactive,
    /// Between DEF FN and the opening bracket of the parameter list.
    Header,
    /// Inside the parameter list; `pending` is set while a parameter name
    /// has been written without its value placeholder.
    Parameters { pending: bool },
}

/// Per-line context. Reset at the start of every line.
#[derive(Debug, Clone, Default)]
pub struct LineState {
    pub scan: ScanState,
    pub def_fn: DefFnState,
    /// Bracket nesting depth.
    pub depth: usize,
    /// The last bracket token seen was an opening one.
    pub after_open_bracket: bool,
    /// Inside a PRINT or LPRINT statement.
    pub in_print: bool,
    /// The next token starts a statement.
    pub expect_keyword: bool,
    /// The last byte written continues a variable name.
    pub in_identifier: bool,
    /// Number of `:` separators seen on the line.
    pub statement_count: usize,
    /// Parameters of the last control code escape.
    pub pending_params: Vec<i64>,
}

impl LineState {
    pub fn new() -> Self {
        Self {
            expect_keyword: true,
            ..Default::default()
        }
    }

    /// Start a new statement after a `:` separator.
    pub fn next_statement(&mut self) {
        self.statement_count += 1;
        self.expect_keyword = true;
        self.in_print = false;
        self.in_identifier = false;
        self.pending_params.clear();
    }

    pub fn in_def_fn_header(&self) -> bool {
        self.def_fn == DefFnState::Header
    }
}
