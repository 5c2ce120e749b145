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

//! Context checks for matched tokens.
//!
//! The ROM decides what may follow a keyword from the keyword's class list.
//! Only the checks that can be decided while scanning left to right are made
//! here: the first class of a keyword against the bracket context, AT and TAB
//! outside PRINT, and expressions in a DEF FN header.

use tracing::debug;

use super::helpers::ScanHelpers;
use super::line::LineScanner;
use super::state::Dialect;
use super::tokens::{GrammarClass, TokenDef, TokenKind, AT, COLON, IF, LET, PLAY, REM, SPECTRUM, TAB};
use crate::error::{ErrorCode, Result};

/// Trait for token validation and dialect tracking.
pub trait GrammarValidator {
    /// Check that a matched token is legal in the current context.
    fn validate_token(&self, byte: u8, def: &TokenDef) -> Result<()>;

    /// Record that the program needs `target`, failing if it already
    /// committed to the other model.
    fn update_dialect(&mut self, target: Dialect, conflict: &str) -> Result<()>;

    /// Update the dialect for a matched keyword.
    fn observe_token(&mut self, byte: u8) -> Result<()>;
}

impl<'src> GrammarValidator for LineScanner<'src> {
    fn validate_token(&self, byte: u8, def: &TokenDef) -> Result<()> {
        if byte == COLON {
            return Ok(());
        }

        if (byte == AT || byte == TAB) && !self.state.in_print {
            return Err(self
                .error(
                    ErrorCode::PrintOnlyOutsidePrint,
                    format!("{} only allowed in PRINT statements", def.text),
                )
                .with_hint("use AT and TAB as PRINT items, e.g. PRINT AT 0,0;\"x\""));
        }

        if def.kind == TokenKind::Keyword && !def.classes.is_empty() {
            self.validate_keyword_class(byte, def)?;
        }

        if def.kind.is_expression() && self.state.in_def_fn_header() {
            return Err(self.error(
                ErrorCode::ExpressionInDefFnHeader,
                format!("{} not allowed here in DEF FN", def.text),
            ));
        }

        Ok(())
    }

    fn update_dialect(&mut self, target: Dialect, conflict: &str) -> Result<()> {
        match self.dialect {
            Dialect::Unknown => {
                debug!(line = self.line, dialect = target.name(), "detected dialect");
                self.dialect = target;
                Ok(())
            }
            current if current == target => Ok(()),
            current => Err(self
                .error(ErrorCode::MixedDialect, conflict.to_string())
                .with_hint(format!(
                    "the program was already detected as {} only",
                    current.name()
                ))),
        }
    }

    fn observe_token(&mut self, byte: u8) -> Result<()> {
        if byte == SPECTRUM || byte == PLAY {
            let name = super::tokens::lookup(byte).text;
            return self.update_dialect(
                Dialect::Only128K,
                &format!("{} is a 128K keyword but the program uses 48K UDGs", name),
            );
        }
        Ok(())
    }
}

impl<'src> LineScanner<'src> {
    fn validate_keyword_class(&self, byte: u8, def: &TokenDef) -> Result<()> {
        if byte == REM {
            return Ok(());
        }
        if (byte == IF || byte == LET) && self.state.depth > 0 {
            return Err(self.error(
                ErrorCode::NotAllowedInBrackets,
                format!("{} not allowed within brackets", def.text),
            ));
        }

        match def.first_class() {
            Some(GrammarClass::Variable) if self.state.after_open_bracket => Err(self.error(
                ErrorCode::VariableRequired,
                format!("Variable required after {}", def.text),
            )),
            Some(GrammarClass::Expression)
                if !self.state.after_open_bracket && self.state.depth == 0 =>
            {
                Err(self.error(
                    ErrorCode::ExpressionRequired,
                    format!("Expression required after {}", def.text),
                ))
            }
            Some(GrammarClass::SingleCharVariable) if self.state.after_open_bracket => {
                Err(self.error(
                    ErrorCode::SingleCharVariableRequired,
                    format!("Single character variable required after {}", def.text),
                ))
            }
            _ => Ok(()),
        }
    }
}
