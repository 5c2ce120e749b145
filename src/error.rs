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

//! Error types for the zxtap tokenizer.
//!
//! Every failure aborts the conversion run and is reported with the
//! 1-based source line it happened on. Duplicate line numbers are the only
//! advisory diagnostic and are collected as warnings instead.

use ariadne::{Config, Label, Report, ReportKind, Source};
use std::ops::Range;
use thiserror::Error;

/// Error codes for the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Lexical errors (E001-E013)
    InvalidNumber,
    MultipleDecimalPoints,
    NumberOutOfRange,
    MissingBinaryDigits,
    BinaryNumberTooLarge,
    UnclosedSequence,
    UnknownControlCode,
    ControlParameterOutOfRange,
    ControlParameterCount,

    // Grammatical errors (E100-E107)
    PrintOnlyOutsidePrint,
    NotAllowedInBrackets,
    VariableRequired,
    ExpressionRequired,
    SingleCharVariableRequired,
    ExpressionInDefFnHeader,
    TooManyClosingBrackets,
    UnbalancedBrackets,

    // Structural errors (E200-E205)
    MissingLineNumber,
    LineNumberOutOfRange,
    EmptyLine,
    LineTooLong,
    TooManyStatements,
    LineNumberDecreasing,

    // Dialect errors (E300)
    MixedDialect,

    // Input errors (E400)
    InputRead,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl ErrorCode {
    /// Get the numeric code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            // Lexical errors
            ErrorCode::InvalidNumber => "E001",
            ErrorCode::MultipleDecimalPoints => "E002",
            ErrorCode::NumberOutOfRange => "E003",
            ErrorCode::MissingBinaryDigits => "E004",
            ErrorCode::BinaryNumberTooLarge => "E005",
            ErrorCode::UnclosedSequence => "E010",
            ErrorCode::UnknownControlCode => "E011",
            ErrorCode::ControlParameterOutOfRange => "E012",
            ErrorCode::ControlParameterCount => "E013",

            // Grammatical errors
            ErrorCode::PrintOnlyOutsidePrint => "E100",
            ErrorCode::NotAllowedInBrackets => "E101",
            ErrorCode::VariableRequired => "E102",
            ErrorCode::ExpressionRequired => "E103",
            ErrorCode::SingleCharVariableRequired => "E104",
            ErrorCode::ExpressionInDefFnHeader => "E105",
            ErrorCode::TooManyClosingBrackets => "E106",
            ErrorCode::UnbalancedBrackets => "E107",

            // Structural errors
            ErrorCode::MissingLineNumber => "E200",
            ErrorCode::LineNumberOutOfRange => "E201",
            ErrorCode::EmptyLine => "E202",
            ErrorCode::LineTooLong => "E203",
            ErrorCode::TooManyStatements => "E204",
            ErrorCode::LineNumberDecreasing => "E205",

            // Dialect errors
            ErrorCode::MixedDialect => "E300",

            // Input errors
            ErrorCode::InputRead => "E400",
        }
    }

    /// Get the error category this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorCode::InvalidNumber
            | ErrorCode::MultipleDecimalPoints
            | ErrorCode::NumberOutOfRange
            | ErrorCode::MissingBinaryDigits
            | ErrorCode::BinaryNumberTooLarge
            | ErrorCode::UnclosedSequence
            | ErrorCode::UnknownControlCode
            | ErrorCode::ControlParameterOutOfRange
            | ErrorCode::ControlParameterCount => ErrorCategory::Lexical,

            ErrorCode::PrintOnlyOutsidePrint
            | ErrorCode::NotAllowedInBrackets
            | ErrorCode::VariableRequired
            | ErrorCode::ExpressionRequired
            | ErrorCode::SingleCharVariableRequired
            | ErrorCode::ExpressionInDefFnHeader
            | ErrorCode::TooManyClosingBrackets
            | ErrorCode::UnbalancedBrackets => ErrorCategory::Grammatical,

            ErrorCode::MissingLineNumber
            | ErrorCode::LineNumberOutOfRange
            | ErrorCode::EmptyLine
            | ErrorCode::LineTooLong
            | ErrorCode::TooManyStatements
            | ErrorCode::LineNumberDecreasing => ErrorCategory::Structural,

            ErrorCode::MixedDialect => ErrorCategory::Dialect,

            ErrorCode::InputRead => ErrorCategory::Input,
        }
    }
}

/// Broad classification of error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed numbers, escape sequences and control codes.
    Lexical,
    /// Keywords or brackets used in an illegal position.
    Grammatical,
    /// Line numbering, line length and statement count.
    Structural,
    /// 48K and 128K features mixed in one program.
    Dialect,
    /// The source text could not be read.
    Input,
}

/// A tokenizer error tagged with the source line it occurred on.
#[derive(Debug, Error)]
#[error("[{code}] line {line}: {message}")]
pub struct TokenizeError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// The 1-based source line (0 when no line was being read).
    pub line: usize,
    /// Optional hint for fixing the error.
    pub hint: Option<String>,
}

impl TokenizeError {
    /// Create a new tokenizer error.
    pub fn new(code: ErrorCode, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line,
            hint: None,
        }
    }

    /// Add a hint to this error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Get the error code string.
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }
}

/// Result type for tokenizer operations.
pub type Result<T> = std::result::Result<T, TokenizeError>;

/// Warning codes for advisory diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WarningCode {
    /// The same BASIC line number was used twice in a row.
    DuplicateLineNumber,
}

impl WarningCode {
    /// Get the numeric code for this warning.
    pub fn code(&self) -> &'static str {
        match self {
            WarningCode::DuplicateLineNumber => "W001",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A warning that does not stop the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizeWarning {
    /// The warning code.
    pub code: WarningCode,
    /// The warning message.
    pub message: String,
    /// The 1-based source line.
    pub line: usize,
}

impl TokenizeWarning {
    /// Create a new warning.
    pub fn new(code: WarningCode, message: impl Into<String>, line: usize) -> Self {
        Self {
            code,
            message: message.into(),
            line,
        }
    }
}

impl std::fmt::Display for TokenizeWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] line {}: {}", self.code, self.line, self.message)
    }
}

/// Get the content of a 1-based source line, if it exists.
pub fn source_line(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.lines().nth(line - 1)
}

/// Character range of a 1-based source line, for report labels.
fn line_char_range(source: &str, line: usize) -> Range<usize> {
    let mut offset = 0;
    for (index, content) in source.split('\n').enumerate() {
        let len = content.trim_end_matches('\r').chars().count();
        if index + 1 == line {
            return offset..offset + len.max(1);
        }
        offset += content.chars().count() + 1;
    }
    offset..offset
}

/// Format an error with source context.
pub fn format_error(error: &TokenizeError, source: &str, filename: Option<&str>) -> String {
    let filename = filename.unwrap_or("<input>");

    let mut output = String::new();
    output.push_str(&format!("error[{}]: {}\n", error.code_str(), error.message));
    output.push_str(&format!("  --> {}:{}\n", filename, error.line));
    push_excerpt(&mut output, source, error.line);

    if let Some(hint) = &error.hint {
        let width = error.line.to_string().len();
        output.push_str(&format!("{:>width$} = hint: {}\n", "", hint, width = width));
    }

    output
}

/// Format a warning with source context.
pub fn format_warning(warning: &TokenizeWarning, source: &str, filename: Option<&str>) -> String {
    let filename = filename.unwrap_or("<input>");

    let mut output = String::new();
    output.push_str(&format!("warning[{}]: {}\n", warning.code, warning.message));
    output.push_str(&format!("  --> {}:{}\n", filename, warning.line));
    push_excerpt(&mut output, source, warning.line);
    output
}

fn push_excerpt(output: &mut String, source: &str, line: usize) {
    let Some(content) = source_line(source, line) else {
        return;
    };

    let width = line.to_string().len();
    output.push_str(&format!("{:>width$} |\n", "", width = width));
    output.push_str(&format!("{:>width$} | {}\n", line, content, width = width));
    output.push_str(&format!(
        "{:>width$} | {}\n",
        "",
        "^".repeat(content.chars().count().max(1)),
        width = width
    ));
}

/// Render an error as an `ariadne` report without colors.
pub fn render_report(error: &TokenizeError, source: &str, filename: &str) -> String {
    let span = line_char_range(source, error.line);

    let mut report = Report::<(&str, Range<usize>)>::build(ReportKind::Error, filename, span.start)
        .with_config(Config::default().with_color(false))
        .with_code(error.code_str())
        .with_message(&error.message)
        .with_label(Label::new((filename, span)).with_message(&error.message));

    if let Some(hint) = &error.hint {
        report = report.with_help(hint);
    }

    let mut buffer = Vec::new();
    if report
        .finish()
        .write((filename, Source::from(source.to_string())), &mut buffer)
        .is_err()
    {
        return error.to_string();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Errors raised while building or reading tape containers.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid layout file {path}: {source}")]
    Toml {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid TAP data: {0}")]
    InvalidTap(String),

    #[error("Jump target '{0}' not found")]
    UnknownJumpTarget(String),

    #[error("Jump to '{target}' spans {distance} blocks, outside -32768..=32767")]
    JumpOutOfRange { target: String, distance: i64 },

    #[error("{what} is {length} bytes long, the limit is {limit}")]
    TextTooLong {
        what: &'static str,
        length: usize,
        limit: usize,
    },
}

impl ContainerError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        ContainerError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(ErrorCode::InvalidNumber.code(), "E001");
        assert_eq!(ErrorCode::PrintOnlyOutsidePrint.code(), "E100");
        assert_eq!(ErrorCode::MissingLineNumber.code(), "E200");
        assert_eq!(ErrorCode::MixedDialect.code(), "E300");
    }

    #[test]
    fn test_error_category() {
        assert_eq!(ErrorCode::UnclosedSequence.category(), ErrorCategory::Lexical);
        assert_eq!(
            ErrorCode::NotAllowedInBrackets.category(),
            ErrorCategory::Grammatical
        );
        assert_eq!(
            ErrorCode::LineNumberDecreasing.category(),
            ErrorCategory::Structural
        );
        assert_eq!(ErrorCode::MixedDialect.category(), ErrorCategory::Dialect);
    }

    #[test]
    fn test_error_display_includes_line() {
        let error = TokenizeError::new(ErrorCode::EmptyLine, "line contains no statements", 7);
        assert_eq!(error.to_string(), "[E202] line 7: line contains no statements");
    }

    #[test]
    fn test_error_with_hint() {
        let error = TokenizeError::new(ErrorCode::LineNumberOutOfRange, "too big", 1)
            .with_hint("Line numbers run from 0 to 9999");
        assert_eq!(error.code_str(), "E201");
        assert!(error.hint.is_some());
    }

    #[test]
    fn test_format_error_shows_source_line() {
        let source = "10 PRINT 1\n20 GO TO\n";
        let error = TokenizeError::new(ErrorCode::EmptyLine, "broken", 2);
        let text = format_error(&error, source, Some("prog.bas"));
        assert!(text.starts_with("error[E202]: broken\n"));
        assert!(text.contains("--> prog.bas:2"));
        assert!(text.contains("2 | 20 GO TO"));
    }

    #[test]
    fn test_format_warning() {
        let source = "10 CLS\n10 CLS\n";
        let warning = TokenizeWarning::new(WarningCode::DuplicateLineNumber, "again", 2);
        let text = format_warning(&warning, source, None);
        assert!(text.starts_with("warning[W001]: again\n"));
        assert!(text.contains("<input>:2"));
    }

    #[test]
    fn test_line_char_range() {
        let source = "10 CLS\r\n20 RUN\n";
        assert_eq!(line_char_range(source, 1), 0..6);
        assert_eq!(line_char_range(source, 2), 8..14);
    }

    #[test]
    fn test_render_report_mentions_code() {
        let source = "10 PRINT 1\n";
        let error = TokenizeError::new(ErrorCode::InvalidNumber, "bad number", 1);
        let text = render_report(&error, source, "prog.bas");
        assert!(text.contains("E001"));
        assert!(text.contains("bad number"));
    }

    #[test]
    fn test_container_error_messages() {
        let err = ContainerError::TextTooLong {
            what: "Description",
            length: 300,
            limit: 255,
        };
        assert_eq!(err.to_string(), "Description is 300 bytes long, the limit is 255");

        let err = ContainerError::UnknownJumpTarget("menu".to_string());
        assert_eq!(err.to_string(), "Jump target 'menu' not found");
    }
}
