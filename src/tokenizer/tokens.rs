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

//! Token table for Sinclair BASIC.
//!
//! Every byte value 0x00-0xFF has exactly one [`TokenDef`]. The table holds
//! the display text used by the keyword matcher, the token kind, and the
//! grammar classes the ROM attaches to each keyword.

use std::sync::OnceLock;

/// First byte value of the keyword range scanned by the matcher.
pub const FIRST_KEYWORD: u8 = 0xA3;

/// Statement separator.
pub const COLON: u8 = b':';
/// Hidden number marker.
pub const NUMBER_MARKER: u8 = 0x0E;
/// End of line marker.
pub const END_OF_LINE: u8 = 0x0D;

/// Base of the unshifted block graphics.
pub const BLOCK_GRAPHICS: u8 = 0x80;
/// Base of the shifted block graphics.
pub const SHIFTED_BLOCK_GRAPHICS: u8 = 0x88;
/// First user defined graphic `{A}`.
pub const UDG_A: u8 = 0x90;

pub const SPECTRUM: u8 = 0xA3;
pub const PLAY: u8 = 0xA4;
pub const AT: u8 = 0xAC;
pub const TAB: u8 = 0xAD;
pub const BIN: u8 = 0xC4;
pub const THEN: u8 = 0xCB;
pub const TO: u8 = 0xCC;
pub const STEP: u8 = 0xCD;
pub const DEF_FN: u8 = 0xCE;
pub const LPRINT: u8 = 0xE0;
pub const REM: u8 = 0xEA;
pub const LET: u8 = 0xF1;
pub const PRINT: u8 = 0xF5;
pub const IF: u8 = 0xFA;

/// What a token is allowed to do syntactically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Literal characters, control codes and operators without a role.
    Typeless,
    /// Always starts a statement.
    Keyword,
    /// Colour attribute, valid as statement and as print item.
    Colourish,
    /// Function returning a number.
    NumericExpression,
    /// Function returning a string.
    StringExpression,
    /// Only valid inside PRINT and LPRINT (AT and TAB).
    PrintOnly,
}

impl TokenKind {
    /// Whether this kind may appear where a statement keyword is expected.
    pub fn starts_statement(&self) -> bool {
        matches!(self, TokenKind::Keyword | TokenKind::Colourish)
    }

    /// Whether this kind is an expression function.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            TokenKind::NumericExpression | TokenKind::StringExpression
        )
    }
}

/// Keyword classes as used by the Spectrum ROM syntax tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarClass {
    /// No further operands.
    NoOperand,
    /// A variable is required (LET, DIM).
    Variable,
    /// An expression must follow (second half of LET).
    Expression,
    /// Optional numeric expression.
    OptionalExpression,
    /// A single character variable must follow (FOR, NEXT).
    SingleCharVariable,
    /// A set of items may be given.
    Items,
    /// A numeric expression must follow.
    NumericExpression,
    /// Colour items.
    Colour,
    /// Two numeric expressions separated by a comma.
    TwoNumbers,
    /// Like [`GrammarClass::TwoNumbers`] but colour items may precede.
    TwoNumbersWithColour,
    /// A string expression must follow.
    StringExpression,
    /// Tape and device commands.
    Device,
    /// One or more string expressions separated by commas.
    StringList,
    /// One or more expressions separated by commas.
    ExpressionList,
    /// One or more variables separated by commas.
    VariableList,
    /// The DEF FN form.
    FunctionDefinition,
}

/// One element of a keyword's grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassItem {
    /// A grammar class.
    Class(GrammarClass),
    /// This byte must literally follow (a separator or a sub-keyword token).
    Expect(u8),
}

use ClassItem::{Class, Expect};
use GrammarClass::*;

/// Definition of one byte value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenDef {
    /// Text as typed by the author, empty for control and typeless bytes.
    pub text: &'static str,
    /// Syntactic role.
    pub kind: TokenKind,
    /// Grammar following the token; empty means unchecked.
    pub classes: &'static [ClassItem],
}

impl TokenDef {
    const fn new(text: &'static str, kind: TokenKind, classes: &'static [ClassItem]) -> Self {
        Self {
            text,
            kind,
            classes,
        }
    }

    const fn typeless(text: &'static str) -> Self {
        Self::new(text, TokenKind::Typeless, &[])
    }

    /// The first grammar class, if the grammar starts with one.
    pub fn first_class(&self) -> Option<GrammarClass> {
        match self.classes.first() {
            Some(Class(class)) => Some(*class),
            _ => None,
        }
    }
}

const PRINTABLE: &str = " !\"#$%&'()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[\\]^_`abcdefghijklmnopqrstuvwxyz{|}~\x7f";

// Indexed by byte offset from the range base, see the graphics escapes.
const BLOCK_TEXT: [&str; 8] = ["{-8}", "{-1}", "{-2}", "{-3}", "{-4}", "{-5}", "{-6}", "{-7}"];

const SHIFTED_BLOCK_TEXT: [&str; 8] = ["{+7}", "{+6}", "{+5}", "{+4}", "{+3}", "{+2}", "{+1}", "{+8}"];

const UDG_TEXT: [&str; 19] = [
    "{A}", "{B}", "{C}", "{D}", "{E}", "{F}", "{G}", "{H}", "{I}", "{J}", "{K}", "{L}", "{M}",
    "{N}", "{O}", "{P}", "{Q}", "{R}", "{S}",
];

const NONE: &[ClassItem] = &[Class(NoOperand)];
const NUM: &[ClassItem] = &[Class(NumericExpression)];
const STR: &[ClassItem] = &[Class(StringExpression)];
const TWO_NUM: &[ClassItem] = &[Class(TwoNumbers)];
const ITEMS: &[ClassItem] = &[Class(Items)];
const OPT: &[ClassItem] = &[Class(OptionalExpression)];
const DEVICE: &[ClassItem] = &[Class(Device)];
const COLOUR: &[ClassItem] = &[Class(Colour)];
const BRACKETED_TWO_NUM: &[ClassItem] = &[
    Expect(b'('),
    Class(TwoNumbers),
    Expect(b')'),
    Class(NoOperand),
];
const SUBSCRIPTED_VARIABLE: &[ClassItem] = &[
    Class(Variable),
    Expect(b'('),
    Class(ExpressionList),
    Expect(b')'),
    Class(NoOperand),
];
const FIGURE: &[ClassItem] = &[
    Class(TwoNumbersWithColour),
    Expect(b','),
    Class(NumericExpression),
];

/// Keyword definitions from 0xA3 (SPECTRUM) to 0xFF (COPY).
const KEYWORDS: [TokenDef; 93] = [
    TokenDef::new("SPECTRUM", TokenKind::Keyword, NONE),
    TokenDef::new("PLAY", TokenKind::Keyword, &[Class(StringList)]),
    TokenDef::new("RND", TokenKind::NumericExpression, NONE),
    TokenDef::new("INKEY$", TokenKind::StringExpression, NONE),
    TokenDef::new("PI", TokenKind::NumericExpression, NONE),
    TokenDef::new("FN", TokenKind::NumericExpression, SUBSCRIPTED_VARIABLE),
    TokenDef::new("POINT", TokenKind::NumericExpression, BRACKETED_TWO_NUM),
    TokenDef::new("SCREEN$", TokenKind::StringExpression, BRACKETED_TWO_NUM),
    TokenDef::new("ATTR", TokenKind::NumericExpression, BRACKETED_TWO_NUM),
    TokenDef::new("AT", TokenKind::PrintOnly, TWO_NUM),
    TokenDef::new("TAB", TokenKind::PrintOnly, NUM),
    TokenDef::new("VAL$", TokenKind::StringExpression, STR),
    TokenDef::new("CODE", TokenKind::NumericExpression, STR),
    TokenDef::new("VAL", TokenKind::NumericExpression, STR),
    TokenDef::new("LEN", TokenKind::NumericExpression, STR),
    TokenDef::new("SIN", TokenKind::NumericExpression, NUM),
    TokenDef::new("COS", TokenKind::NumericExpression, NUM),
    TokenDef::new("TAN", TokenKind::NumericExpression, NUM),
    TokenDef::new("ASN", TokenKind::NumericExpression, NUM),
    TokenDef::new("ACS", TokenKind::NumericExpression, NUM),
    TokenDef::new("ATN", TokenKind::NumericExpression, NUM),
    TokenDef::new("LN", TokenKind::NumericExpression, NUM),
    TokenDef::new("EXP", TokenKind::NumericExpression, NUM),
    TokenDef::new("INT", TokenKind::NumericExpression, NUM),
    TokenDef::new("SQR", TokenKind::NumericExpression, NUM),
    TokenDef::new("SGN", TokenKind::NumericExpression, NUM),
    TokenDef::new("ABS", TokenKind::NumericExpression, NUM),
    TokenDef::new("PEEK", TokenKind::NumericExpression, NUM),
    TokenDef::new("IN", TokenKind::NumericExpression, NUM),
    TokenDef::new("USR", TokenKind::NumericExpression, NUM),
    TokenDef::new("STR$", TokenKind::StringExpression, NUM),
    TokenDef::new("CHR$", TokenKind::StringExpression, NUM),
    TokenDef::new("NOT", TokenKind::NumericExpression, NUM),
    TokenDef::typeless("BIN"),
    TokenDef::new("OR", TokenKind::Typeless, ITEMS),
    TokenDef::new("AND", TokenKind::Typeless, ITEMS),
    TokenDef::new("<=", TokenKind::Typeless, ITEMS),
    TokenDef::new(">=", TokenKind::Typeless, ITEMS),
    TokenDef::new("<>", TokenKind::Typeless, ITEMS),
    TokenDef::typeless("LINE"),
    TokenDef::typeless("THEN"),
    TokenDef::typeless("TO"),
    TokenDef::typeless("STEP"),
    TokenDef::new("DEF FN", TokenKind::Keyword, &[Class(FunctionDefinition)]),
    TokenDef::new("CAT", TokenKind::Keyword, DEVICE),
    TokenDef::new("FORMAT", TokenKind::Keyword, DEVICE),
    TokenDef::new("MOVE", TokenKind::Keyword, DEVICE),
    TokenDef::new("ERASE", TokenKind::Keyword, DEVICE),
    TokenDef::new("OPEN #", TokenKind::Keyword, DEVICE),
    TokenDef::new("CLOSE #", TokenKind::Keyword, DEVICE),
    TokenDef::new("MERGE", TokenKind::Keyword, DEVICE),
    TokenDef::new("VERIFY", TokenKind::Keyword, DEVICE),
    TokenDef::new("BEEP", TokenKind::Keyword, TWO_NUM),
    TokenDef::new("CIRCLE", TokenKind::Keyword, FIGURE),
    TokenDef::new("INK", TokenKind::Colourish, COLOUR),
    TokenDef::new("PAPER", TokenKind::Colourish, COLOUR),
    TokenDef::new("FLASH", TokenKind::Colourish, COLOUR),
    TokenDef::new("BRIGHT", TokenKind::Colourish, COLOUR),
    TokenDef::new("INVERSE", TokenKind::Colourish, COLOUR),
    TokenDef::new("OVER", TokenKind::Colourish, COLOUR),
    TokenDef::new("OUT", TokenKind::Keyword, TWO_NUM),
    TokenDef::new("LPRINT", TokenKind::Keyword, ITEMS),
    TokenDef::new("LLIST", TokenKind::Keyword, OPT),
    TokenDef::new("STOP", TokenKind::Keyword, NONE),
    TokenDef::new("READ", TokenKind::Keyword, &[Class(VariableList)]),
    TokenDef::new("DATA", TokenKind::Colourish, &[Class(ExpressionList)]),
    TokenDef::new("RESTORE", TokenKind::Keyword, OPT),
    TokenDef::new("NEW", TokenKind::Keyword, NONE),
    TokenDef::new("BORDER", TokenKind::Keyword, NUM),
    TokenDef::new("CONTINUE", TokenKind::Keyword, NONE),
    TokenDef::new("DIM", TokenKind::Keyword, SUBSCRIPTED_VARIABLE),
    TokenDef::new("REM", TokenKind::Keyword, ITEMS),
    TokenDef::new(
        "FOR",
        TokenKind::Keyword,
        &[
            Class(SingleCharVariable),
            Expect(b'='),
            Class(NumericExpression),
            Expect(TO),
            Class(NumericExpression),
            Expect(STEP),
            Class(NumericExpression),
        ],
    ),
    TokenDef::new("GO TO", TokenKind::Keyword, NUM),
    TokenDef::new("GO SUB", TokenKind::Keyword, NUM),
    TokenDef::new("INPUT", TokenKind::Keyword, ITEMS),
    TokenDef::new("LOAD", TokenKind::Keyword, DEVICE),
    TokenDef::new("LIST", TokenKind::Keyword, OPT),
    TokenDef::new(
        "LET",
        TokenKind::Keyword,
        &[Class(Variable), Expect(b'='), Class(Expression)],
    ),
    TokenDef::new("PAUSE", TokenKind::Keyword, NUM),
    TokenDef::new("NEXT", TokenKind::Keyword, &[Class(SingleCharVariable)]),
    TokenDef::new("POKE", TokenKind::Keyword, TWO_NUM),
    TokenDef::new("PRINT", TokenKind::Keyword, ITEMS),
    TokenDef::new("PLOT", TokenKind::Keyword, &[Class(TwoNumbersWithColour)]),
    TokenDef::new("RUN", TokenKind::Keyword, OPT),
    TokenDef::new("SAVE", TokenKind::Keyword, DEVICE),
    TokenDef::new("RANDOMIZE", TokenKind::Keyword, OPT),
    TokenDef::new("IF", TokenKind::Keyword, &[Class(NumericExpression), Expect(THEN)]),
    TokenDef::new("CLS", TokenKind::Keyword, NONE),
    TokenDef::new("DRAW", TokenKind::Keyword, FIGURE),
    TokenDef::new("CLEAR", TokenKind::Keyword, OPT),
    TokenDef::new("RETURN", TokenKind::Keyword, NONE),
    TokenDef::new("COPY", TokenKind::Keyword, NONE),
];

fn build_table() -> [TokenDef; 256] {
    let mut table = [TokenDef::typeless(""); 256];

    // Print comma
    table[0x06] = TokenDef::new("", TokenKind::Typeless, NONE);

    for byte in 0x20..=0x7Fusize {
        let offset = byte - 0x20;
        table[byte] = TokenDef::typeless(&PRINTABLE[offset..offset + 1]);
    }
    table[COLON as usize] = TokenDef::new(":", TokenKind::Keyword, NONE);

    for (i, text) in BLOCK_TEXT.iter().enumerate() {
        table[BLOCK_GRAPHICS as usize + i] = TokenDef::typeless(*text);
    }
    for (i, text) in SHIFTED_BLOCK_TEXT.iter().enumerate() {
        table[SHIFTED_BLOCK_GRAPHICS as usize + i] = TokenDef::typeless(*text);
    }
    for (i, text) in UDG_TEXT.iter().enumerate() {
        table[UDG_A as usize + i] = TokenDef::typeless(*text);
    }
    for (i, def) in KEYWORDS.iter().enumerate() {
        table[FIRST_KEYWORD as usize + i] = *def;
    }

    table
}

/// The token table, built on first use.
pub fn token_table() -> &'static [TokenDef; 256] {
    static TABLE: OnceLock<[TokenDef; 256]> = OnceLock::new();
    TABLE.get_or_init(build_table)
}

/// Look up the definition of a byte value.
pub fn lookup(byte: u8) -> &'static TokenDef {
    &token_table()[byte as usize]
}
