//! Error type associated with parsing ASN.1 schema text (`src/schema`).
use snafu::Snafu;
use std::string::String;

/// Variants for every lexical or grammatical failure the schema parser can
/// report.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ParseErrorKind {
    #[snafu(display("unexpected end of input"))]
    UnexpectedEof,
    #[snafu(display("unexpected token `{found}`, expected {expected}"))]
    UnexpectedToken { found: String, expected: String },
    #[snafu(display("invalid number literal `{text}`"))]
    InvalidNumber { text: String },
    #[snafu(display("unterminated string literal"))]
    UnterminatedString,
}

/// A schema parse failure, with the `(line, column)` at which it occurred.
#[derive(Debug)]
pub struct ParseError {
    pub kind: Box<ParseErrorKind>,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind: Box::new(kind),
            line,
            column,
        }
    }
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.kind)
    }
}
