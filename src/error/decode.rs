//! Error type associated with decoding BER octets against a compiled
//! [`crate::codec::Codec`].
use crate::tag::Tag;
use snafu::Snafu;
use std::string::String;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DecodeErrorKind {
    #[snafu(display("unexpected end of data: needed {needed} more byte(s)"))]
    UnexpectedEof { needed: usize },
    #[snafu(display("indefinite length not supported"))]
    IndefiniteLength,
    #[snafu(display("tag number too large"))]
    TagTooLarge,
    #[snafu(display("length too large for this platform"))]
    LengthTooLarge,
    #[snafu(display("expected tag {expected}, found {actual}"))]
    MismatchedTag { expected: Tag, actual: Tag },
    #[snafu(display("expected {expected} content byte(s), found {actual}"))]
    MismatchedLength { expected: usize, actual: usize },
    #[snafu(display("no choice found for tag {tag}"))]
    NoMatchingChoice { tag: Tag },
    #[snafu(display("unknown ENUMERATED value {value}"))]
    UnknownEnumerated { value: String },
    #[snafu(display("missing required member `{name}`"))]
    MissingMember { name: String },
    #[snafu(display("INTEGER content was empty"))]
    EmptyInteger,
}

/// A decode failure: the input octets did not conform to the expected
/// type, optionally at a known byte offset into the input.
#[derive(Debug)]
pub struct DecodeError {
    pub kind: Box<DecodeErrorKind>,
    pub offset: usize,
}

impl DecodeError {
    pub(crate) fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self {
            kind: Box::new(kind),
            offset,
        }
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} (at byte offset {})", self.kind, self.offset)
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.kind)
    }
}
