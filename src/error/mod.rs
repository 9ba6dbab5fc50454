//! Error types surfaced by each stage of the pipeline: schema parsing,
//! type compilation, value encoding, and octet decoding.
//!
//! Each error is a small struct wrapping a boxed, `snafu`-derived "kind"
//! enum, so callers can match on `error.kind` for fine-grained handling
//! while `Result<T, XError>` itself stays cheap to move around.

mod compile;
mod decode;
mod encode;
mod parse;

pub use compile::{CompileError, CompileErrorKind};
pub use decode::{DecodeError, DecodeErrorKind};
pub use encode::{EncodeError, EncodeErrorKind};
pub use parse::{ParseError, ParseErrorKind};

/// The facade-level error returned by [`crate::specification::Specification`],
/// unifying whichever pipeline stage failed: reading schema text, compiling
/// it into codecs, encoding a value, or decoding octets.
#[derive(Debug)]
pub enum Error {
    Parse(ParseError),
    Compile(CompileError),
    Encode(EncodeError),
    Decode(DecodeError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "{e}"),
            Error::Compile(e) => write!(f, "{e}"),
            Error::Encode(e) => write!(f, "{e}"),
            Error::Decode(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            Error::Compile(e) => Some(e),
            Error::Encode(e) => Some(e),
            Error::Decode(e) => Some(e),
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

impl From<CompileError> for Error {
    fn from(e: CompileError) -> Self {
        Error::Compile(e)
    }
}

impl From<EncodeError> for Error {
    fn from(e: EncodeError) -> Self {
        Error::Encode(e)
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}
