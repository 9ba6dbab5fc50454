//! Error type associated with encoding a [`crate::value::Value`] against a
//! compiled [`crate::codec::Codec`].
use snafu::Snafu;
use std::string::String;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EncodeErrorKind {
    #[snafu(display("length too large for BER encoding"))]
    LengthTooLarge,
    #[snafu(display("value does not conform to {type_name}: {reason}"))]
    InvalidShape { type_name: String, reason: String },
    #[snafu(display("missing required member `{name}`"))]
    MissingMember { name: String },
    #[snafu(display("unknown ENUMERATED value `{value}`"))]
    UnknownEnumerated { value: String },
    #[snafu(display("unknown CHOICE alternative `{name}`"))]
    UnknownAlternative { name: String },
    #[snafu(display("odd-length hex string"))]
    OddLengthHex,
}

/// An encode failure: the supplied [`Value`](crate::value::Value) does not
/// conform to the shape its codec expects.
#[derive(Debug)]
pub struct EncodeError {
    pub kind: Box<EncodeErrorKind>,
}

impl EncodeError {
    pub(crate) fn new(kind: EncodeErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

impl core::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.kind)
    }
}
