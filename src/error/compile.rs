//! Error type associated with compiling parsed types into codecs
//! (`src/compiler.rs`) and with facade type-name lookups.
use snafu::Snafu;
use std::string::String;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileErrorKind {
    #[snafu(display("unresolved reference to type `{name}`"))]
    UnresolvedReference { name: String },
    #[snafu(display("cycle detected while compiling `{name}`"))]
    Cycle { name: String },
    #[snafu(display("duplicate definition of type `{name}` in module `{module}`"))]
    DuplicateDefinition { module: String, name: String },
    #[snafu(display("ENUMERATED has no declared values"))]
    EmptyEnumerated,
    #[snafu(display("CHOICE has no declared alternatives"))]
    EmptyChoice,
    #[snafu(display("duplicate context tag [{tag}] on CHOICE alternative `{name}`"))]
    DuplicateAlternativeTag { name: String, tag: u32 },
    #[snafu(display("unknown type `{name}`"))]
    UnknownType { name: String },
    #[snafu(display("unknown module `{module}`"))]
    UnknownModule { module: String },
    #[snafu(display("DEFAULT value for member `{member}` does not match its declared type"))]
    InvalidDefaultValue { member: String },
}

/// A schema compilation failure: unresolved references, cycles, malformed
/// type bodies, or an unknown name at `encode`/`decode` lookup time.
#[derive(Debug)]
pub struct CompileError {
    pub kind: Box<CompileErrorKind>,
}

impl CompileError {
    pub(crate) fn new(kind: CompileErrorKind) -> Self {
        Self { kind: Box::new(kind) }
    }
}

impl core::fmt::Display for CompileError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&*self.kind)
    }
}
