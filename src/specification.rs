//! The public facade: compile ASN.1 schema text once, then encode and
//! decode dynamic [`Value`]s against its named types (§2, §4.5).

use std::sync::Arc;

use crate::codec::Codec;
use crate::compiler::{self, CompiledSchema};
use crate::error::{CompileError, CompileErrorKind, Error};
use crate::schema::parse_modules;
use crate::value::Value;

/// Tunables threaded through [`Specification::compile_with_options`].
/// Reserved for constraint-checking toggles; today it carries only a
/// module-name override, useful when a schema's own module name is a
/// cosmetic placeholder the caller wants replaced before compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub module_name_override: Option<String>,
}

/// A compiled schema, ready to encode and decode values against its
/// named types.
#[derive(Debug)]
pub struct Specification {
    schema: CompiledSchema,
}

impl Specification {
    /// Parses and compiles `text` with default options.
    pub fn compile(text: &str) -> Result<Self, Error> {
        Self::compile_with_options(text, &CompileOptions::default())
    }

    pub fn compile_with_options(text: &str, options: &CompileOptions) -> Result<Self, Error> {
        let mut parsed = parse_modules(text)?;
        if let Some(name) = &options.module_name_override {
            for module in &mut parsed.modules {
                module.name = name.clone();
            }
        }
        let schema = compiler::compile(&parsed)?;
        Ok(Self { schema })
    }

    /// Encodes `value` against the global type `type_name`.
    pub fn encode(&self, type_name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        let codec = self.lookup(type_name)?;
        Ok(codec.encode(value)?)
    }

    /// Decodes one value of type `type_name` from the start of `input`,
    /// ignoring any trailing bytes.
    pub fn decode(&self, type_name: &str, input: &[u8]) -> Result<Value, Error> {
        let codec = self.lookup(type_name)?;
        let (value, _consumed) = codec.decode(input, 0)?;
        Ok(value)
    }

    /// Encodes against a type looked up by module, bypassing the global
    /// table - the only way to reach a name that collided across modules
    /// and was evicted from it (§4.5, §5).
    pub fn encode_in_module(&self, module: &str, type_name: &str, value: &Value) -> Result<Vec<u8>, Error> {
        let codec = self.lookup_in_module(module, type_name)?;
        Ok(codec.encode(value)?)
    }

    pub fn decode_in_module(&self, module: &str, type_name: &str, input: &[u8]) -> Result<Value, Error> {
        let codec = self.lookup_in_module(module, type_name)?;
        let (value, _consumed) = codec.decode(input, 0)?;
        Ok(value)
    }

    /// Every globally reachable type name, i.e. excluding names that
    /// collided across modules and were evicted (§5).
    pub fn list_type_names(&self) -> Vec<&str> {
        self.schema.type_names().collect()
    }

    pub fn list_module_names(&self) -> Vec<&str> {
        self.schema.modules().map(|m| m.name.as_str()).collect()
    }

    /// Every type name declared in `module`, in declaration order, or
    /// `None` if no such module was compiled.
    pub fn list_module_type_names(&self, module: &str) -> Option<Vec<&str>> {
        self.schema.module(module).map(|m| m.type_names().collect())
    }

    fn lookup(&self, type_name: &str) -> Result<&Arc<Codec>, CompileError> {
        self.schema
            .get(type_name)
            .ok_or_else(|| CompileError::new(CompileErrorKind::UnknownType { name: type_name.to_string() }))
    }

    fn lookup_in_module(&self, module: &str, type_name: &str) -> Result<&Arc<Codec>, CompileError> {
        let compiled_module = self
            .schema
            .module(module)
            .ok_or_else(|| CompileError::new(CompileErrorKind::UnknownModule { module: module.to_string() }))?;
        compiled_module
            .get(type_name)
            .ok_or_else(|| CompileError::new(CompileErrorKind::UnknownType { name: type_name.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_round_trips_a_sequence() {
        let spec = Specification::compile(
            "Example DEFINITIONS ::= BEGIN \
             Ping ::= SEQUENCE { id INTEGER, ack BOOLEAN OPTIONAL } \
             END",
        )
        .unwrap();

        let value = Value::sequence([("id", Value::integer(7))]);
        let encoded = spec.encode("Ping", &value).unwrap();
        let decoded = spec.decode("Ping", &encoded).unwrap();
        assert_eq!(decoded.member("id"), Some(&Value::integer(7)));
        assert_eq!(decoded.member("ack"), None);
    }

    #[test]
    fn unknown_type_name_is_a_compile_error() {
        let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER END").unwrap();
        let err = spec.encode("Nope", &Value::integer(1)).unwrap_err();
        assert!(matches!(err, Error::Compile(_)));
    }

    #[test]
    fn module_qualified_escape_hatch_reaches_evicted_names() {
        let spec = Specification::compile(
            "A DEFINITIONS ::= BEGIN Shared ::= INTEGER END \
             B DEFINITIONS ::= BEGIN Shared ::= BOOLEAN END",
        )
        .unwrap();

        assert!(spec.encode("Shared", &Value::integer(1)).is_err());
        let encoded = spec.encode_in_module("A", "Shared", &Value::integer(1)).unwrap();
        assert_eq!(spec.decode_in_module("A", "Shared", &encoded).unwrap(), Value::integer(1));
    }

    #[test]
    fn module_name_override_collapses_modules() {
        let options = CompileOptions { module_name_override: Some("Unified".to_string()) };
        let spec = Specification::compile_with_options(
            "First DEFINITIONS ::= BEGIN A ::= INTEGER END \
             Second DEFINITIONS ::= BEGIN B ::= BOOLEAN END",
            &options,
        )
        .unwrap();
        assert_eq!(spec.list_module_names(), vec!["Unified", "Unified"]);
    }

    #[test]
    fn trailing_bytes_after_the_decoded_value_are_ignored() {
        let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER END").unwrap();
        let mut encoded = spec.encode("T", &Value::integer(5)).unwrap();
        encoded.extend_from_slice(&[0xFF, 0xFF, 0xFF]);
        assert_eq!(spec.decode("T", &encoded).unwrap(), Value::integer(5));
    }
}
