//! Two-pass compiler from a [`crate::schema::ParsedSchema`] to a registry
//! of [`Codec`]s (§4.4).
//!
//! Pass 1 walks each module's type names looking for duplicate
//! definitions. Pass 2 compiles each type's body in declaration order,
//! resolving `DEFINED` references against types already compiled earlier
//! in the same module, then against the cross-module global table built
//! up by previously compiled modules. Forward references within a module
//! are not supported; see DESIGN.md.
//!
//! Global names that collide across modules are evicted from the global
//! table entirely rather than arbitrarily picking a winner (§5); such
//! types remain reachable only through their own module via
//! [`crate::specification::Specification::encode_in_module`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::codec::{ChoiceAlternative, Codec, EnumEntry, SequenceMember};
use crate::error::{CompileError, CompileErrorKind};
use crate::schema::{
    ParsedAlternative, ParsedEnumValue, ParsedMember, ParsedSchema, ParsedType, ParsedValue,
};
use crate::tag::Tag;
use crate::value::{EnumeratedValue, Value};

/// One compiled module: its types in declaration order, each paired with
/// its compiled codec handle.
#[derive(Debug, Default)]
pub struct CompiledModule {
    pub name: String,
    types: Vec<(String, Arc<Codec>)>,
}

impl CompiledModule {
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Codec>> {
        self.types.iter().find(|(n, _)| n == name).map(|(_, codec)| codec)
    }
}

/// The full compiled registry: every module plus the global, collision-
/// pruned name table (§5).
#[derive(Debug, Default)]
pub struct CompiledSchema {
    modules: Vec<CompiledModule>,
    global: BTreeMap<String, Arc<Codec>>,
}

impl CompiledSchema {
    pub fn module(&self, name: &str) -> Option<&CompiledModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &CompiledModule> {
        self.modules.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Codec>> {
        self.global.get(name)
    }

    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.global.keys().map(|s| s.as_str())
    }
}

/// Compiles every module of `schema` into a [`CompiledSchema`].
pub fn compile(schema: &ParsedSchema) -> Result<CompiledSchema, CompileError> {
    let mut global: BTreeMap<String, Arc<Codec>> = BTreeMap::new();
    let mut collided: BTreeSet<String> = BTreeSet::new();
    let mut modules = Vec::with_capacity(schema.modules.len());

    for module in &schema.modules {
        log::debug!("compiling module `{}` ({} types)", module.name, module.types.len());

        let mut seen = BTreeSet::new();
        for (name, _) in &module.types {
            if !seen.insert(name.as_str()) {
                return Err(CompileError::new(CompileErrorKind::DuplicateDefinition {
                    module: module.name.clone(),
                    name: name.clone(),
                }));
            }
        }

        let mut compiled: BTreeMap<String, Arc<Codec>> = BTreeMap::new();
        let mut ordered: Vec<(String, Arc<Codec>)> = Vec::with_capacity(module.types.len());
        let mut in_progress: BTreeSet<String> = BTreeSet::new();

        for (name, ty) in &module.types {
            let codec = compile_named(name, ty, &compiled, &global, &mut in_progress)?;
            compiled.insert(name.clone(), Arc::clone(&codec));
            ordered.push((name.clone(), codec));
        }

        for (name, codec) in &ordered {
            if collided.contains(name) {
                continue;
            }
            if global.contains_key(name) {
                log::debug!("type name `{name}` collides across modules; evicting from global table");
                global.remove(name);
                collided.insert(name.clone());
            } else {
                global.insert(name.clone(), Arc::clone(codec));
            }
        }

        modules.push(CompiledModule { name: module.name.clone(), types: ordered });
    }

    Ok(CompiledSchema { modules, global })
}

fn compile_named(
    name: &str,
    ty: &ParsedType,
    compiled: &BTreeMap<String, Arc<Codec>>,
    global: &BTreeMap<String, Arc<Codec>>,
    in_progress: &mut BTreeSet<String>,
) -> Result<Arc<Codec>, CompileError> {
    if !in_progress.insert(name.to_string()) {
        return Err(CompileError::new(CompileErrorKind::Cycle { name: name.to_string() }));
    }
    log::trace!("compiling type `{name}`");
    let codec = compile_type(ty, compiled, global, in_progress)?;
    in_progress.remove(name);
    Ok(codec)
}

fn compile_type(
    ty: &ParsedType,
    compiled: &BTreeMap<String, Arc<Codec>>,
    global: &BTreeMap<String, Arc<Codec>>,
    in_progress: &mut BTreeSet<String>,
) -> Result<Arc<Codec>, CompileError> {
    match ty {
        ParsedType::Integer(_) => Ok(Arc::new(Codec::Integer)),
        ParsedType::Boolean(_) => Ok(Arc::new(Codec::Boolean)),
        ParsedType::OctetString(_) => Ok(Arc::new(Codec::OctetString)),
        ParsedType::Null => Ok(Arc::new(Codec::Null)),
        ParsedType::Enumerated(values) => Ok(Arc::new(compile_enumerated(values)?)),
        ParsedType::Sequence(members) => {
            Ok(Arc::new(compile_sequence(members, compiled, global, in_progress)?))
        }
        ParsedType::SequenceOf(element) => {
            let element_codec = compile_type(element, compiled, global, in_progress)?;
            Ok(Arc::new(Codec::SequenceOf(element_codec)))
        }
        ParsedType::Choice(alternatives) => {
            Ok(Arc::new(compile_choice(alternatives, compiled, global, in_progress)?))
        }
        ParsedType::Defined(name) => resolve_defined(name, compiled, global, in_progress),
    }
}

/// Resolves a `DEFINED` reference, in order, against: the current cycle
/// guard (a self- or mutually-recursive reference), types already
/// compiled earlier in the same module, then the global table of types
/// compiled from prior modules.
fn resolve_defined(
    name: &str,
    compiled: &BTreeMap<String, Arc<Codec>>,
    global: &BTreeMap<String, Arc<Codec>>,
    in_progress: &BTreeSet<String>,
) -> Result<Arc<Codec>, CompileError> {
    if in_progress.contains(name) {
        return Err(CompileError::new(CompileErrorKind::Cycle { name: name.to_string() }));
    }
    if let Some(codec) = compiled.get(name) {
        return Ok(Arc::clone(codec));
    }
    if let Some(codec) = global.get(name) {
        return Ok(Arc::clone(codec));
    }
    Err(CompileError::new(CompileErrorKind::UnresolvedReference { name: name.to_string() }))
}

fn compile_enumerated(values: &[ParsedEnumValue]) -> Result<Codec, CompileError> {
    if values.is_empty() {
        return Err(CompileError::new(CompileErrorKind::EmptyEnumerated));
    }
    let mut entries = Vec::with_capacity(values.len());
    let mut next = 0i64;
    for value in values {
        let number = value.number.unwrap_or(next);
        entries.push(EnumEntry { name: value.name.clone(), number });
        next = number + 1;
    }
    Ok(Codec::Enumerated(entries))
}

fn compile_sequence(
    members: &[ParsedMember],
    compiled: &BTreeMap<String, Arc<Codec>>,
    global: &BTreeMap<String, Arc<Codec>>,
    in_progress: &mut BTreeSet<String>,
) -> Result<Codec, CompileError> {
    let mut out = Vec::with_capacity(members.len());
    for member in members {
        let codec = compile_type(&member.ty, compiled, global, in_progress)?;
        let default = member
            .default
            .as_ref()
            .map(|value| parsed_value_to_value(&member.name, value, &codec))
            .transpose()?;
        out.push(SequenceMember {
            name: member.name.clone(),
            codec,
            tag: member.tag,
            optional: member.optional,
            default,
        });
    }
    Ok(Codec::Sequence(out))
}

fn compile_choice(
    alternatives: &[ParsedAlternative],
    compiled: &BTreeMap<String, Arc<Codec>>,
    global: &BTreeMap<String, Arc<Codec>>,
    in_progress: &mut BTreeSet<String>,
) -> Result<Codec, CompileError> {
    if alternatives.is_empty() {
        return Err(CompileError::new(CompileErrorKind::EmptyChoice));
    }
    let mut out = Vec::with_capacity(alternatives.len());
    let mut seen_context_tags = BTreeSet::new();
    let mut seen_intrinsic_tags: Vec<Tag> = Vec::new();
    for alternative in alternatives {
        let codec = compile_type(&alternative.ty, compiled, global, in_progress)?;
        match alternative.tag {
            Some(tag) => {
                if !seen_context_tags.insert(tag) {
                    return Err(CompileError::new(CompileErrorKind::DuplicateAlternativeTag {
                        name: alternative.name.clone(),
                        tag,
                    }));
                }
            }
            // Untagged alternatives dispatch on decode by their codec's
            // own intrinsic tag; those must be unique too.
            None => {
                if let Some(intrinsic) = codec.tag() {
                    if seen_intrinsic_tags.contains(&intrinsic) {
                        return Err(CompileError::new(CompileErrorKind::DuplicateAlternativeTag {
                            name: alternative.name.clone(),
                            tag: intrinsic.value,
                        }));
                    }
                    seen_intrinsic_tags.push(intrinsic);
                }
            }
        }
        out.push(ChoiceAlternative { name: alternative.name.clone(), codec, tag: alternative.tag });
    }
    Ok(Codec::Choice(out))
}

/// Converts a schema-level `DEFAULT` value into the `Value` shape its
/// member's compiled codec expects.
fn parsed_value_to_value(member: &str, value: &ParsedValue, codec: &Codec) -> Result<Value, CompileError> {
    let invalid = || CompileError::new(CompileErrorKind::InvalidDefaultValue { member: member.to_string() });
    match (value, codec) {
        (ParsedValue::Number(n), Codec::Integer) => Ok(Value::integer(*n)),
        (ParsedValue::Boolean(b), Codec::Boolean) => Ok(Value::Boolean(*b)),
        (ParsedValue::Null, Codec::Null) => Ok(Value::Null),
        (ParsedValue::Identifier(name), Codec::Enumerated(entries)) => {
            if entries.iter().any(|e| &e.name == name) {
                Ok(Value::Enumerated(EnumeratedValue::Name(name.clone())))
            } else {
                Err(invalid())
            }
        }
        (ParsedValue::Number(n), Codec::Enumerated(entries)) => entries
            .iter()
            .find(|e| e.number == *n)
            .map(|e| Value::Enumerated(EnumeratedValue::Name(e.name.clone())))
            .ok_or_else(invalid),
        (ParsedValue::String(text), Codec::OctetString) => {
            crate::util::hex_to_bytes(text).map(Value::Bytes).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}
