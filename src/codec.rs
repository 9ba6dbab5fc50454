//! The compiled codec registry: a closed sum type over every ASN.1 type
//! this crate supports, each variant able to encode a [`Value`] to BER
//! octets and decode BER octets back into a [`Value`] (§3, §4.2).
//!
//! Codec objects are immutable once built and are shared as `Arc<Codec>`
//! handles between the per-module and global registries (§5, §9) rather
//! than duplicated.

use std::sync::Arc;

use crate::ber::primitives::{
    decode_length, decode_signed_integer, decode_tag, encode_length, encode_signed_integer,
    encode_tag,
};
use crate::error::{DecodeError, DecodeErrorKind, EncodeError, EncodeErrorKind};
use crate::tag::Tag;
use crate::value::{EnumeratedValue, Integer, Value};

/// A named (number, name) pair for an ENUMERATED type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    pub name: String,
    pub number: i64,
}

/// A compiled SEQUENCE member.
#[derive(Debug, Clone)]
pub struct SequenceMember {
    pub name: String,
    pub codec: Arc<Codec>,
    pub tag: Option<u32>,
    pub optional: bool,
    pub default: Option<Value>,
}

/// A compiled CHOICE alternative.
#[derive(Debug, Clone)]
pub struct ChoiceAlternative {
    pub name: String,
    pub codec: Arc<Codec>,
    pub tag: Option<u32>,
}

/// The compiled form of a [`crate::schema::ParsedType`] (§3).
#[derive(Debug, Clone)]
pub enum Codec {
    Integer,
    Boolean,
    OctetString,
    Null,
    Enumerated(Vec<EnumEntry>),
    Sequence(Vec<SequenceMember>),
    SequenceOf(Arc<Codec>),
    Choice(Vec<ChoiceAlternative>),
}

impl Codec {
    /// The codec's own intrinsic tag, or `None` for CHOICE, which has no
    /// tag of its own (§3).
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Codec::Integer => Some(Tag::INTEGER),
            Codec::Boolean => Some(Tag::BOOLEAN),
            Codec::OctetString => Some(Tag::OCTET_STRING),
            Codec::Null => Some(Tag::NULL),
            Codec::Enumerated(_) => Some(Tag::ENUMERATED),
            Codec::Sequence(_) | Codec::SequenceOf(_) => Some(Tag::SEQUENCE),
            Codec::Choice(_) => None,
        }
    }

    /// Whether this codec's own frame uses the constructed encoding form.
    pub fn is_constructed(&self) -> bool {
        matches!(self, Codec::Sequence(_) | Codec::SequenceOf(_))
    }

    /// Encodes `value` into a freshly allocated BER octet sequence.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let content = self.encode_content(value)?;
        let mut out = Vec::with_capacity(content.len() + 8);
        if let Some(tag) = self.tag() {
            encode_tag(&mut out, tag, self.is_constructed());
            encode_length(&mut out, content.len())?;
        }
        out.extend_from_slice(&content);
        Ok(out)
    }

    /// Encodes the content octets only (without this codec's own tag and
    /// length), used directly by CHOICE, which has no intrinsic frame.
    fn encode_content(&self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        match self {
            Codec::Integer => encode_integer_content(value),
            Codec::Boolean => encode_boolean_content(value),
            Codec::OctetString => encode_octet_string_content(value),
            Codec::Null => encode_null_content(value),
            Codec::Enumerated(entries) => encode_enumerated_content(entries, value),
            Codec::Sequence(members) => encode_sequence_content(members, value),
            Codec::SequenceOf(element) => encode_sequence_of_content(element, value),
            Codec::Choice(alternatives) => encode_choice(alternatives, value),
        }
    }

    /// Decodes one value starting at `offset` in `input`. Returns the
    /// value and the number of bytes consumed from `offset`.
    pub fn decode(&self, input: &[u8], offset: usize) -> Result<(Value, usize), DecodeError> {
        match self {
            Codec::Integer => decode_framed(input, offset, Tag::INTEGER, false, decode_integer_content),
            Codec::Boolean => decode_framed(input, offset, Tag::BOOLEAN, false, decode_boolean_content),
            Codec::OctetString => {
                decode_framed(input, offset, Tag::OCTET_STRING, false, decode_octet_string_content)
            }
            Codec::Null => decode_framed(input, offset, Tag::NULL, false, decode_null_content),
            Codec::Enumerated(entries) => decode_framed(input, offset, Tag::ENUMERATED, false, {
                move |content, content_offset| decode_enumerated_content(entries, content, content_offset)
            }),
            Codec::Sequence(members) => decode_framed(input, offset, Tag::SEQUENCE, true, {
                move |content, content_offset| decode_sequence_content(members, content, content_offset)
            }),
            Codec::SequenceOf(element) => decode_framed(input, offset, Tag::SEQUENCE, true, {
                move |content, content_offset| decode_sequence_of_content(element, content, content_offset)
            }),
            Codec::Choice(alternatives) => decode_choice(alternatives, input, offset),
        }
    }
}

/// Wraps `inner` (a complete encoded TLV) in an outer constructed
/// context-specific `[n]` tag, EXPLICIT-style (§4.2 CHOICE, §9 design
/// note, DESIGN.md open-question (a)).
fn wrap_context(tag_number: u32, inner: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::with_capacity(inner.len() + 6);
    encode_tag(&mut out, Tag::context(tag_number), true);
    encode_length(&mut out, inner.len())?;
    out.extend_from_slice(inner);
    Ok(out)
}

/// Reads the outer tag + length frame for a primitive/constructed codec,
/// verifies the tag matches `expected`, then runs `decode_content` over
/// exactly the `length`-byte content slice.
fn decode_framed(
    input: &[u8],
    offset: usize,
    expected: Tag,
    expect_constructed: bool,
    decode_content: impl FnOnce(&[u8], usize) -> Result<Value, DecodeError>,
) -> Result<(Value, usize), DecodeError> {
    let (tag, constructed, tag_len) = decode_tag(input, offset)?;
    if tag != expected || constructed != expect_constructed {
        return Err(DecodeError::new(
            DecodeErrorKind::MismatchedTag { expected, actual: tag },
            offset,
        ));
    }
    let (length, len_len) = decode_length(input, offset + tag_len)?;
    let content_start = offset + tag_len + len_len;
    let content_end = content_start
        .checked_add(length)
        .filter(|&end| end <= input.len())
        .ok_or_else(|| {
            DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: length }, content_start)
        })?;
    let content = &input[content_start..content_end];
    let value = decode_content(content, content_start)?;
    Ok((value, content_end - offset))
}

fn shape_error(type_name: &str, value: &Value) -> EncodeError {
    EncodeError::new(EncodeErrorKind::InvalidShape {
        type_name: type_name.to_string(),
        reason: format!("unexpected value {value:?}"),
    })
}

fn encode_integer_content(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Integer(integer) => Ok(encode_signed_integer(&integer.to_big())),
        other => Err(shape_error("INTEGER", other)),
    }
}

fn decode_integer_content(content: &[u8], offset: usize) -> Result<Value, DecodeError> {
    let big = decode_signed_integer(content, offset)?;
    Ok(Value::Integer(Integer::from_big(big)))
}

fn encode_boolean_content(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Boolean(b) => Ok(vec![if *b { 0xFF } else { 0x00 }]),
        other => Err(shape_error("BOOLEAN", other)),
    }
}

fn decode_boolean_content(content: &[u8], offset: usize) -> Result<Value, DecodeError> {
    if content.len() != 1 {
        return Err(DecodeError::new(
            DecodeErrorKind::MismatchedLength { expected: 1, actual: content.len() },
            offset,
        ));
    }
    Ok(Value::Boolean(content[0] != 0))
}

fn encode_octet_string_content(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Bytes(bytes) => Ok(bytes.clone()),
        Value::HexString(text) => crate::util::hex_to_bytes(text),
        Value::SequenceOf(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Integer(Integer::Native(n)) if (0..=255).contains(n) => {
                        out.push(*n as u8)
                    }
                    other => return Err(shape_error("OCTET STRING", other)),
                }
            }
            Ok(out)
        }
        other => Err(shape_error("OCTET STRING", other)),
    }
}

fn decode_octet_string_content(content: &[u8], _offset: usize) -> Result<Value, DecodeError> {
    Ok(Value::Bytes(content.to_vec()))
}

fn encode_null_content(value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::Null => Ok(Vec::new()),
        other => Err(shape_error("NULL", other)),
    }
}

fn decode_null_content(content: &[u8], offset: usize) -> Result<Value, DecodeError> {
    if !content.is_empty() {
        return Err(DecodeError::new(
            DecodeErrorKind::MismatchedLength { expected: 0, actual: content.len() },
            offset,
        ));
    }
    Ok(Value::Null)
}

fn encode_enumerated_content(entries: &[EnumEntry], value: &Value) -> Result<Vec<u8>, EncodeError> {
    let number = match value {
        Value::Enumerated(EnumeratedValue::Name(name)) => entries
            .iter()
            .find(|e| &e.name == name)
            .map(|e| e.number)
            .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownEnumerated { value: name.clone() }))?,
        Value::Enumerated(EnumeratedValue::Number(number)) => entries
            .iter()
            .find(|e| e.number == *number)
            .map(|e| e.number)
            .ok_or_else(|| {
                EncodeError::new(EncodeErrorKind::UnknownEnumerated { value: number.to_string() })
            })?,
        other => return Err(shape_error("ENUMERATED", other)),
    };
    Ok(encode_signed_integer(&num_bigint::BigInt::from(number)))
}

fn decode_enumerated_content(
    entries: &[EnumEntry],
    content: &[u8],
    offset: usize,
) -> Result<Value, DecodeError> {
    let big = decode_signed_integer(content, offset)?;
    let entry = entries
        .iter()
        .find(|e| num_bigint::BigInt::from(e.number) == big)
        .ok_or_else(|| DecodeError::new(DecodeErrorKind::UnknownEnumerated { value: big.to_string() }, offset))?;
    Ok(Value::Enumerated(EnumeratedValue::Name(entry.name.clone())))
}

fn encode_sequence_content(members: &[SequenceMember], value: &Value) -> Result<Vec<u8>, EncodeError> {
    let lookup = value.as_member_map().ok_or_else(|| shape_error("SEQUENCE", value))?;

    let mut content = Vec::new();
    for member in members {
        let encoded = if let Some(member_value) = lookup.get(member.name.as_str()) {
            member.codec.encode(member_value)?
        } else if member.optional {
            continue;
        } else if let Some(default) = &member.default {
            member.codec.encode(default)?
        } else {
            return Err(EncodeError::new(EncodeErrorKind::MissingMember { name: member.name.clone() }));
        };

        match member.tag {
            Some(tag_number) => content.extend_from_slice(&wrap_context(tag_number, &encoded)?),
            None => content.extend_from_slice(&encoded),
        }
    }
    Ok(content)
}

fn decode_sequence_content(
    members: &[SequenceMember],
    content: &[u8],
    content_offset: usize,
) -> Result<Value, DecodeError> {
    let mut cur = 0usize;
    let mut out = Vec::with_capacity(members.len());

    for member in members {
        let attempt = decode_sequence_member(member, content, cur, content_offset);
        match attempt {
            Ok((value, consumed)) => {
                out.push((member.name.clone(), value));
                cur += consumed;
            }
            Err(err) => {
                if member.optional {
                    // Not present; no value recorded and no bytes consumed.
                } else if let Some(default) = &member.default {
                    out.push((member.name.clone(), default.clone()));
                } else if cur >= content.len() {
                    return Err(DecodeError::new(
                        DecodeErrorKind::MissingMember { name: member.name.clone() },
                        content_offset + cur,
                    ));
                } else {
                    return Err(err);
                }
            }
        }
    }

    Ok(Value::Sequence(out))
}

fn decode_sequence_member(
    member: &SequenceMember,
    content: &[u8],
    cur: usize,
    content_offset: usize,
) -> Result<(Value, usize), DecodeError> {
    if cur >= content.len() {
        return Err(DecodeError::new(
            DecodeErrorKind::UnexpectedEof { needed: 1 },
            content_offset + cur,
        ));
    }

    match member.tag {
        Some(tag_number) => {
            let expected = Tag::context(tag_number);
            let (tag, constructed, tag_len) = decode_tag(content, cur)?;
            if tag != expected || !constructed {
                return Err(DecodeError::new(
                    DecodeErrorKind::MismatchedTag { expected, actual: tag },
                    content_offset + cur,
                ));
            }
            let (length, len_len) = decode_length(content, cur + tag_len)?;
            let inner_start = cur + tag_len + len_len;
            let inner_end = inner_start
                .checked_add(length)
                .filter(|&end| end <= content.len())
                .ok_or_else(|| {
                    DecodeError::new(
                        DecodeErrorKind::UnexpectedEof { needed: length },
                        content_offset + inner_start,
                    )
                })?;
            let (value, _) = member.codec.decode(&content[..inner_end], inner_start)?;
            Ok((value, inner_end - cur))
        }
        None => {
            let (value, consumed) = member.codec.decode(content, cur)?;
            Ok((value, consumed))
        }
    }
}

fn encode_sequence_of_content(element: &Codec, value: &Value) -> Result<Vec<u8>, EncodeError> {
    match value {
        Value::SequenceOf(items) => {
            let mut content = Vec::new();
            for item in items {
                content.extend_from_slice(&element.encode(item)?);
            }
            Ok(content)
        }
        other => Err(shape_error("SEQUENCE OF", other)),
    }
}

fn decode_sequence_of_content(
    element: &Codec,
    content: &[u8],
    _content_offset: usize,
) -> Result<Value, DecodeError> {
    let mut cur = 0usize;
    let mut items = Vec::new();
    while cur < content.len() {
        let (value, consumed) = element.decode(content, cur)?;
        items.push(value);
        cur += consumed.max(1);
    }
    Ok(Value::SequenceOf(items))
}

fn encode_choice(alternatives: &[ChoiceAlternative], value: &Value) -> Result<Vec<u8>, EncodeError> {
    let (name, inner) = match value {
        Value::Choice(name, inner) => (name, inner.as_ref()),
        other => return Err(shape_error("CHOICE", other)),
    };
    let alternative = alternatives
        .iter()
        .find(|a| &a.name == name)
        .ok_or_else(|| EncodeError::new(EncodeErrorKind::UnknownAlternative { name: name.clone() }))?;

    let encoded = alternative.codec.encode(inner)?;
    match alternative.tag {
        Some(tag_number) => wrap_context(tag_number, &encoded),
        None => Ok(encoded),
    }
}

fn decode_choice(
    alternatives: &[ChoiceAlternative],
    input: &[u8],
    offset: usize,
) -> Result<(Value, usize), DecodeError> {
    let (tag, constructed, tag_len) = decode_tag(input, offset)?;

    for alternative in alternatives {
        match alternative.tag {
            Some(tag_number) => {
                if tag == Tag::context(tag_number) && constructed {
                    let (length, len_len) = decode_length(input, offset + tag_len)?;
                    let inner_start = offset + tag_len + len_len;
                    let inner_end = inner_start
                        .checked_add(length)
                        .filter(|&end| end <= input.len())
                        .ok_or_else(|| {
                            DecodeError::new(DecodeErrorKind::UnexpectedEof { needed: length }, inner_start)
                        })?;
                    let (value, _) = alternative.codec.decode(&input[..inner_end], inner_start)?;
                    return Ok((
                        Value::Choice(alternative.name.clone(), Box::new(value)),
                        inner_end - offset,
                    ));
                }
            }
            None => {
                if Some(tag) == alternative.codec.tag() && constructed == alternative.codec.is_constructed()
                {
                    let (value, consumed) = alternative.codec.decode(input, offset)?;
                    return Ok((Value::Choice(alternative.name.clone(), Box::new(value)), consumed));
                }
            }
        }
    }

    Err(DecodeError::new(DecodeErrorKind::NoMatchingChoice { tag }, offset))
}
