//! End-to-end scenarios: schema text in, BER octets out and back, without
//! reaching into any internal module.

use bercodec::{EnumeratedValue, Specification, Value};
use pretty_assertions::assert_eq;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn integer_exact_bytes() {
    init();
    let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER END").unwrap();
    assert_eq!(spec.encode("T", &Value::integer(42)).unwrap(), vec![0x02, 0x01, 0x2A]);
    assert_eq!(spec.encode("T", &Value::integer(-42)).unwrap(), vec![0x02, 0x01, 0xD6]);
    assert_eq!(spec.decode("T", &[0x02, 0x01, 0x2A]).unwrap(), Value::integer(42));
}

#[test]
fn boolean_exact_bytes() {
    let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= BOOLEAN END").unwrap();
    assert_eq!(spec.encode("T", &Value::Boolean(true)).unwrap(), vec![0x01, 0x01, 0xFF]);
    assert_eq!(spec.encode("T", &Value::Boolean(false)).unwrap(), vec![0x01, 0x01, 0x00]);
}

#[test]
fn octet_string_hex_round_trip() {
    let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= OCTET STRING END").unwrap();
    let encoded = spec.encode("T", &Value::HexString("cafe01".into())).unwrap();
    assert_eq!(encoded, vec![0x04, 0x03, 0xCA, 0xFE, 0x01]);
    let decoded = spec.decode("T", &encoded).unwrap();
    assert_eq!(decoded, Value::Bytes(vec![0xCA, 0xFE, 0x01]));
}

#[test]
fn ping_request_sequence_round_trips_with_optional_member_omitted() {
    let spec = Specification::compile(
        "Protocol DEFINITIONS ::= BEGIN \
         PingRequest ::= SEQUENCE { \
             sequenceNumber INTEGER, \
             payload OCTET STRING OPTIONAL \
         } \
         END",
    )
    .unwrap();

    let request = Value::sequence([("sequenceNumber", Value::integer(12))]);
    let encoded = spec.encode("PingRequest", &request).unwrap();
    let decoded = spec.decode("PingRequest", &encoded).unwrap();

    assert_eq!(decoded.member("sequenceNumber"), Some(&Value::integer(12)));
    assert_eq!(decoded.member("payload"), None);
}

#[test]
fn request_message_choice_with_explicit_tag() {
    let spec = Specification::compile(
        "Protocol DEFINITIONS ::= BEGIN \
         RequestMessage ::= CHOICE { \
             cancel [4] NULL, \
             retryCount INTEGER \
         } \
         END",
    )
    .unwrap();

    let value = Value::choice("cancel", Value::Null);
    let encoded = spec.encode("RequestMessage", &value).unwrap();
    assert_eq!(encoded[0], 0xA4); // context, constructed, tag 4

    let decoded = spec.decode("RequestMessage", &encoded).unwrap();
    assert_eq!(decoded, value);

    let untagged = Value::choice("retryCount", Value::integer(3));
    let encoded = spec.encode("RequestMessage", &untagged).unwrap();
    assert_eq!(spec.decode("RequestMessage", &encoded).unwrap(), untagged);
}

#[test]
fn data_request_multi_field_round_trip() {
    init();
    let spec = Specification::compile(
        "Protocol DEFINITIONS ::= BEGIN \
         Status ::= ENUMERATED { pending, active, closed } \
         DataRequest ::= SEQUENCE { \
             id INTEGER, \
             status Status, \
             tags SEQUENCE OF OCTET STRING, \
             note OCTET STRING DEFAULT \"00\" \
         } \
         END",
    )
    .unwrap();

    let request = Value::sequence([
        ("id", Value::integer(99)),
        ("status", Value::Enumerated(EnumeratedValue::Name("active".into()))),
        (
            "tags",
            Value::SequenceOf(vec![Value::HexString("ab".into()), Value::HexString("cd".into())]),
        ),
    ]);

    let encoded = spec.encode("DataRequest", &request).unwrap();
    let decoded = spec.decode("DataRequest", &encoded).unwrap();

    assert_eq!(decoded.member("id"), Some(&Value::integer(99)));
    assert_eq!(
        decoded.member("status"),
        Some(&Value::Enumerated(EnumeratedValue::Name("active".into())))
    );
    assert_eq!(
        decoded.member("tags"),
        Some(&Value::SequenceOf(vec![Value::Bytes(vec![0xAB]), Value::Bytes(vec![0xCD])]))
    );
    assert_eq!(decoded.member("note"), Some(&Value::Bytes(vec![0x00])));
}

#[test]
fn whitespace_around_constraints_does_not_change_the_compiled_type() {
    let tight = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER(-1..1) END").unwrap();
    let loose = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER ( -1 .. 1 ) END").unwrap();

    for value in [-1, 0, 1] {
        let a = tight.encode("T", &Value::integer(value)).unwrap();
        let b = loose.encode("T", &Value::integer(value)).unwrap();
        assert_eq!(a, b);
    }
}

#[test]
fn unknown_module_qualified_lookup_is_an_error() {
    let spec = Specification::compile("M DEFINITIONS ::= BEGIN T ::= INTEGER END").unwrap();
    assert!(spec.encode_in_module("Nope", "T", &Value::integer(1)).is_err());
    assert!(spec.decode_in_module("M", "Nope", &[0x02, 0x01, 0x01]).is_err());
}
