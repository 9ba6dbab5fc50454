//! Basic Encoding Rules (X.690) primitives: tag/length framing and
//! signed-integer two's-complement encoding. Per-type codecs built on top
//! of these live in [`crate::codec`].

pub mod primitives;
