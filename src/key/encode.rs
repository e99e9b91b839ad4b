//! Canonical binary encoding of argument values.
//!
//! Layout rules:
//! - One tag byte per value, then a fixed or length-prefixed payload.
//! - All multi-byte integers little-endian.
//! - Strings and byte strings shorter than 256 bytes take the 1-byte
//!   length form; longer ones the 4-byte form. The split keeps typical
//!   keys compact while staying unambiguous (the tag differs, so the two
//!   forms never alias).
//! - Sequences and maps carry a u32 element count; map entries are emitted
//!   in sorted key order.
//! - A fingerprint is `count(positionals) ++ each positional ++
//!   count(nameds) ++ each (name, value)` with nameds sorted by name.
//!
//! The encoding is injective over distinguishable [`ArgValue`] trees: tags
//! separate the variants, and every variable-length payload is length
//! prefixed, so no two trees share a byte string. Decoding is never needed;
//! the stores compare raw bytes.

use super::args::{ArgValue, Args};

// Value tags. Stable: the shared backend persists encoded keys, so a tag
// renumbering would orphan every existing region.
pub const TAG_NONE: u8 = 0x00;
pub const TAG_FALSE: u8 = 0x01;
pub const TAG_TRUE: u8 = 0x02;
pub const TAG_INT: u8 = 0x03;
pub const TAG_FLOAT: u8 = 0x04;
pub const TAG_STR8: u8 = 0x05;
pub const TAG_STR32: u8 = 0x06;
pub const TAG_BYTES8: u8 = 0x07;
pub const TAG_BYTES32: u8 = 0x08;
pub const TAG_SEQ: u8 = 0x09;
pub const TAG_MAP: u8 = 0x0A;

/// Encode a whole argument bundle into fingerprint bytes.
pub fn encode_args(args: &Args) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    write_count(&mut out, args.positional().len());
    for value in args.positional() {
        encode_value_into(&mut out, value);
    }
    write_count(&mut out, args.named_args().len());
    for (name, value) in args.named_args() {
        write_str(&mut out, name);
        encode_value_into(&mut out, value);
    }
    out
}

/// Encode one value. Scalars emit their fixed-layout record directly; the
/// container arms recurse.
pub fn encode_value_into(out: &mut Vec<u8>, value: &ArgValue) {
    match value {
        ArgValue::None => out.push(TAG_NONE),
        ArgValue::Bool(false) => out.push(TAG_FALSE),
        ArgValue::Bool(true) => out.push(TAG_TRUE),
        ArgValue::Int(v) => {
            out.push(TAG_INT);
            out.extend_from_slice(&v.to_le_bytes());
        }
        ArgValue::Float(v) => {
            out.push(TAG_FLOAT);
            out.extend_from_slice(&canonical_f64_bits(*v).to_le_bytes());
        }
        ArgValue::Str(s) => write_str(out, s),
        ArgValue::Bytes(b) => {
            if b.len() < 256 {
                out.push(TAG_BYTES8);
                out.push(b.len() as u8);
            } else {
                out.push(TAG_BYTES32);
                out.extend_from_slice(&(b.len() as u32).to_le_bytes());
            }
            out.extend_from_slice(b);
        }
        ArgValue::Seq(items) => {
            out.push(TAG_SEQ);
            write_count(out, items.len());
            for item in items {
                encode_value_into(out, item);
            }
        }
        ArgValue::Map(map) => {
            out.push(TAG_MAP);
            write_count(out, map.len());
            // BTreeMap iterates in sorted key order; nothing more to do for
            // canonical placement.
            for (k, v) in map {
                write_str(out, k);
                encode_value_into(out, v);
            }
        }
    }
}

/// Canonical bit pattern for a float key component.
///
/// Equal values must encode to equal bytes: `-0.0 == 0.0` under host
/// equality, so both encode as `+0.0`; every NaN payload collapses to the
/// one canonical quiet NaN.
#[inline]
pub fn canonical_f64_bits(v: f64) -> u64 {
    if v.is_nan() {
        f64::NAN.to_bits()
    } else if v == 0.0 {
        0.0f64.to_bits()
    } else {
        v.to_bits()
    }
}

fn write_str(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    if bytes.len() < 256 {
        out.push(TAG_STR8);
        out.push(bytes.len() as u8);
    } else {
        out.push(TAG_STR32);
        out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
    }
    out.extend_from_slice(bytes);
}

#[inline]
fn write_count(out: &mut Vec<u8>, n: usize) {
    out.extend_from_slice(&(n as u32).to_le_bytes());
}
