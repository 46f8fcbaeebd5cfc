use serde::ser::Error as _;
use sigmux_wire::WORD_BYTES;

use crate::error::Result;
use crate::value::Value;

/// Canonical encoding of [`Value::Null`], the degrade target for
/// unencodable values.
pub const NULL_ENCODING: &[u8] = b"\"Null\"";

/// Encode a value to bytes. Never fails.
///
/// If the value cannot be serialized (a non-finite float anywhere in
/// it, or any serializer error), a diagnostic is logged and the
/// canonical null encoding is substituted so that packet construction
/// can always proceed.
pub fn encode_value(value: &Value) -> Vec<u8> {
    match try_encode(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(error = %err, "cannot serialize value, substituting null");
            NULL_ENCODING.to_vec()
        }
    }
}

/// Encode a value and zero-pad the result to a whole number of words.
///
/// Pad bytes are written as zero; [`decode_value`] strips trailing zero
/// bytes before parsing, so padding never changes the decoded value.
pub fn encode_value_padded(value: &Value) -> Vec<u8> {
    let mut bytes = encode_value(value);
    bytes.resize(padded_len(bytes.len()), 0);
    bytes
}

/// Round a byte length up to a whole number of 32-bit words.
pub fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD_BYTES) * WORD_BYTES
}

/// Decode a value from a word-padded byte region.
///
/// Trailing zero bytes are treated as padding. Fails with a decode
/// error when the remaining bytes are not a valid encoding.
pub fn decode_value(bytes: &[u8]) -> Result<Value> {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    Ok(serde_json::from_slice(&bytes[..end])?)
}

fn try_encode(value: &Value) -> serde_json::Result<Vec<u8>> {
    // JSON has no representation for NaN or infinity; treat them as
    // unencodable rather than letting them decay to untyped nulls.
    if let Some(f) = first_non_finite(value) {
        return Err(serde_json::Error::custom(format!("non-finite float {f}")));
    }
    serde_json::to_vec(value)
}

fn first_non_finite(value: &Value) -> Option<f64> {
    match value {
        Value::Float(f) if !f.is_finite() => Some(*f),
        Value::List(items) => items.iter().find_map(first_non_finite),
        Value::Record(fields) => fields.values().find_map(first_non_finite),
        _ => None,
    }
}
