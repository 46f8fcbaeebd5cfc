//! Opaque value model and byte codec for tag and message payloads.
//!
//! Values are a closed tagged-variant type serialized with the
//! workspace serde stack. Encoding never fails: an unencodable value
//! degrades to the canonical null encoding with a logged diagnostic, so
//! packet construction always succeeds. Decoding is the inverse and
//! returns a typed error for invalid payloads.

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{decode_value, encode_value, encode_value_padded, padded_len, NULL_ENCODING};
pub use error::{Result, ValueError};
pub use value::Value;
