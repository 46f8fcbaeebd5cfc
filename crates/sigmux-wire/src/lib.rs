//! Self-delimiting packet framing for sample streams.
//!
//! Every packet is framed with big-endian 32-bit header and trailer
//! words:
//! - A fixed start marker ("VRLP") and end marker ("VEND")
//! - Outer and inner word counts that make the packet self-delimiting
//! - A stream id, control flag, and optional 64-bit timestamp
//!
//! Payload bytes are carried verbatim between header and trailer; no
//! byte-order conversion is applied to payload contents.

pub mod codec;
pub mod error;

pub use codec::{
    pack_packet, unpack_packet, DecodedPacket, PacketHeader, PacketKind, DEFAULT_MTU, END_MARKER,
    FRAMING_RESERVE, HEADER_WORDS, HEADER_WORDS_TIMESTAMP, START_MARKER, TRAILER_WORDS, WORD_BYTES,
};
pub use error::{Result, WireError};
