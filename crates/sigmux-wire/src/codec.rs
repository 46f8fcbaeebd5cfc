use crate::error::{Result, WireError};

/// Bytes per 32-bit wire word.
pub const WORD_BYTES: usize = 4;

/// Start-of-packet marker: ASCII "VRLP".
pub const START_MARKER: u32 = 0x5652_4C50;

/// End-of-packet marker: ASCII "VEND".
pub const END_MARKER: u32 = 0x5645_4E44;

/// Header size in words without a timestamp.
pub const HEADER_WORDS: usize = 4;

/// Header size in words with a timestamp.
pub const HEADER_WORDS_TIMESTAMP: usize = 6;

/// Trailer size in words (end marker only).
pub const TRAILER_WORDS: usize = 1;

/// Worst-case framing overhead per packet: max header plus trailer.
///
/// Buffer capacity minus this reserve is the usable payload budget.
pub const FRAMING_RESERVE: usize = (HEADER_WORDS_TIMESTAMP + TRAILER_WORDS) * WORD_BYTES;

/// Default payload capacity hint in bytes.
pub const DEFAULT_MTU: usize = 1400;

// Flag bits in header word 2.
const FLAG_SID: u32 = 1 << 28;
const FLAG_EXT: u32 = 1 << 29;
const FLAG_TSF: u32 = 1 << 20;

/// Framing metadata for one outbound packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Per-stream sequence number. The wire formula masks this to zero
    /// (see [`pack_packet`]), so it is not recoverable on decode.
    pub seq: u32,
    /// Logical stream the packet belongs to.
    pub stream_id: u32,
    /// Optional 64-bit timestamp; tag packets carry the tag offset here.
    pub timestamp: Option<u64>,
    /// Marks control/extended packets (messages and tags).
    pub is_control: bool,
}

impl PacketHeader {
    /// Header size in words: 6 with a timestamp, 4 without.
    pub fn header_words(&self) -> usize {
        if self.timestamp.is_some() {
            HEADER_WORDS_TIMESTAMP
        } else {
            HEADER_WORDS
        }
    }

    /// Header size in bytes.
    pub fn header_bytes(&self) -> usize {
        self.header_words() * WORD_BYTES
    }
}

/// Pack the header and trailer words around a payload already staged in
/// `storage`, producing one complete packet in place. Returns the total
/// packet length in bytes.
///
/// Wire format (all header/trailer words big-endian):
/// ```text
/// ┌────────┬─────────────────────────────────────────────────┐
/// │ word 0 │ start marker "VRLP"                             │
/// │ word 1 │ ((seq << 20) & 0xFFF) | (total_words & 0xFFFFF) │
/// │ word 2 │ SID | EXT? | TSF? | ((seq << 16) & 0xF)         │
/// │        │     | (inner_words & 0xFFFF)                    │
/// │ word 3 │ stream id                                       │
/// │ 4, 5   │ timestamp high, low (only when present)         │
/// │  ...   │ payload, raw bytes, word-padded                 │
/// │ last   │ end marker "VEND"                               │
/// └────────┴─────────────────────────────────────────────────┘
/// ```
/// `inner_words = total_words - 3`. The two sequence contributions are
/// masked to zero for every ordinary sequence range; the formula is
/// preserved verbatim for wire compatibility.
///
/// The payload occupies `storage[payload_offset..payload_offset +
/// payload_len]` and is left untouched: no byte-order conversion is
/// applied to payload contents.
///
/// # Panics
///
/// Panics if the payload window does not start exactly at the header
/// boundary, if its length is not a whole number of words, or if the
/// finished packet would not fit in `storage`. These are caller bugs,
/// not runtime errors.
pub fn pack_packet(
    header: &PacketHeader,
    storage: &mut [u8],
    payload_offset: usize,
    payload_len: usize,
) -> usize {
    let hdr_words = header.header_words();
    assert_eq!(
        payload_offset,
        hdr_words * WORD_BYTES,
        "payload window must start at the header boundary"
    );
    assert_eq!(
        payload_len % WORD_BYTES,
        0,
        "payload length must be a whole number of words"
    );

    let total_words = hdr_words + payload_len / WORD_BYTES + TRAILER_WORDS;
    let total_bytes = total_words * WORD_BYTES;
    assert!(total_bytes <= storage.len(), "packet exceeds buffer capacity");

    let inner_words = total_words - 3;
    let mut flags = FLAG_SID;
    if header.is_control {
        flags |= FLAG_EXT;
    }
    if header.timestamp.is_some() {
        flags |= FLAG_TSF;
    }

    put_word(storage, 0, START_MARKER);
    put_word(
        storage,
        1,
        ((header.seq << 20) & 0xFFF) | (total_words as u32 & 0xF_FFFF),
    );
    put_word(
        storage,
        2,
        flags | ((header.seq << 16) & 0xF) | (inner_words as u32 & 0xFFFF),
    );
    put_word(storage, 3, header.stream_id);
    if let Some(ts) = header.timestamp {
        put_word(storage, 4, (ts >> 32) as u32);
        put_word(storage, 5, ts as u32);
    }
    put_word(storage, total_words - 1, END_MARKER);

    total_bytes
}

/// Kind of packet, derived from the flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// Raw sample data.
    Data,
    /// Asynchronous control message (control flag, no timestamp).
    Message,
    /// Positional tag (control flag, timestamp carries the item offset).
    Tag,
}

/// A validated packet with its metadata and payload window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedPacket<'a> {
    /// Logical stream the packet belongs to.
    pub stream_id: u32,
    /// Timestamp, present only when the TSF flag was set.
    pub timestamp: Option<u64>,
    /// Control/extended flag.
    pub is_control: bool,
    /// Payload bytes, exactly as packed (word-padded, native order).
    pub payload: &'a [u8],
}

impl DecodedPacket<'_> {
    /// Classify the packet from its flags.
    pub fn kind(&self) -> PacketKind {
        match (self.is_control, self.timestamp) {
            (false, _) => PacketKind::Data,
            (true, None) => PacketKind::Message,
            (true, Some(_)) => PacketKind::Tag,
        }
    }
}

/// Validate and unpack one complete packet.
///
/// Both markers and both declared length fields are checked against the
/// actual byte length before any payload bytes are exposed.
pub fn unpack_packet(bytes: &[u8]) -> Result<DecodedPacket<'_>> {
    let min_bytes = (HEADER_WORDS + TRAILER_WORDS) * WORD_BYTES;
    if bytes.len() < min_bytes {
        return Err(WireError::Truncated(bytes.len()));
    }
    if bytes.len() % WORD_BYTES != 0 {
        return Err(WireError::UnalignedLength(bytes.len()));
    }

    let start = read_word(bytes, 0);
    if start != START_MARKER {
        return Err(WireError::BadStartMarker(start));
    }

    let total_words = (read_word(bytes, 1) & 0xF_FFFF) as usize;
    if total_words * WORD_BYTES != bytes.len() {
        return Err(WireError::DeclaredLengthMismatch {
            declared: total_words * WORD_BYTES,
            actual: bytes.len(),
        });
    }

    let end = read_word(bytes, total_words - 1);
    if end != END_MARKER {
        return Err(WireError::BadEndMarker(end));
    }

    let flags = read_word(bytes, 2);
    let inner_words = (flags & 0xFFFF) as usize;
    if inner_words != total_words - 3 {
        return Err(WireError::InnerLengthMismatch {
            declared: inner_words,
            expected: total_words - 3,
        });
    }

    let has_timestamp = flags & FLAG_TSF != 0;
    let hdr_words = if has_timestamp {
        HEADER_WORDS_TIMESTAMP
    } else {
        HEADER_WORDS
    };
    if total_words < hdr_words + TRAILER_WORDS {
        return Err(WireError::HeaderOverrun {
            header_words: hdr_words,
            total_words,
        });
    }

    let timestamp = has_timestamp
        .then(|| (u64::from(read_word(bytes, 4)) << 32) | u64::from(read_word(bytes, 5)));

    Ok(DecodedPacket {
        stream_id: read_word(bytes, 3),
        timestamp,
        is_control: flags & FLAG_EXT != 0,
        payload: &bytes[hdr_words * WORD_BYTES..(total_words - TRAILER_WORDS) * WORD_BYTES],
    })
}

fn put_word(storage: &mut [u8], index: usize, word: u32) {
    let at = index * WORD_BYTES;
    storage[at..at + WORD_BYTES].copy_from_slice(&word.to_be_bytes());
}

fn read_word(bytes: &[u8], index: usize) -> u32 {
    let at = index * WORD_BYTES;
    u32::from_be_bytes(bytes[at..at + WORD_BYTES].try_into().unwrap())
}
