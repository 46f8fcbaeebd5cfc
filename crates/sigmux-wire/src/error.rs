/// Errors for malformed packets on the decode path.
///
/// Encoding never returns an error: framing preconditions are caller
/// contracts and violations panic instead.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// Word 0 is not the start marker.
    #[error("bad start marker 0x{0:08X} (expected 0x56524C50 \"VRLP\")")]
    BadStartMarker(u32),

    /// The last word is not the end marker.
    #[error("bad end marker 0x{0:08X} (expected 0x56454E44 \"VEND\")")]
    BadEndMarker(u32),

    /// Fewer bytes than the smallest possible packet.
    #[error("packet truncated ({0} bytes, minimum 20)")]
    Truncated(usize),

    /// The byte length is not a whole number of 32-bit words.
    #[error("packet length {0} is not word aligned")]
    UnalignedLength(usize),

    /// The outer word count disagrees with the actual byte length.
    #[error("declared length {declared} bytes does not match actual {actual}")]
    DeclaredLengthMismatch { declared: usize, actual: usize },

    /// The inner word count disagrees with the outer one.
    #[error("inner word count {declared} does not match expected {expected}")]
    InnerLengthMismatch { declared: usize, expected: usize },

    /// The declared header does not fit inside the packet.
    #[error("header of {header_words} words exceeds packet of {total_words} words")]
    HeaderOverrun {
        header_words: usize,
        total_words: usize,
    },
}

pub type Result<T> = std::result::Result<T, WireError>;
