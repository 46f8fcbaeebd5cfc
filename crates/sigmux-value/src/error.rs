/// Errors that can occur when decoding value payloads.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// The payload bytes do not form a valid encoded value.
    #[error("value decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ValueError>;
