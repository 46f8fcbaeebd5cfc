/// Errors from the multiplexer's feeding API.
///
/// `step` itself is infallible: value serialization degrades to null
/// and framing preconditions are internal invariants.
#[derive(Debug, thiserror::Error)]
pub enum MuxError {
    /// The stream index is outside the configured topology.
    #[error("stream {0} does not exist")]
    UnknownStream(usize),

    /// Sample bytes did not form a whole number of items.
    #[error("sample bytes ({len}) are not a whole number of {item_size}-byte items")]
    PartialItem { len: usize, item_size: usize },
}

pub type Result<T> = std::result::Result<T, MuxError>;
