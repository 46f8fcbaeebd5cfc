//! Stream multiplexer: slices typed sample streams into MTU-bounded
//! framed packets, interleaving tag and control-message packets.
//!
//! The host scheduler owns invocation: it feeds streams through the
//! push API and calls [`Serializer::step`] repeatedly. Each step emits
//! at most one data packet, preceded by any control messages and due
//! tags, with one sequence counter per stream covering all three packet
//! kinds.

pub mod buffer;
pub mod error;
pub mod serializer;
pub mod stream;

pub use buffer::{Buffer, BufferPool};
pub use error::{MuxError, Result};
pub use serializer::{Packet, Serializer};
pub use stream::{StreamConfig, Tag};
