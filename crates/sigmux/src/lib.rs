//! Streaming-to-packet framing for signal pipelines.
//!
//! sigmux converts typed sample streams, positional tags, and
//! asynchronous control values into one sequence of self-delimiting
//! binary packets.
//!
//! # Crate Structure
//!
//! - [`wire`] — Packet codec: big-endian header/trailer framing
//! - [`value`] — Opaque value model with a degrade-to-null byte codec
//! - [`mux`] — Buffer pool and the host-driven stream serializer

/// Re-export wire codec types.
pub mod wire {
    pub use sigmux_wire::*;
}

/// Re-export value codec types.
pub mod value {
    pub use sigmux_value::*;
}

/// Re-export multiplexer types.
pub mod mux {
    pub use sigmux_mux::*;
}
