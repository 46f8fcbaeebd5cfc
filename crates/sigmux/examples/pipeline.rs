//! Minimal host-driver loop: feed a two-stream serializer, then unpack
//! every packet it emits and print a short trace.
//!
//! Run with: cargo run --example pipeline

use std::collections::BTreeMap;

use sigmux::mux::{Serializer, StreamConfig, Tag};
use sigmux::value::{decode_value, Value};
use sigmux::wire::{unpack_packet, PacketKind};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Two streams of 4-byte items, default payload capacity.
    let configs = [StreamConfig::new(4), StreamConfig::new(4)];
    let mut mux = Serializer::new(&configs, None);

    let samples: Vec<u8> = (0..64u32).flat_map(|n| n.to_be_bytes()).collect();
    mux.push_samples(0, &samples)?;
    mux.push_samples(1, &samples[..32])?;

    mux.push_tag(0, Tag::new(0, Value::Str("burst_start".to_string())))?;

    let mut meta = BTreeMap::new();
    meta.insert("center_freq".to_string(), Value::Float(98.5e6));
    mux.push_message(1, Value::Record(meta))?;

    let mut emitted = Vec::new();
    while mux.has_pending() {
        emitted.extend(mux.step());
    }

    for (index, packet) in emitted.iter().enumerate() {
        let decoded = unpack_packet(packet.as_bytes())?;
        match decoded.kind() {
            PacketKind::Data => {
                println!(
                    "[{index}] stream {} data, {} payload bytes",
                    decoded.stream_id,
                    decoded.payload.len()
                );
            }
            PacketKind::Tag => {
                let value = decode_value(decoded.payload)?;
                println!(
                    "[{index}] stream {} tag at item {}: {value:?}",
                    decoded.stream_id,
                    decoded.timestamp.unwrap_or(0)
                );
            }
            PacketKind::Message => {
                let value = decode_value(decoded.payload)?;
                println!("[{index}] stream {} message: {value:?}", decoded.stream_id);
            }
        }
    }

    Ok(())
}
