use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use sigmux_value::Value;
use sigmux_wire::{DecodedPacket, PacketKind};

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    index: usize,
    stream: u32,
    kind: &'a str,
    bytes: usize,
    payload_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
}

pub fn print_packet(
    index: usize,
    total_bytes: usize,
    packet: &DecodedPacket<'_>,
    value: Option<&Value>,
    format: OutputFormat,
) {
    let value = value.map(|v| format!("{v:?}"));
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                index,
                stream: packet.stream_id,
                kind: kind_name(packet.kind()),
                bytes: total_bytes,
                payload_bytes: packet.payload.len(),
                timestamp: packet.timestamp,
                value,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "STREAM", "KIND", "BYTES", "TIMESTAMP", "VALUE"])
                .add_row(vec![
                    index.to_string(),
                    packet.stream_id.to_string(),
                    kind_name(packet.kind()).to_string(),
                    total_bytes.to_string(),
                    packet
                        .timestamp
                        .map_or_else(String::new, |ts| ts.to_string()),
                    value.unwrap_or_default(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "packet={index} stream={} kind={} bytes={total_bytes} payload={}{}{}",
                packet.stream_id,
                kind_name(packet.kind()),
                packet.payload.len(),
                packet
                    .timestamp
                    .map_or_else(String::new, |ts| format!(" timestamp={ts}")),
                value.map_or_else(String::new, |v| format!(" value={v}"))
            );
        }
        OutputFormat::Raw => {
            print_raw(packet.payload);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn kind_name(kind: PacketKind) -> &'static str {
    match kind {
        PacketKind::Data => "DATA",
        PacketKind::Message => "MESSAGE",
        PacketKind::Tag => "TAG",
    }
}
