use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;

use sigmux_mux::{Serializer, StreamConfig, Tag};
use sigmux_value::Value;

use crate::cmd::GenArgs;
use crate::exit::{io_error, CliError, CliResult, INTERNAL, SUCCESS};

/// Item size used for generated captures: one complex 32-bit pair.
const ITEM_SIZE: usize = 8;

fn feed_error(err: sigmux_mux::MuxError) -> CliError {
    CliError::new(INTERNAL, format!("feed serializer: {err}"))
}

/// Drive a two-stream serializer over synthetic input and write the
/// resulting packet sequence to a capture file.
pub fn run(args: GenArgs) -> CliResult<i32> {
    let configs = [StreamConfig::new(ITEM_SIZE), StreamConfig::new(ITEM_SIZE)];
    let mut mux = Serializer::new(&configs, args.mtu);

    let ramp: Vec<u8> = (0..args.items * ITEM_SIZE).map(|b| b as u8).collect();
    mux.push_samples(0, &ramp).map_err(feed_error)?;
    mux.push_samples(1, &ramp[..ramp.len() / 2]).map_err(feed_error)?;

    mux.push_tag(0, Tag::new(0, Value::Str("capture_start".to_string())))
        .map_err(feed_error)?;
    mux.push_tag(
        0,
        Tag::new(args.items as u64 / 2, Value::UInt(args.items as u64 / 2)),
    )
    .map_err(feed_error)?;

    let mut rate = BTreeMap::new();
    rate.insert("sample_rate".to_string(), Value::Float(250_000.0));
    mux.push_message(1, Value::Record(rate)).map_err(feed_error)?;

    let mut file = File::create(&args.out).map_err(|err| io_error("create capture", err))?;
    let mut packets = 0usize;
    let mut bytes = 0usize;
    while mux.has_pending() {
        for packet in mux.step() {
            file.write_all(packet.as_bytes())
                .map_err(|err| io_error("write capture", err))?;
            packets += 1;
            bytes += packet.len();
        }
    }
    file.flush().map_err(|err| io_error("flush capture", err))?;

    tracing::info!(packets, bytes, path = %args.out.display(), "capture written");
    Ok(SUCCESS)
}
