use std::fs;

use sigmux_value::decode_value;
use sigmux_wire::{unpack_packet, WORD_BYTES};

use crate::cmd::DissectArgs;
use crate::exit::{io_error, value_error, wire_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_packet, OutputFormat};

/// Walk a capture file packet by packet, validating each one.
pub fn run(args: DissectArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = fs::read(&args.capture).map_err(|err| io_error("read capture", err))?;

    let mut at = 0usize;
    let mut index = 0usize;
    while at < bytes.len() {
        let remaining = &bytes[at..];
        if remaining.len() < 2 * WORD_BYTES {
            return Err(CliError::new(
                DATA_INVALID,
                format!("trailing {} bytes at offset {at}", remaining.len()),
            ));
        }

        // Packets are self-delimiting: the outer word count in word 1
        // tells us where this one ends.
        let declared = (u32::from_be_bytes(remaining[4..8].try_into().unwrap()) & 0xF_FFFF)
            as usize
            * WORD_BYTES;
        if declared == 0 || declared > remaining.len() {
            return Err(CliError::new(
                DATA_INVALID,
                format!("packet at offset {at} declares {declared} bytes, {} remain", remaining.len()),
            ));
        }

        let packet = unpack_packet(&remaining[..declared])
            .map_err(|err| wire_error(&format!("packet {index} at offset {at}"), err))?;

        let value = if args.values && packet.is_control {
            Some(
                decode_value(packet.payload)
                    .map_err(|err| value_error(&format!("packet {index} payload"), err))?,
            )
        } else {
            None
        };

        print_packet(index, declared, &packet, value.as_ref(), format);

        at += declared;
        index += 1;
        if args.count.is_some_and(|limit| index >= limit) {
            break;
        }
    }

    tracing::info!(packets = index, bytes = at, "capture dissected");
    Ok(SUCCESS)
}
