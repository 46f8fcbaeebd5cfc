use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod dissect;
pub mod generate;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a synthetic capture by driving the serializer.
    Gen(GenArgs),
    /// Validate and print the packets in a capture file.
    Dissect(DissectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Gen(args) => generate::run(args),
        Command::Dissect(args) => dissect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct GenArgs {
    /// Capture file to write.
    pub out: PathBuf,
    /// Items to queue on the primary stream.
    #[arg(long, default_value_t = 256)]
    pub items: usize,
    /// Payload capacity hint in bytes.
    #[arg(long)]
    pub mtu: Option<usize>,
}

#[derive(Args, Debug)]
pub struct DissectArgs {
    /// Capture file to read.
    pub capture: PathBuf,
    /// Decode tag and message payloads.
    #[arg(long)]
    pub values: bool,
    /// Stop after N packets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
