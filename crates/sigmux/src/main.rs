mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "sigmux", version, about = "Packet framing CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dissect_subcommand() {
        let cli = Cli::try_parse_from(["sigmux", "dissect", "/tmp/capture.bin", "--values"])
            .expect("dissect args should parse");
        assert!(matches!(cli.command, Command::Dissect(_)));
    }

    #[test]
    fn parses_gen_subcommand() {
        let cli = Cli::try_parse_from([
            "sigmux",
            "gen",
            "/tmp/capture.bin",
            "--items",
            "512",
            "--mtu",
            "256",
        ])
        .expect("gen args should parse");
        assert!(matches!(cli.command, Command::Gen(_)));
    }

    #[test]
    fn rejects_unknown_format() {
        let err = Cli::try_parse_from(["sigmux", "--format", "xml", "version"])
            .expect_err("unknown format should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }
}
