use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use telelink_schema::Schema;

use crate::exit::{schema_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod listen;
pub mod schema;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print a schema's field layout.
    Schema(SchemaArgs),
    /// Build one frame from JSON field values.
    Encode(EncodeArgs),
    /// Decode one hex frame into field values.
    Decode(DecodeArgs),
    /// Run a transmitter node over UDP with synthetic sensor values.
    Send(SendArgs),
    /// Run a receiver node over UDP and print snapshots.
    Listen(ListenArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Schema(args) => schema::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Where the shared field layout comes from.
#[derive(Args, Debug)]
pub struct SchemaSource {
    /// Schema definition file (JSON).
    #[arg(long, value_name = "FILE", conflicts_with = "variant")]
    pub schema: Option<PathBuf>,
    /// Built-in schema variant.
    #[arg(long, value_name = "NAME", default_value = "wheels")]
    pub variant: String,
}

impl SchemaSource {
    pub fn load(&self) -> CliResult<Arc<Schema>> {
        let schema = match &self.schema {
            Some(path) => Schema::from_file(path)
                .map_err(|err| schema_error("schema load failed", err))?,
            None => Schema::variant(&self.variant)
                .map_err(|err| schema_error("schema variant failed", err))?,
        };
        Ok(Arc::new(schema))
    }
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    #[command(flatten)]
    pub source: SchemaSource,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Field values as a JSON object, e.g. '{"a":100,"b":200}'.
    #[arg(long, conflicts_with = "values_file")]
    pub values: Option<String>,
    /// Read field values from a JSON file.
    #[arg(long, value_name = "FILE", conflicts_with = "values")]
    pub values_file: Option<PathBuf>,
    /// Tiers to mark dirty (comma-separated: fast,medium,slow).
    #[arg(long, value_delimiter = ',')]
    pub tiers: Vec<String>,
    /// Conditional events to raise (comma-separated indices).
    #[arg(long, value_delimiter = ',')]
    pub events: Vec<u8>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Frame bytes as hex, whitespace allowed.
    pub frame: String,
    /// Accept frames longer than their code implies.
    #[arg(long)]
    pub allow_trailing: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Receiver address.
    #[arg(long, default_value = "127.0.0.1:7300")]
    pub to: SocketAddr,
    /// Stop after sending N frames.
    #[arg(long)]
    pub count: Option<u64>,
    /// Fast tier period (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms", value_parser = parse_duration)]
    pub fast: Duration,
    /// Medium tier period.
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub medium: Duration,
    /// Slow tier period.
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub slow: Duration,
    /// Send period.
    #[arg(long, default_value = "10ms", value_parser = parse_duration)]
    pub send: Duration,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    #[command(flatten)]
    pub source: SchemaSource,
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0:7300")]
    pub bind: SocketAddr,
    /// Exit after printing N frames.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Clear `running` on Ctrl-C so long-running loops exit cleanly.
pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Parse `500ms`, `2s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> Result<Duration, CliError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::usage("duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::usage(format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::usage("duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_parse() {
        assert_eq!(parse_duration("10ms").unwrap(), Duration::from_millis(10));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
        assert!(parse_duration("0ms").is_err());
        assert!(parse_duration("fast").is_err());
    }

    #[test]
    fn default_source_is_wheels() {
        let source = SchemaSource {
            schema: None,
            variant: "wheels".to_string(),
        };
        assert_eq!(source.load().unwrap().name(), "wheels");
    }
}
