use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use serde_json::Value;
use telelink_frame::MessageCode;
use telelink_schema::{FieldKind, Schema, Tier};

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
struct SchemaOutput<'a> {
    name: &'a str,
    max_frame_len: usize,
    tier_sizes: TierSizes,
    fields: Vec<telelink_schema::FieldDefinition>,
}

#[derive(Serialize)]
struct TierSizes {
    fast: usize,
    medium: usize,
    slow: usize,
    conditional: usize,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    code: u16,
    len: usize,
    hex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
}

pub fn print_schema(schema: &Schema, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => {
            let out = SchemaOutput {
                name: schema.name(),
                max_frame_len: schema.max_frame_len(),
                tier_sizes: TierSizes {
                    fast: schema.tier_byte_size(Tier::Fast),
                    medium: schema.tier_byte_size(Tier::Medium),
                    slow: schema.tier_byte_size(Tier::Slow),
                    conditional: schema.tier_byte_size(Tier::Conditional),
                },
                fields: schema.to_definition().fields,
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "FIELD", "TIER", "EVENT", "TYPE", "BYTES", "SCALE", "BIAS"]);
            for (index, field) in schema.all_fields_in_priority_order().iter().enumerate() {
                let (scale, bias) = match field.kind() {
                    FieldKind::Quantized { scale, bias, .. } => (scale.to_string(), bias.to_string()),
                    _ => (String::new(), String::new()),
                };
                table.add_row(vec![
                    index.to_string(),
                    field.name().to_string(),
                    field.tier().to_string(),
                    field.event().map(|e| e.to_string()).unwrap_or_default(),
                    field.kind().label().to_string(),
                    field.size().to_string(),
                    scale,
                    bias,
                ]);
            }
            println!("{table}");
            println!(
                "schema {}: max frame {} bytes",
                schema.name(),
                schema.max_frame_len()
            );
        }
        OutputFormat::Pretty => {
            println!("{} (max frame {} bytes)", schema.name(), schema.max_frame_len());
            for tier in Tier::ALL {
                let names: Vec<&str> = schema.fields_in(tier).iter().map(|f| f.name()).collect();
                println!(
                    "  {tier:<11} {:>3}B  {}",
                    schema.tier_byte_size(tier),
                    names.join(", ")
                );
            }
        }
    }
}

/// Print an encoded frame; `Raw` writes the frame bytes themselves.
pub fn print_encoded(code: MessageCode, frame: &[u8], format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(frame),
        OutputFormat::Json => print_json(&FrameOutput {
            code: code.bits(),
            len: frame.len(),
            hex: to_hex(frame),
            fields: None,
            timestamp: None,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CODE", "LEN", "FRAME"])
                .add_row(vec![code.to_string(), frame.len().to_string(), to_hex(frame)]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!("{}", to_hex(frame)),
    }
}

/// Print a received frame with the receiver's field snapshot after applying it.
pub fn print_snapshot(code: MessageCode, frame: &[u8], snapshot: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(&FrameOutput {
            code: code.bits(),
            len: frame.len(),
            hex: to_hex(frame),
            fields: Some(snapshot),
            timestamp: Some(now_unix_seconds()),
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TIER", "FIELD", "VALUE", "UPDATED"]);
            for tier in Tier::ALL {
                let Some(fields) = snapshot.get(tier.as_str()).and_then(Value::as_object) else {
                    continue;
                };
                for (name, value) in fields {
                    table.add_row(vec![
                        tier.to_string(),
                        name.clone(),
                        value.to_string(),
                        updated_marker(code, tier),
                    ]);
                }
            }
            println!("code {code} ({} bytes)", frame.len());
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("code={code} len={} fields={snapshot}", frame.len());
        }
    }
}

/// Totals of a transmitter run.
#[derive(Serialize)]
pub struct SendSummary {
    pub to: String,
    pub frames: u64,
    pub bytes: u64,
    pub dropped: u64,
}

pub fn print_send_summary(summary: &SendSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json | OutputFormat::Raw => print_json(summary),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_header(vec!["TO", "FRAMES", "BYTES", "DROPPED"])
                .add_row(vec![
                    summary.to.clone(),
                    summary.frames.to_string(),
                    summary.bytes.to_string(),
                    summary.dropped.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => println!(
            "sent {} frames ({} bytes) to {}, {} dropped",
            summary.frames, summary.bytes, summary.to, summary.dropped
        ),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn updated_marker(code: MessageCode, tier: Tier) -> String {
    if code.has_tier(tier) {
        "*".to_string()
    } else {
        String::new()
    }
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Parse hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn from_hex(input: &str) -> Option<Vec<u8>> {
    let digits: String = input
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if digits.len() % 2 != 0 {
        return None;
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok())
        .collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
