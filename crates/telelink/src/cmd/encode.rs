use std::fs;

use serde_json::{Map, Value};
use telelink_frame::{compute_message_code, expected_frame_len, serialize, DirtyFlags, SensorStore};
use telelink_node::value_from_json;
use telelink_schema::Tier;
use tracing::debug;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS};
use crate::output::{print_encoded, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    let mut store = SensorStore::new(schema);

    for (name, value) in read_values(&args)? {
        let value = value_from_json(&value)
            .ok_or_else(|| CliError::usage(format!("value for {name} is not a number")))?;
        store
            .set_by_name(&name, value)
            .map_err(|err| frame_error("invalid value", err))?;
    }

    let mut flags = DirtyFlags::new();
    for name in &args.tiers {
        let tier = parse_tier(name)?;
        flags.mark(tier);
    }
    for &event in &args.events {
        if !flags.raise_event(event) {
            return Err(CliError::usage(format!("event {event} out of range")));
        }
    }

    let code = compute_message_code(&mut flags);
    let mut frame = vec![0u8; expected_frame_len(store.schema(), code)];
    let len = serialize(code, &store, &mut frame).map_err(|err| frame_error("encode failed", err))?;
    frame.truncate(len);
    debug!(code = %code, len, "frame encoded");

    print_encoded(code, &frame, format);
    Ok(SUCCESS)
}

fn read_values(args: &EncodeArgs) -> CliResult<Map<String, Value>> {
    let text = match (&args.values, &args.values_file) {
        (Some(json), _) => json.clone(),
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?,
        (None, None) => return Ok(Map::new()),
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(CliError::usage("values must be a JSON object")),
        Err(err) => Err(CliError::usage(format!("values are not valid JSON: {err}"))),
    }
}

fn parse_tier(name: &str) -> CliResult<Tier> {
    Tier::PERIODIC
        .into_iter()
        .find(|tier| tier.as_str().eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| {
            CliError::usage(format!(
                "unknown tier {name:?} (expected fast, medium or slow; use --events for conditional fields)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_tiers_parse() {
        assert_eq!(parse_tier("fast").unwrap(), Tier::Fast);
        assert_eq!(parse_tier("Slow").unwrap(), Tier::Slow);
        assert!(parse_tier("conditional").is_err());
    }
}
