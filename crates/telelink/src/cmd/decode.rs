use telelink_frame::FrameConfig;
use telelink_node::RxNode;

use crate::cmd::DecodeArgs;
use crate::exit::{node_error, CliError, CliResult, SUCCESS};
use crate::output::{from_hex, print_snapshot, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    let frame = from_hex(&args.frame)
        .ok_or_else(|| CliError::usage("frame must be an even number of hex digits"))?;

    let config = FrameConfig {
        reject_trailing_bytes: !args.allow_trailing,
        ..FrameConfig::default()
    };
    let node = RxNode::with_config(schema, config);
    let code = node
        .apply(&frame)
        .map_err(|err| node_error("decode failed", err))?;
    let snapshot = node
        .snapshot()
        .map_err(|err| node_error("snapshot failed", err))?;

    print_snapshot(code, &frame, &snapshot, format);
    Ok(SUCCESS)
}
