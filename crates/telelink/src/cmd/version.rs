use telelink_schema::VARIANT_NAMES;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("telelink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: telelink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("TELELINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("max_frame_size: {}", telelink_frame::DEFAULT_MAX_FRAME_SIZE);
    println!("variants: {}", VARIANT_NAMES.join(", "));
    println!(
        "features: node={}, async={}, cli=true",
        cfg!(feature = "node"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
