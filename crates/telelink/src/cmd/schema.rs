use crate::cmd::SchemaArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_schema, OutputFormat};

pub fn run(args: SchemaArgs, format: OutputFormat) -> CliResult<i32> {
    let schema = args.source.load()?;
    print_schema(&schema, format);
    Ok(SUCCESS)
}
