use ai9_record::RecordMeta;

use crate::cmd::{read_input, MetaArgs};
use crate::exit::{io_error, record_error, CliResult, SUCCESS};
use crate::output::{print_meta, OutputFormat};

pub fn run(args: MetaArgs, format: OutputFormat) -> CliResult<i32> {
    let data = read_input(&args.input)?;
    let meta =
        RecordMeta::unpack(&data).map_err(|err| record_error("invalid record meta", err))?;
    print_meta(&meta, format).map_err(|err| io_error("write stdout", err))?;
    Ok(SUCCESS)
}
