use ai9_frame::{frame_bytes, hex, Opcode};
use serde::Serialize;

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_facts, print_raw, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    opcode: &'static str,
    value: u8,
    body_size: usize,
    frame_size: usize,
    frame: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let opcode: Opcode = args
        .opcode
        .parse()
        .map_err(|err| frame_error("invalid opcode", err))?;
    let body = hex::decode(&args.body).map_err(|err| frame_error("invalid body", err))?;
    let frame = frame_bytes(opcode, &body).map_err(|err| frame_error("encode", err))?;

    if matches!(format, OutputFormat::Raw) {
        print_raw(&frame).map_err(|err| io_error("write stdout", err))?;
        return Ok(SUCCESS);
    }

    let out = EncodeOutput {
        opcode: opcode.name(),
        value: opcode.as_u8(),
        body_size: body.len(),
        frame_size: frame.len(),
        frame: hex::encode(&frame),
    };
    let rows = [
        ("opcode", format!("{} ({:#04x})", out.opcode, out.value)),
        ("body_size", out.body_size.to_string()),
        ("frame_size", out.frame_size.to_string()),
        ("frame", out.frame.clone()),
    ];
    print_facts(&out, &rows, format);
    Ok(SUCCESS)
}
