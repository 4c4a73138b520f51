use std::io::Write;
use std::path::Path;

use ai9_frame::hex;
use ai9_record::{decode_bitmap, decode_runs, BITMAP_SIZE, IMAGE_HEIGHT, IMAGE_WIDTH};
use serde::Serialize;

use crate::cmd::{read_input, ImageArgs};
use crate::exit::{
    frame_error, io_error, record_error, CliError, CliResult, DATA_INVALID, SUCCESS,
};
use crate::output::{print_facts, print_raw, OutputFormat};

#[derive(Serialize)]
struct ImageSummary {
    encoded_size: usize,
    runs: usize,
    decoded_size: usize,
    complete: bool,
    width: usize,
    height: usize,
    white_pixels: usize,
    written: Option<String>,
}

pub fn run(args: ImageArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args.input)?;
    let encoded = if args.hex {
        let text = String::from_utf8(input)
            .map_err(|_| CliError::new(DATA_INVALID, "image input is not hex text"))?;
        hex::decode(&text).map_err(|err| frame_error("invalid image hex", err))?
    } else {
        input
    };

    let bitmap = if args.lenient {
        decode_runs(&encoded, BITMAP_SIZE)
    } else {
        decode_bitmap(&encoded)
    }
    .map_err(|err| record_error("invalid image", err))?;

    if let Some(path) = &args.out {
        write_pgm(path, &bitmap)
            .map_err(|err| io_error(&format!("write {}", path.display()), err))?;
    }

    if matches!(format, OutputFormat::Raw) && args.out.is_none() {
        print_raw(&bitmap).map_err(|err| io_error("write stdout", err))?;
        return Ok(SUCCESS);
    }

    let summary = ImageSummary {
        encoded_size: encoded.len(),
        runs: encoded.len() / 2,
        decoded_size: bitmap.len(),
        complete: bitmap.len() == BITMAP_SIZE,
        width: IMAGE_WIDTH,
        height: IMAGE_HEIGHT,
        white_pixels: bitmap.iter().filter(|&&px| px != 0).count(),
        written: args.out.as_ref().map(|p| p.display().to_string()),
    };
    let rows = [
        ("encoded_size", summary.encoded_size.to_string()),
        ("runs", summary.runs.to_string()),
        (
            "decoded_size",
            format!("{} of {BITMAP_SIZE}", summary.decoded_size),
        ),
        ("size", format!("{}x{}", summary.width, summary.height)),
        ("white_pixels", summary.white_pixels.to_string()),
        (
            "written",
            summary.written.clone().unwrap_or_else(|| "-".to_string()),
        ),
    ];
    print_facts(&summary, &rows, format);
    Ok(SUCCESS)
}

/// Binary greyscale PGM, one byte per pixel.
fn write_pgm(path: &Path, bitmap: &[u8]) -> std::io::Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
    write!(file, "P5\n{IMAGE_WIDTH} {IMAGE_HEIGHT}\n255\n")?;
    file.write_all(bitmap)?;
    file.flush()
}
