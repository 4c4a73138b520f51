use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod encode;
pub mod image;
pub mod meta;
pub mod replay;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode one frame and print it as hex.
    Encode(EncodeArgs),
    /// Decode a hex capture of received bytes.
    Replay(ReplayArgs),
    /// Unpack a persisted record metadata block.
    Meta(MetaArgs),
    /// Decode a record image and optionally write it as PGM.
    Image(ImageArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Replay(args) => replay::run(args, format),
        Command::Meta(args) => meta::run(args, format),
        Command::Image(args) => image::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Opcode name (e.g. GET_SERIAL) or value (e.g. 0x03).
    pub opcode: String,
    /// Body as hex.
    #[arg(long, default_value = "55")]
    pub body: String,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Hex capture file, or `-` for stdin.
    pub input: PathBuf,
    /// Feed the capture in chunks of N bytes, like radio notifications.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub chunk: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MetaArgs {
    /// File holding the 71-byte metadata block.
    pub input: PathBuf,
}

#[derive(Args, Debug)]
pub struct ImageArgs {
    /// File holding the reassembled run-length stream, or `-` for stdin.
    pub input: PathBuf,
    /// Input is hex text instead of raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// Accept a stream that decodes to less than a full bitmap.
    #[arg(long, conflicts_with = "out")]
    pub lenient: bool,
    /// Write the decoded bitmap as a binary PGM file.
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Read a whole input, `-` meaning stdin.
pub(crate) fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::Read::read_to_end(&mut std::io::stdin(), &mut data)
            .map_err(|err| io_error("read stdin", err))?;
        return Ok(data);
    }
    std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}
