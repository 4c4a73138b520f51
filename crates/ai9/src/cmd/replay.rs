use ai9_frame::hex;
use ai9_session::{Dispatcher, Listeners};
use tokio::sync::mpsc;
use tracing::info;

use crate::cmd::{read_input, ReplayArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_messages, OutputFormat};

pub fn run(args: ReplayArgs, format: OutputFormat) -> CliResult<i32> {
    let input = read_input(&args.input)?;
    let text = String::from_utf8(input)
        .map_err(|_| CliError::new(DATA_INVALID, "capture is not hex text"))?;
    let data = hex::decode(&text).map_err(|err| frame_error("invalid capture", err))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(Listeners::with_defaults(), tx);

    let chunk = args
        .chunk
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(data.len())
        .max(1);
    for piece in data.chunks(chunk) {
        dispatcher.feed(piece);
    }

    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    print_messages(&messages, format).map_err(|err| io_error("write stdout", err))?;

    let stats = dispatcher.stats();
    info!(
        bytes = data.len(),
        frames = stats.frames,
        events = stats.events,
        queued = stats.queued,
        desyncs = stats.desyncs,
        rejected = stats.rejected,
        buffered = dispatcher.buffered(),
        "replay complete"
    );

    Ok(SUCCESS)
}
