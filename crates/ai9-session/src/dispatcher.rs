use ai9_frame::{decode_frame, hex, Decoded, Message};
use bytes::BytesMut;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::listener::Listeners;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Counters of what the receive path has seen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Valid frames decoded.
    pub frames: u64,
    /// Frames handed to listeners.
    pub events: u64,
    /// Frames queued for the requester.
    pub queued: u64,
    /// Bytes dropped while hunting for a start marker.
    pub desyncs: u64,
    /// Complete frames dropped for a bad checksum or unknown opcode.
    pub rejected: u64,
}

/// Receive side of a session.
///
/// Owns the receive buffer and the listener registry. Every chunk handed to
/// [`feed`](Self::feed) is decoded right away; events go to listeners and
/// everything else to the response queue, strictly in arrival order.
pub struct Dispatcher {
    buf: BytesMut,
    listeners: Listeners,
    queue: mpsc::UnboundedSender<Message>,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(listeners: Listeners, queue: mpsc::UnboundedSender<Message>) -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            listeners,
            queue,
            stats: DispatchStats::default(),
        }
    }

    /// Append received bytes and process every complete frame.
    ///
    /// Corruption is handled here: a missing start marker drops one byte, a
    /// bad frame is dropped whole, and decoding carries on either way.
    pub fn feed(&mut self, data: &[u8]) {
        debug!(data = %hex::encode(data), "recv");
        self.buf.extend_from_slice(data);

        loop {
            match decode_frame(&mut self.buf) {
                Decoded::NeedMoreData => {
                    if !self.buf.is_empty() {
                        debug!(buffered = self.buf.len(), "incomplete message");
                    }
                    return;
                }
                Decoded::Desync { skipped } => {
                    self.stats.desyncs += 1;
                    debug!(skipped = format_args!("{skipped:#04x}"), "resynchronizing");
                }
                Decoded::Rejected(reason) => {
                    self.stats.rejected += 1;
                    error!(%reason, "invalid message");
                }
                Decoded::Frame(message) => {
                    self.stats.frames += 1;
                    info!(opcode = %message.opcode, body = %hex::encode(&message.body), "recv msg");
                    self.route(message);
                }
            }
        }
    }

    fn route(&mut self, message: Message) {
        if self.listeners.dispatch(message.opcode, &message.body) {
            self.stats.events += 1;
            return;
        }

        self.stats.queued += 1;
        if let Err(mpsc::error::SendError(message)) = self.queue.send(message) {
            warn!(opcode = %message.opcode, "session gone, dropping message");
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Bytes held back waiting for the rest of a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }
}
