//! In-process transport double.

use std::collections::VecDeque;

use ai9_frame::{frame_bytes, FrameError, Opcode};
use ai9_transport::{OnData, Result, Transport, TransportError};
use bytes::Bytes;
use tracing::debug;

/// Reply sent for a write when nothing else is scripted.
pub const LOOPBACK_ACK: &[u8] = &[0x66];

/// A transport that answers its own writes.
///
/// Each write is answered inside the write call, through the subscriber
/// callback, with the next scripted reply. Without a script the reply echoes
/// the written opcode with a `0x66` body, the same acknowledgement the device
/// sends for set commands. Replies can be delivered in small pieces to mimic
/// the radio MTU.
pub struct LoopbackTransport {
    on_data: Option<OnData>,
    replies: VecDeque<Bytes>,
    written: Vec<Bytes>,
    echo: bool,
    mtu: Option<usize>,
    connected: bool,
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopbackTransport {
    /// Loopback that acknowledges every write.
    pub fn new() -> Self {
        Self {
            on_data: None,
            replies: VecDeque::new(),
            written: Vec::new(),
            echo: true,
            mtu: None,
            connected: false,
        }
    }

    /// Loopback that only sends scripted replies.
    pub fn silent() -> Self {
        Self {
            echo: false,
            ..Self::new()
        }
    }

    /// Deliver replies in pieces of at most `mtu` bytes.
    pub fn with_mtu(mut self, mtu: usize) -> Self {
        self.mtu = Some(mtu.max(1));
        self
    }

    /// Answer the next unanswered write with one frame.
    pub fn push_reply(
        &mut self,
        opcode: Opcode,
        body: &[u8],
    ) -> std::result::Result<&mut Self, FrameError> {
        let frame = frame_bytes(opcode, body)?;
        self.replies.push_back(frame);
        Ok(self)
    }

    /// Answer the next unanswered write with raw bytes (several frames, junk...).
    pub fn push_raw(&mut self, data: impl Into<Bytes>) -> &mut Self {
        self.replies.push_back(data.into());
        self
    }

    /// Deliver bytes now, as an unsolicited notification.
    pub fn inject(&mut self, data: &[u8]) -> Result<()> {
        self.deliver(data)
    }

    /// Drop the subscriber, as if the link went away.
    pub fn disconnect(&mut self) {
        self.on_data = None;
        self.connected = false;
    }

    /// Every frame written so far.
    pub fn written(&self) -> &[Bytes] {
        &self.written
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    fn deliver(&mut self, data: &[u8]) -> Result<()> {
        let on_data = self.on_data.as_mut().ok_or(TransportError::Shutdown)?;
        match self.mtu {
            Some(mtu) => data.chunks(mtu).for_each(|piece| on_data(piece)),
            None => on_data(data),
        }
        Ok(())
    }

    fn reply_for(&mut self, data: &[u8]) -> Option<Bytes> {
        if let Some(reply) = self.replies.pop_front() {
            return Some(reply);
        }
        if !self.echo {
            return None;
        }
        let opcode = data.get(2).and_then(|b| Opcode::try_from(*b).ok())?;
        frame_bytes(opcode, LOOPBACK_ACK).ok()
    }
}

impl Transport for LoopbackTransport {
    async fn connect(&mut self) -> Result<()> {
        self.connected = true;
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: &str, on_data: OnData) -> Result<()> {
        if self.on_data.is_some() {
            return Err(TransportError::AlreadySubscribed(characteristic.to_string()));
        }
        self.on_data = Some(on_data);
        Ok(())
    }

    async fn write(&mut self, _characteristic: &str, data: &[u8]) -> Result<()> {
        if self.on_data.is_none() {
            return Err(TransportError::Shutdown);
        }
        self.written.push(Bytes::copy_from_slice(data));
        if let Some(reply) = self.reply_for(data) {
            debug!(len = reply.len(), "loopback reply");
            self.deliver(&reply)?;
        }
        Ok(())
    }
}
