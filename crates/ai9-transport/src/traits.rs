use std::future::Future;

use crate::error::Result;

/// The GATT characteristic carrying both directions of the message stream.
pub const MESSAGE_CHARACTERISTIC: &str = "0000ffe1-0000-1000-8000-00805f9b34fb";

/// Notification callback.
///
/// Called from the transport's receive context for every chunk of bytes that
/// arrives. Implementations must not block.
pub type OnData = Box<dyn FnMut(&[u8]) + Send + 'static>;

/// A connected duplex byte channel to one peripheral.
///
/// One transport serves exactly one peer; there is no addressing beyond the
/// characteristic identifier.
pub trait Transport: Send {
    /// Establish the link.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Route notifications for `characteristic` to `on_data`.
    ///
    /// Dropping the callback (for example when the link goes away) is how the
    /// transport signals end of stream to the subscriber.
    fn subscribe(
        &mut self,
        characteristic: &str,
        on_data: OnData,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Write raw bytes to `characteristic`.
    fn write(&mut self, characteristic: &str, data: &[u8])
        -> impl Future<Output = Result<()>> + Send;
}
