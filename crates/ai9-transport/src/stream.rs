use std::io::ErrorKind;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::{OnData, Transport};

const READ_CHUNK_SIZE: usize = 4 * 1024;

/// Transport over any tokio byte stream.
///
/// Useful when the radio link is bridged by another process (a socket that
/// relays the characteristic) and for tests using [`tokio::io::duplex`].
/// The characteristic identifier is accepted for interface parity but a
/// stream carries only one.
pub struct StreamTransport<S> {
    reader: Option<ReadHalf<S>>,
    writer: WriteHalf<S>,
    reader_task: Option<JoinHandle<()>>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: Some(reader),
            writer,
            reader_task: None,
        }
    }

    /// True once the reader task has been started.
    pub fn is_subscribed(&self) -> bool {
        self.reader_task.is_some()
    }
}

#[cfg(unix)]
impl StreamTransport<tokio::net::UnixStream> {
    /// Connect to a Unix domain socket bridging the characteristic.
    pub async fn connect_unix(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let stream = tokio::net::UnixStream::connect(path)
            .await
            .map_err(|source| TransportError::Connect {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(stream))
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    async fn connect(&mut self) -> Result<()> {
        // The stream is connected on construction.
        debug!("stream transport ready");
        Ok(())
    }

    async fn subscribe(&mut self, characteristic: &str, mut on_data: OnData) -> Result<()> {
        let mut reader = self
            .reader
            .take()
            .ok_or_else(|| TransportError::AlreadySubscribed(characteristic.to_string()))?;
        debug!(characteristic, "subscribing to notifications");

        let task = tokio::spawn(async move {
            let mut chunk = vec![0u8; READ_CHUNK_SIZE];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => {
                        debug!("stream closed by peer");
                        break;
                    }
                    Ok(n) => on_data(&chunk[..n]),
                    Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                    Err(err) => {
                        warn!(error = %err, "stream read failed");
                        break;
                    }
                }
            }
        });
        self.reader_task = Some(task);
        Ok(())
    }

    async fn write(&mut self, _characteristic: &str, data: &[u8]) -> Result<()> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(())
    }
}

impl<S> Drop for StreamTransport<S> {
    fn drop(&mut self) {
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
    }
}
