use ai9_frame::{frame_bytes, hex, Message, Opcode};
use ai9_record::{
    decode_bitmap, AdminSettings, DateTime, FiberFunc, FiberSettings, HeatSettings,
    ImageAssembler, RecordMeta,
};
use ai9_transport::{Transport, MESSAGE_CHARACTERISTIC};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::SessionConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Result, SessionError};
use crate::listener::Listeners;
use crate::motor::{move_body, Direction, Side};

/// Body sent with queries that take no argument.
pub const DEFAULT_BODY: &[u8] = &[0x55];

/// Body the device answers set commands with.
pub const ACK: &[u8] = &[0x66];

/// One stored splice: metadata plus the decoded 640×480 bitmap, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub meta: RecordMeta,
    pub image: Option<Vec<u8>>,
}

/// A connected request/response session with one device.
///
/// The receive path (a [`Dispatcher`]) lives inside the transport callback;
/// the session holds the other end of its response queue. Every request method
/// takes `&mut self`, so at most one request is ever in flight.
pub struct Session<T> {
    transport: T,
    responses: mpsc::UnboundedReceiver<Message>,
    config: SessionConfig,
}

impl<T: Transport> Session<T> {
    /// Connect the transport and route its notifications through a dispatcher.
    pub async fn connect(
        mut transport: T,
        listeners: Listeners,
        config: SessionConfig,
    ) -> Result<Self> {
        transport.connect().await?;

        let (queue, responses) = mpsc::unbounded_channel();
        let mut dispatcher = Dispatcher::new(listeners, queue);
        transport
            .subscribe(
                MESSAGE_CHARACTERISTIC,
                Box::new(move |data: &[u8]| dispatcher.feed(data)),
            )
            .await?;
        debug!(?config, "session connected");

        Ok(Self {
            transport,
            responses,
            config,
        })
    }

    /// Connect with the built-in event listener and default configuration.
    pub async fn open(transport: T) -> Result<Self> {
        Self::connect(transport, Listeners::with_defaults(), SessionConfig::default()).await
    }

    /// Send a request and return the body of its reply.
    ///
    /// The reply must carry the same opcode; anything else is a failure of
    /// this request and is not retried.
    pub async fn call(&mut self, opcode: Opcode, body: &[u8]) -> Result<Bytes> {
        self.send(opcode, body).await?;
        let reply = self.next_message().await?;
        if reply.opcode != opcode {
            return Err(SessionError::OpcodeMismatch {
                sent: opcode,
                received: reply.opcode,
            });
        }
        Ok(reply.body)
    }

    /// Query with the default argument.
    pub async fn get(&mut self, opcode: Opcode) -> Result<Bytes> {
        self.call(opcode, DEFAULT_BODY).await
    }

    /// Query with an explicit argument.
    pub async fn get_with(&mut self, opcode: Opcode, body: &[u8]) -> Result<Bytes> {
        self.call(opcode, body).await
    }

    /// Send a set command and require the standard acknowledgement.
    pub async fn set(&mut self, opcode: Opcode, body: &[u8]) -> Result<()> {
        self.set_expect(opcode, body, ACK).await
    }

    /// Send a set command with the default argument.
    pub async fn command(&mut self, opcode: Opcode) -> Result<()> {
        self.set_expect(opcode, DEFAULT_BODY, ACK).await
    }

    /// Send a set command and require the reply body to equal `expect`.
    pub async fn set_expect(&mut self, opcode: Opcode, body: &[u8], expect: &[u8]) -> Result<()> {
        let reply = self.call(opcode, body).await?;
        if reply.as_ref() != expect {
            return Err(SessionError::AckMismatch {
                opcode,
                expected: expect.to_vec(),
                actual: reply.to_vec(),
            });
        }
        Ok(())
    }

    /// Fetch one stored record and, when it has one, its image.
    ///
    /// The device answers `GET_RECORD` with `GET_CURRENT_RECORD` followed by
    /// the image chunks, so this bypasses [`call`](Self::call).
    pub async fn read_record(&mut self, index: u16) -> Result<Record> {
        self.send(Opcode::GetRecord, &index.to_be_bytes()).await?;
        let reply = self.next_message().await?;
        if reply.opcode != Opcode::GetCurrentRecord {
            return Err(SessionError::UnexpectedMessage {
                expected: Opcode::GetCurrentRecord,
                received: reply.opcode,
            });
        }

        let meta = RecordMeta::unpack(&reply.body)?;
        info!(index, datetime = %meta.datetime, image_len = meta.image_len, "record");

        let image = if meta.has_image() {
            let raw = self
                .read_image(meta.image_handle, usize::from(meta.image_len))
                .await?;
            Some(decode_bitmap(&raw)?)
        } else {
            None
        };
        Ok(Record { meta, image })
    }

    /// Collect the chunks of image transfer `handle` from the queue.
    ///
    /// Returns the run-length encoded image, which must be exactly
    /// `expected_len` bytes.
    pub async fn read_image(&mut self, handle: u8, expected_len: usize) -> Result<Bytes> {
        let mut assembler = ImageAssembler::new(handle, expected_len);
        loop {
            let message = self.next_message().await?;
            if message.opcode != Opcode::GetRecordImg {
                return Err(SessionError::UnexpectedMessage {
                    expected: Opcode::GetRecordImg,
                    received: message.opcode,
                });
            }
            if let Some(image) = assembler.push(&message.body)? {
                debug!(handle, parts = assembler.parts(), len = image.len(), "image complete");
                return Ok(image);
            }
        }
    }

    /// Index of the newest stored record; records are numbered from 0.
    pub async fn last_record_index(&mut self) -> Result<u16> {
        let body = self.get(Opcode::GetRecordLast).await?;
        match body.as_ref() {
            [low] => Ok(u16::from(*low)),
            [high, low] => Ok(u16::from_be_bytes([*high, *low])),
            _ => Err(SessionError::Malformed {
                opcode: Opcode::GetRecordLast,
                len: body.len(),
            }),
        }
    }

    pub async fn fiber_settings(&mut self) -> Result<FiberSettings> {
        let body = self.get_with(Opcode::GetFiberSettings, &[0x00]).await?;
        Ok(FiberSettings::unpack(&body)?)
    }

    pub async fn fiber_func(&mut self) -> Result<FiberFunc> {
        let body = self.get(Opcode::GetFiberFunc).await?;
        Ok(FiberFunc::unpack(&body)?)
    }

    pub async fn heat_settings(&mut self) -> Result<HeatSettings> {
        let body = self.get(Opcode::GetHeatTime).await?;
        Ok(HeatSettings::unpack(&body)?)
    }

    pub async fn admin_settings(&mut self) -> Result<AdminSettings> {
        let body = self.get(Opcode::GetFiberAdmin).await?;
        Ok(AdminSettings::unpack(&body)?)
    }

    pub async fn datetime(&mut self) -> Result<DateTime> {
        let body = self.get(Opcode::GetDatetime).await?;
        Ok(DateTime::unpack(&body)?)
    }

    /// Serial number, with NUL padding removed.
    pub async fn serial(&mut self) -> Result<String> {
        let body = self.get(Opcode::GetSerial).await?;
        Ok(String::from_utf8_lossy(&body)
            .trim_end_matches('\0')
            .trim()
            .to_string())
    }

    /// Drive one motor. The device must be in manual mode.
    pub async fn move_motor(
        &mut self,
        side: Side,
        direction: Direction,
        steps: u8,
        speed: u8,
    ) -> Result<()> {
        debug!(%side, %direction, steps, speed, "move motor");
        self.set(Opcode::MoveMotor, &move_body(side, direction, steps, speed))
            .await
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Close the session and return the transport.
    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn send(&mut self, opcode: Opcode, body: &[u8]) -> Result<()> {
        while let Ok(stale) = self.responses.try_recv() {
            error!(
                opcode = %stale.opcode,
                body = %hex::encode(&stale.body),
                "unhandled message"
            );
        }

        info!(%opcode, body = %hex::encode(body), "send msg");
        let frame = frame_bytes(opcode, body)?;
        debug!(data = %hex::encode(&frame), "send");
        self.transport.write(MESSAGE_CHARACTERISTIC, &frame).await?;
        Ok(())
    }

    async fn next_message(&mut self) -> Result<Message> {
        let next = match self.config.response_timeout {
            Some(limit) => tokio::time::timeout(limit, self.responses.recv())
                .await
                .map_err(|_| SessionError::Timeout(limit))?,
            None => self.responses.recv().await,
        };
        next.ok_or(SessionError::Disconnected)
    }
}
