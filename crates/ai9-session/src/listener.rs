//! Event listener registry and the built-in device event listener.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use ai9_frame::Opcode;
use tracing::{error, info};

/// Error type listeners may return; it is logged and dropped.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Callback invoked with every message of the opcode it is registered for.
///
/// Listeners run in the transport's receive context and must not block.
pub type Listener = Box<dyn FnMut(Opcode, &[u8]) -> Result<(), ListenerError> + Send>;

/// Mapping from opcode to its ordered listeners.
///
/// Messages whose opcode has at least one listener are consumed here and never
/// reach the request/response queue.
#[derive(Default)]
pub struct Listeners {
    map: HashMap<Opcode, Vec<Listener>>,
}

impl Listeners {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in `GET_ASYNC` event logger.
    pub fn with_defaults() -> Self {
        let mut listeners = Self::new();
        listeners.on(Opcode::GetAsync, log_async_event);
        listeners
    }

    /// Append a listener for `opcode`.
    pub fn on<F>(&mut self, opcode: Opcode, listener: F) -> &mut Self
    where
        F: FnMut(Opcode, &[u8]) -> Result<(), ListenerError> + Send + 'static,
    {
        self.map.entry(opcode).or_default().push(Box::new(listener));
        self
    }

    /// True if messages of `opcode` are routed to listeners.
    pub fn handles(&self, opcode: Opcode) -> bool {
        self.map.get(&opcode).is_some_and(|list| !list.is_empty())
    }

    /// Number of listeners registered for `opcode`.
    pub fn count(&self, opcode: Opcode) -> usize {
        self.map.get(&opcode).map_or(0, Vec::len)
    }

    /// Run every listener for `opcode`. Returns false when there are none.
    ///
    /// A listener that errors or panics is logged; the remaining listeners
    /// still run.
    pub(crate) fn dispatch(&mut self, opcode: Opcode, body: &[u8]) -> bool {
        let Some(list) = self.map.get_mut(&opcode).filter(|list| !list.is_empty()) else {
            return false;
        };

        for listener in list.iter_mut() {
            match catch_unwind(AssertUnwindSafe(|| listener(opcode, body))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!(%opcode, error = %err, "listener failed"),
                Err(_) => error!(%opcode, "listener panicked"),
            }
        }
        true
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_map();
        for (opcode, list) in &self.map {
            dbg.entry(opcode, &list.len());
        }
        dbg.finish()
    }
}

/// An unsolicited device event carried by `GET_ASYNC`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsyncEvent {
    pub code: u8,
    /// Splice loss in hundredths of a dB.
    pub loss: u8,
}

impl AsyncEvent {
    pub fn parse(body: &[u8]) -> Result<Self, EventBodyTooShort> {
        match body {
            [code, loss, ..] => Ok(Self {
                code: *code,
                loss: *loss,
            }),
            _ => Err(EventBodyTooShort(body.len())),
        }
    }

    pub fn name(&self) -> &'static str {
        event_name(self.code)
    }

    pub fn loss_db(&self) -> f32 {
        f32::from(self.loss) * 0.01
    }
}

/// A `GET_ASYNC` body without code and loss bytes.
#[derive(Debug, thiserror::Error)]
#[error("event body too short ({0} bytes)")]
pub struct EventBodyTooShort(pub usize);

/// Human-readable name of an event code.
pub fn event_name(code: u8) -> &'static str {
    match code {
        0x01 => "lid open",
        0x02 => "lid close",
        0x04 => "found/aligned",
        0x06 => "arc",
        0x07 => "splice success",
        0x08 => "splice failure",
        0x0d => "left fiber misplaced",
        0x0f => "right fiber misplaced",
        0x11 => "fiber already spliced",
        0x12 => "left face/angle unacceptable",
        0x14 => "both face/angle unacceptable",
        0x15 => "fiber not found",
        0x21 => "heat start",
        0x22 => "heat done",
        0x31 => "left fiber not found",
        0x32 => "right fiber not found",
        0x33 => "heater warmup",
        _ => "unknown",
    }
}

fn log_async_event(_opcode: Opcode, body: &[u8]) -> Result<(), ListenerError> {
    let event = AsyncEvent::parse(body)?;
    info!(
        code = format_args!("{:#04x}", event.code),
        loss_db = event.loss_db(),
        "event: {}",
        event.name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn event_table() {
        assert_eq!(event_name(0x07), "splice success");
        assert_eq!(event_name(0x33), "heater warmup");
        assert_eq!(event_name(0x99), "unknown");
    }

    #[test]
    fn parses_event_body() {
        let event = AsyncEvent::parse(&[0x07, 0x03]).unwrap();
        assert_eq!(event.name(), "splice success");
        assert!((event.loss_db() - 0.03).abs() < 1e-6);
        assert!(AsyncEvent::parse(&[0x07]).is_err());
    }

    #[test]
    fn defaults_handle_async_only() {
        let listeners = Listeners::with_defaults();
        assert!(listeners.handles(Opcode::GetAsync));
        assert!(!listeners.handles(Opcode::GetSerial));
        assert_eq!(listeners.count(Opcode::GetAsync), 1);
    }

    #[test]
    fn runs_listeners_in_order_and_isolates_failures() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::new();

        let first = Arc::clone(&seen);
        let third = Arc::clone(&seen);
        listeners
            .on(Opcode::GetMode, move |_, body| {
                first.lock().unwrap().push(("first", body.to_vec()));
                Ok(())
            })
            .on(Opcode::GetMode, |_, _| Err("broken".into()))
            .on(Opcode::GetMode, |_, _| panic!("listener bug"))
            .on(Opcode::GetMode, move |_, body| {
                third.lock().unwrap().push(("last", body.to_vec()));
                Ok(())
            });

        assert!(listeners.dispatch(Opcode::GetMode, &[1]));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![("first", vec![1]), ("last", vec![1])]
        );
        assert!(!listeners.dispatch(Opcode::GetSerial, &[1]));
    }

    #[test]
    fn builtin_listener_tolerates_unknown_and_short_events() {
        let mut listeners = Listeners::with_defaults();
        assert!(listeners.dispatch(Opcode::GetAsync, &[0x99, 0x00]));
        assert!(listeners.dispatch(Opcode::GetAsync, &[]));
    }
}
