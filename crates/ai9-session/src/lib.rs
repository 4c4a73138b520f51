//! Request/response session and event dispatch for AI-9 devices.
//!
//! This is the layer applications talk to. A [`Session`] writes framed
//! commands through a [`Transport`](ai9_transport::Transport) and waits for
//! the matching reply; unsolicited device events are routed to
//! [`Listeners`] as they arrive.
//!
//! ```ignore
//! let mut session = Session::open(transport).await?;
//! let serial = session.serial().await?;
//! for index in 0..=session.last_record_index().await? {
//!     let record = session.read_record(index).await?;
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod loopback;
pub mod motor;
pub mod session;

pub use config::SessionConfig;
pub use dispatcher::{DispatchStats, Dispatcher};
pub use error::{Result, SessionError};
pub use listener::{event_name, AsyncEvent, Listener, ListenerError, Listeners};
pub use loopback::LoopbackTransport;
pub use motor::{Direction, Side, DEFAULT_SPEED};
pub use session::{Record, Session, ACK, DEFAULT_BODY};
