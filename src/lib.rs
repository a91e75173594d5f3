//! hil-bridge - Serial/UDP bridge for hardware-in-the-loop simulation
//!
//! Connects a hardware target on a serial link with a numerical simulation
//! host on UDP so the two can exchange fixed-arity vectors of `f64` samples
//! in near-real time, while an operator injects shell commands into the
//! target and sees its text output.
//!
//! ## Architecture
//!
//! Five workers run on their own threads and meet at three exchange
//! primitives:
//!
//! - **UplinkReceiver**: host datagrams -> downlink [`Mailbox`](exchange::Mailbox)
//! - **TargetWriter**: downlink mailbox + command queue -> serial port
//! - **TargetReader**: serial port -> uplink mailbox (data) / stdout (logs)
//! - **HostSender**: uplink mailbox -> host datagrams
//! - **CommandSource**: operator input -> command queue, quit detection
//!
//! The mailboxes hold only the latest sample per direction: a newer sample
//! overwrites an unread older one by design. Any worker that hits a fatal
//! condition raises the shared shutdown flag; all loops observe it within
//! one polling interval and the supervisor joins them before releasing the
//! serial and UDP handles.

pub mod app;
pub mod config;
pub mod error;
pub mod exchange;
pub mod transport;
pub mod wire;
pub mod workers;

// Re-export commonly used types
pub use app::BridgeApp;
pub use config::AppConfig;
pub use error::{Error, Result};
