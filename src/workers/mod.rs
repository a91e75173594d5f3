//! The five bridge workers
//!
//! Each worker owns one loop and one responsibility. All of them poll the
//! shared [`Shutdown`](crate::exchange::Shutdown) flag at iteration
//! boundaries and exit cooperatively; fatal conditions surface as an `Err`
//! from `run()`, which the supervisor's thread wrapper turns into a
//! fault-triggered shutdown.

mod command_source;
mod host_sender;
mod target_reader;
mod target_writer;
mod uplink_receiver;

pub use command_source::{CommandSource, stdin_lines};
pub use host_sender::HostSender;
pub use target_reader::TargetReader;
pub use target_writer::TargetWriter;
pub use uplink_receiver::UplinkReceiver;
