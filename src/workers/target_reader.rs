//! Serial read worker: line reassembly and frame classification

use crate::error::Result;
use crate::exchange::{Mailbox, Shutdown};
use crate::transport::Transport;
use crate::wire::{LineAssembler, TargetLine, classify_line};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Reads the target's byte stream, reassembles newline-delimited lines,
/// publishes decoded data frames to the uplink mailbox, and echoes log lines
/// to the operator.
pub struct TargetReader {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    uplink: Arc<Mailbox>,
    /// Expected float count per data frame (target -> host)
    arity: usize,
    shutdown: Shutdown,
}

impl TargetReader {
    pub fn new(
        transport: Arc<Mutex<Box<dyn Transport>>>,
        uplink: Arc<Mailbox>,
        arity: usize,
        shutdown: Shutdown,
    ) -> Self {
        TargetReader {
            transport,
            uplink,
            arity,
            shutdown,
        }
    }

    /// Run the read loop until shutdown or a fatal condition.
    ///
    /// Transport errors and protocol violations propagate out; the supervisor
    /// wrapper reports them and raises the fault flag.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("target reader started");
        let mut assembler = LineAssembler::new();
        let mut chunk = [0u8; 256];

        while !self.shutdown.is_triggered() {
            // Lock held only for the (short-timeout) read so the writer can
            // interleave on the same port
            let n = self.transport.lock().read(&mut chunk)?;
            if n == 0 {
                std::thread::sleep(Duration::from_millis(1));
                continue;
            }

            for line in assembler.push(&chunk[..n]) {
                match classify_line(&line, self.arity)? {
                    TargetLine::Data(sample) => self.uplink.publish(sample),
                    // Target log output goes to the operator verbatim
                    TargetLine::Log(text) => println!("{}", text),
                }
            }
        }

        log::debug!("target reader stopped");
        Ok(())
    }
}
