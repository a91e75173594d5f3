//! Serial write worker: downlink frames and operator commands

use crate::error::Result;
use crate::exchange::{CommandReceiver, Mailbox, Shutdown};
use crate::transport::Transport;
use crate::wire::{format_command_frame, format_data_frame};
use crossbeam_channel::TryRecvError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Serializes outgoing material to the target: at most one data frame and
/// one command per iteration, data first.
pub struct TargetWriter {
    transport: Arc<Mutex<Box<dyn Transport>>>,
    downlink: Arc<Mailbox>,
    commands: CommandReceiver,
    shutdown: Shutdown,
}

impl TargetWriter {
    pub fn new(
        transport: Arc<Mutex<Box<dyn Transport>>>,
        downlink: Arc<Mailbox>,
        commands: CommandReceiver,
        shutdown: Shutdown,
    ) -> Self {
        TargetWriter {
            transport,
            downlink,
            commands,
            shutdown,
        }
    }

    /// Run the write loop until shutdown or a write error.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("target writer started");

        while !self.shutdown.is_triggered() {
            let mut wrote_any = false;

            // Freshest downlink sample first
            if let Some(sample) = self.downlink.drain() {
                let frame = format_data_frame(&sample);
                self.write_frame(frame.as_bytes())?;
                log::trace!("wrote data frame: {:?}", frame);
                wrote_any = true;
            }

            // Then at most one pending operator command
            match self.commands.try_recv() {
                Ok(command) => {
                    match format_command_frame(&command) {
                        Some(frame) => {
                            self.write_frame(frame.as_bytes())?;
                            log::debug!("forwarded command: {:?}", frame);
                        }
                        // No '>' sigil: not forwarded (the sigil is the gate)
                        None => log::debug!("dropping non-command input: {:?}", command),
                    }
                    wrote_any = true;
                }
                Err(TryRecvError::Empty) => {}
                // Command source gone; shutdown will follow, keep draining data
                Err(TryRecvError::Disconnected) => {}
            }

            // An empty iteration is a normal no-op tick
            if wrote_any {
                std::thread::sleep(Duration::from_micros(500));
            } else {
                std::thread::sleep(Duration::from_millis(1));
            }
        }

        log::debug!("target writer stopped");
        Ok(())
    }

    fn write_frame(&self, bytes: &[u8]) -> Result<()> {
        let mut port = self.transport.lock();
        port.write(bytes)?;
        port.flush()?;
        Ok(())
    }
}
