//! Operator console worker: command entry and the quit directive

use crate::error::Result;
use crate::exchange::{CommandSender, Shutdown};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::BufRead;
use std::time::Duration;

/// Hand stdin lines to a channel from a dedicated reader thread.
///
/// Reading stdin cannot be interrupted, so the blocking read lives on its own
/// detached thread and the worker polls the channel with a timeout. On
/// fault-triggered shutdown the reader thread may still be parked in a read;
/// it is reclaimed at process exit.
pub fn stdin_lines() -> Result<Receiver<String>> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(text) => {
                        if tx.send(text).is_err() {
                            break;
                        }
                    }
                    Err(_) => break,
                }
            }
        })?;
    Ok(rx)
}

/// Bridges interactive operator input into the command queue and watches for
/// the quit directive.
pub struct CommandSource {
    lines: Receiver<String>,
    commands: CommandSender,
    quit_token: String,
    shutdown: Shutdown,
}

impl CommandSource {
    pub fn new(
        lines: Receiver<String>,
        commands: CommandSender,
        quit_token: String,
        shutdown: Shutdown,
    ) -> Self {
        CommandSource {
            lines,
            commands,
            quit_token,
            shutdown,
        }
    }

    /// Run the input loop until shutdown, quit, or end of input.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("command source started (quit token: {:?})", self.quit_token);

        while !self.shutdown.is_triggered() {
            match self.lines.recv_timeout(Duration::from_millis(100)) {
                Ok(line) => {
                    if line.trim() == self.quit_token {
                        log::info!("quit requested by operator");
                        self.shutdown.trigger();
                    } else if self.commands.send(line).is_err() {
                        // Writer gone; shutdown is already under way
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    log::info!("operator input closed, shutting down");
                    self.shutdown.trigger();
                }
            }
        }

        log::debug!("command source stopped");
        Ok(())
    }
}
