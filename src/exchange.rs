//! Shared exchange primitives between the bridge workers
//!
//! Each primitive has exactly the access pattern the bridge needs and nothing
//! more: a single-slot overwrite mailbox per data direction, an unbounded
//! FIFO for operator commands, and an idempotent shutdown flag every worker
//! loop polls at iteration boundaries.

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A fixed-arity vector of `f64` samples exchanged with the simulation host
pub type Sample = Vec<f64>;

/// Single-slot exchange between one producer and one consumer.
///
/// Publishing overwrites any unconsumed sample (no queuing); draining clears
/// the slot so the same sample is never forwarded twice. A consumer may skip
/// samples entirely, but every sample it does see is the latest available at
/// drain time. Staleness is the designed trade-off for low latency.
pub struct Mailbox {
    slot: Mutex<Option<Sample>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Mailbox {
            slot: Mutex::new(None),
        }
    }

    /// Publish a sample, replacing any unconsumed one.
    pub fn publish(&self, sample: Sample) {
        *self.slot.lock() = Some(sample);
    }

    /// Drain the slot. `None` means nothing fresh since the last drain.
    pub fn drain(&self) -> Option<Sample> {
        self.slot.lock().take()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer end of the operator command FIFO
pub type CommandSender = Sender<String>;
/// Consumer end of the operator command FIFO
pub type CommandReceiver = Receiver<String>;

/// Create the unbounded, order-preserving command queue.
pub fn command_queue() -> (CommandSender, CommandReceiver) {
    crossbeam_channel::unbounded()
}

/// Process-wide cooperative cancellation signal.
///
/// Any worker (or the supervisor) may set it; setting is idempotent and the
/// flag never resets within a run. A fault-triggered shutdown is recorded
/// separately so the process can exit non-zero after teardown.
#[derive(Clone)]
pub struct Shutdown {
    stop: Arc<AtomicBool>,
    fault: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Shutdown {
            stop: Arc::new(AtomicBool::new(false)),
            fault: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a clean shutdown (quit directive or external interrupt).
    pub fn trigger(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Record a fatal condition and request shutdown.
    pub fn fail(&self) {
        self.fault.store(true, Ordering::Relaxed);
        self.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_triggered(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn is_fault(&self) -> bool {
        self.fault.load(Ordering::Relaxed)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailbox_read_and_clear() {
        let mailbox = Mailbox::new();
        assert_eq!(mailbox.drain(), None);

        mailbox.publish(vec![1.0, 2.0]);
        assert_eq!(mailbox.drain(), Some(vec![1.0, 2.0]));

        // Consuming clears freshness; a second drain sees nothing
        assert_eq!(mailbox.drain(), None);
        assert_eq!(mailbox.drain(), None);
    }

    #[test]
    fn test_mailbox_overwrite() {
        let mailbox = Mailbox::new();
        mailbox.publish(vec![1.0]);
        mailbox.publish(vec![2.0]);

        // Newer sample replaces the unconsumed older one
        assert_eq!(mailbox.drain(), Some(vec![2.0]));
        assert_eq!(mailbox.drain(), None);
    }

    #[test]
    fn test_command_queue_fifo() {
        let (tx, rx) = command_queue();
        tx.send(">a".to_string()).unwrap();
        tx.send(">b".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ">a");
        assert_eq!(rx.try_recv().unwrap(), ">b");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_shutdown_idempotent() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());
        assert!(!shutdown.is_fault());

        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        assert!(!shutdown.is_fault());

        // A later fault is still recorded; the flag never resets
        let clone = shutdown.clone();
        clone.fail();
        assert!(shutdown.is_triggered());
        assert!(shutdown.is_fault());
    }
}
