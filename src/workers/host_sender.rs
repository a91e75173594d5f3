//! UDP send worker: uplink mailbox to the simulation host

use crate::error::Result;
use crate::exchange::{Mailbox, Shutdown};
use crate::wire::encode_datagram;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::time::Duration;

/// Forwards the freshest target-origin sample to the simulation host as one
/// best-effort datagram per sample. No acknowledgment, no retry.
pub struct HostSender {
    socket: Arc<UdpSocket>,
    uplink: Arc<Mailbox>,
    host_addr: SocketAddr,
    shutdown: Shutdown,
}

impl HostSender {
    pub fn new(
        socket: Arc<UdpSocket>,
        uplink: Arc<Mailbox>,
        host_addr: SocketAddr,
        shutdown: Shutdown,
    ) -> Self {
        HostSender {
            socket,
            uplink,
            host_addr,
            shutdown,
        }
    }

    /// Run the send loop until shutdown or a send error.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("host sender started (sending to {})", self.host_addr);

        while !self.shutdown.is_triggered() {
            match self.uplink.drain() {
                Some(sample) => {
                    let payload = encode_datagram(&sample);
                    self.socket.send_to(&payload, self.host_addr)?;
                    log::trace!("sent {} byte datagram to host", payload.len());
                    std::thread::sleep(Duration::from_micros(500));
                }
                // Nothing fresh this tick
                None => std::thread::sleep(Duration::from_millis(1)),
            }
        }

        log::debug!("host sender stopped");
        Ok(())
    }
}
