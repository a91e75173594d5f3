//! UDP receive worker: host datagrams into the downlink mailbox

use crate::error::Result;
use crate::exchange::{Mailbox, Shutdown};
use crate::wire::decode_datagram;
use std::net::UdpSocket;
use std::sync::Arc;

/// Receives fixed-size datagrams from the simulation host and publishes the
/// decoded samples for the target writer.
///
/// The socket must carry a read timeout so the loop observes shutdown within
/// one timeout interval even with no traffic.
pub struct UplinkReceiver {
    socket: Arc<UdpSocket>,
    downlink: Arc<Mailbox>,
    /// Expected float count per datagram (host -> target)
    arity: usize,
    shutdown: Shutdown,
}

impl UplinkReceiver {
    pub fn new(
        socket: Arc<UdpSocket>,
        downlink: Arc<Mailbox>,
        arity: usize,
        shutdown: Shutdown,
    ) -> Self {
        UplinkReceiver {
            socket,
            downlink,
            arity,
            shutdown,
        }
    }

    /// Run the receive loop until shutdown or a fatal condition.
    ///
    /// Strict size policy: a datagram that is not exactly `8 * arity` bytes
    /// is fatal, since the sample stream would silently desync otherwise.
    pub fn run(&mut self) -> Result<()> {
        log::debug!("uplink receiver started");
        let expected = 8 * self.arity;
        // One spare byte so an oversized datagram shows up as a size
        // mismatch instead of being truncated to the expected length
        let mut buffer = vec![0u8; expected + 1];

        while !self.shutdown.is_triggered() {
            match self.socket.recv_from(&mut buffer) {
                Ok((n, _)) => {
                    let sample = decode_datagram(&buffer[..n], self.arity)?;
                    self.downlink.publish(sample);
                }
                // No datagram within the timeout window: normal tick
                Err(e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }

        log::debug!("uplink receiver stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback_pair() -> (Arc<UdpSocket>, UdpSocket) {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(Duration::from_millis(10)))
            .unwrap();
        let sender = UdpSocket::bind("127.0.0.1:0").unwrap();
        sender.connect(receiver.local_addr().unwrap()).unwrap();
        (Arc::new(receiver), sender)
    }

    #[test]
    fn test_publishes_decoded_datagram() {
        let (socket, sender) = loopback_pair();
        let downlink = Arc::new(Mailbox::new());
        let shutdown = Shutdown::new();
        let mut worker =
            UplinkReceiver::new(socket, Arc::clone(&downlink), 1, shutdown.clone());

        sender.send(&3.5f64.to_le_bytes()).unwrap();
        let handle = std::thread::spawn(move || worker.run());

        let mut sample = None;
        for _ in 0..200 {
            sample = downlink.drain();
            if sample.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        shutdown.trigger();
        handle.join().unwrap().unwrap();

        assert_eq!(sample, Some(vec![3.5]));
    }

    #[test]
    fn test_wrong_size_datagram_is_fatal() {
        let (socket, sender) = loopback_pair();
        let downlink = Arc::new(Mailbox::new());
        let mut worker =
            UplinkReceiver::new(socket, Arc::clone(&downlink), 1, Shutdown::new());

        // 7 bytes instead of 8: one byte short of one double
        sender.send(&[0u8; 7]).unwrap();
        assert!(worker.run().is_err());
        assert_eq!(downlink.drain(), None);
    }
}
