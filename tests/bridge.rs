//! Full-bridge integration tests over a mock serial transport and loopback
//! UDP sockets

use crossbeam_channel::Sender;
use hil_bridge::app::BridgeApp;
use hil_bridge::config::AppConfig;
use hil_bridge::error::Error;
use hil_bridge::transport::{MockTransport, Transport};
use parking_lot::Mutex;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

struct TestBridge {
    mock: MockTransport,
    host: UdpSocket,
    bridge_addr: SocketAddr,
    input: Sender<String>,
    handle: JoinHandle<hil_bridge::Result<()>>,
}

impl TestBridge {
    /// Send a raw datagram to the bridge's listen port
    fn send_to_bridge(&self, payload: &[u8]) {
        self.host.send_to(payload, self.bridge_addr).unwrap();
    }
}

/// Start a bridge on a mock serial port, talking to a loopback "host" socket
fn start_bridge(values_to_target: usize, values_from_target: usize) -> TestBridge {
    let host = UdpSocket::bind("127.0.0.1:0").unwrap();
    host.set_read_timeout(Some(Duration::from_secs(5))).unwrap();

    let mut config = AppConfig::default();
    config.network.listen_port = 0; // kernel-assigned, read back below
    config.network.remote_host = "127.0.0.1".to_string();
    config.network.remote_port = host.local_addr().unwrap().port();
    config.hil.values_to_target = values_to_target;
    config.hil.values_from_target = values_from_target;

    let mock = MockTransport::new();
    let transport: Arc<Mutex<Box<dyn Transport>>> =
        Arc::new(Mutex::new(Box::new(mock.clone())));
    let mut app = BridgeApp::with_transport(config, transport).unwrap();

    // The bridge replies from a separate send-only socket, so the host
    // socket must stay unconnected to receive those datagrams
    let mut bridge_addr = app.listen_addr().unwrap();
    bridge_addr.set_ip("127.0.0.1".parse().unwrap());

    let (input, input_rx) = crossbeam_channel::unbounded();
    let handle = std::thread::spawn(move || app.run_with_input(input_rx));

    TestBridge {
        mock,
        host,
        bridge_addr,
        input,
        handle,
    }
}

fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn test_end_to_end_exchange_and_clean_quit() {
    let bridge = start_bridge(1, 2);

    // Host -> target: one 8-byte datagram decoding to 3.5 must reach the
    // serial side as "#3.5\r"
    bridge.send_to_bridge(&3.5f64.to_le_bytes());
    assert!(wait_until(Duration::from_secs(5), || {
        bridge.mock.get_written() == b"#3.5\r"
    }));

    // Target -> host: "#1.0 2.0\n" must arrive as a 16-byte datagram
    bridge.mock.inject_read(b"#1.0 2.0\n");
    let mut buffer = [0u8; 64];
    let (n, _) = bridge.host.recv_from(&mut buffer).unwrap();
    assert_eq!(n, 16);
    assert_eq!(&buffer[..8], &1.0f64.to_le_bytes());
    assert_eq!(&buffer[8..16], &2.0f64.to_le_bytes());

    // Commands: ">RESET" is forwarded with a '\r', "status" is dropped
    bridge.mock.clear_written();
    bridge.input.send(">RESET".to_string()).unwrap();
    assert!(wait_until(Duration::from_secs(5), || {
        bridge.mock.get_written() == b">RESET\r"
    }));
    bridge.input.send("status".to_string()).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(bridge.mock.get_written(), b">RESET\r".to_vec());

    // Quit directive ends the run cleanly
    bridge.input.send("quit".to_string()).unwrap();
    let result = bridge.handle.join().unwrap();
    assert!(result.is_ok());
}

#[test]
fn test_log_lines_do_not_reach_the_host() {
    let bridge = start_bridge(1, 1);

    bridge.mock.inject_read(b"boot complete\n#4.25\n");
    let mut buffer = [0u8; 64];
    let (n, _) = bridge.host.recv_from(&mut buffer).unwrap();

    // Only the data frame is forwarded; the log line went to the operator
    assert_eq!(n, 8);
    assert_eq!(&buffer[..8], &4.25f64.to_le_bytes());

    bridge.input.send("quit".to_string()).unwrap();
    assert!(bridge.handle.join().unwrap().is_ok());
}

#[test]
fn test_wrong_size_datagram_faults_the_run() {
    let bridge = start_bridge(1, 1);

    // One byte short of a single double: fatal under the strict policy
    bridge.send_to_bridge(&[0u8; 7]);

    let result = bridge.handle.join().unwrap();
    assert!(matches!(result, Err(Error::Faulted)));
    // Nothing was forwarded to the target
    assert!(bridge.mock.get_written().is_empty());
}

#[test]
fn test_target_arity_mismatch_faults_the_run() {
    let bridge = start_bridge(1, 3);

    bridge.mock.inject_read(b"#1.0 2.0\n");

    let result = bridge.handle.join().unwrap();
    assert!(matches!(result, Err(Error::Faulted)));

    // No datagram was sent for the malformed frame
    bridge
        .host
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buffer = [0u8; 64];
    assert!(bridge.host.recv_from(&mut buffer).is_err());
}

#[test]
fn test_overwrite_keeps_only_the_latest_sample() {
    let bridge = start_bridge(2, 1);

    // Two datagrams in quick succession; the writer may skip the first but
    // must eventually write the second
    let mut first = Vec::new();
    first.extend_from_slice(&1.0f64.to_le_bytes());
    first.extend_from_slice(&2.0f64.to_le_bytes());
    let mut second = Vec::new();
    second.extend_from_slice(&3.0f64.to_le_bytes());
    second.extend_from_slice(&4.0f64.to_le_bytes());

    bridge.send_to_bridge(&first);
    bridge.send_to_bridge(&second);

    assert!(wait_until(Duration::from_secs(5), || {
        let written = String::from_utf8(bridge.mock.get_written()).unwrap();
        written.ends_with("#3 4\r")
    }));

    bridge.input.send("quit".to_string()).unwrap();
    assert!(bridge.handle.join().unwrap().is_ok());
}
