//! Bridge supervision: handle acquisition, worker startup, and shutdown
//!
//! The supervisor owns the serial handle and both UDP sockets for the whole
//! run; workers hold shared references. Once the cancellation signal is
//! observed it joins every worker, and the handles are released exactly once
//! when the app is dropped afterwards.

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::exchange::{self, Mailbox, Shutdown};
use crate::transport::{SerialTransport, Transport};
use crate::workers::{
    CommandSource, HostSender, TargetReader, TargetWriter, UplinkReceiver, stdin_lines,
};
use crossbeam_channel::Receiver;
use log::{error, info};
use parking_lot::Mutex;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Receive timeout bounding the cancellation latency of the UDP receive loop
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// Main application structure that owns the link handles and supervises the
/// five bridge workers
pub struct BridgeApp {
    config: AppConfig,
    serial: Arc<Mutex<Box<dyn Transport>>>,
    recv_socket: Arc<UdpSocket>,
    send_socket: Arc<UdpSocket>,
    host_addr: SocketAddr,
    downlink: Arc<Mailbox>,
    uplink: Arc<Mailbox>,
    shutdown: Shutdown,
}

impl BridgeApp {
    /// Open the serial port and UDP sockets described by the configuration
    pub fn new(config: AppConfig) -> Result<Self> {
        let serial = SerialTransport::open(&config.serial.port, config.serial.baud_rate)?;
        Self::with_transport(config, Arc::new(Mutex::new(Box::new(serial))))
    }

    /// Build the bridge on an already-open transport (tests use a mock)
    pub fn with_transport(
        config: AppConfig,
        serial: Arc<Mutex<Box<dyn Transport>>>,
    ) -> Result<Self> {
        let recv_socket = UdpSocket::bind(("0.0.0.0", config.network.listen_port))?;
        recv_socket.set_read_timeout(Some(RECV_TIMEOUT))?;
        info!("Listening for host datagrams on {}", recv_socket.local_addr()?);

        // Send-only socket; the kernel picks the local port
        let send_socket = UdpSocket::bind(("0.0.0.0", 0))?;

        let host_addr = (config.network.remote_host.as_str(), config.network.remote_port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                Error::Config(format!(
                    "could not resolve host address {}:{}",
                    config.network.remote_host, config.network.remote_port
                ))
            })?;
        info!("Simulation host is {}", host_addr);

        Ok(Self {
            config,
            serial,
            recv_socket: Arc::new(recv_socket),
            send_socket: Arc::new(send_socket),
            host_addr,
            downlink: Arc::new(Mailbox::new()),
            uplink: Arc::new(Mailbox::new()),
            shutdown: Shutdown::new(),
        })
    }

    /// Local address the bridge receives host datagrams on
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(self.recv_socket.local_addr()?)
    }

    /// Run the bridge with operator input taken from stdin
    pub fn run(&mut self) -> Result<()> {
        let lines = stdin_lines()?;
        self.run_with_input(lines)
    }

    /// Run the bridge with operator input taken from the given channel
    ///
    /// Returns once every worker has been joined: `Ok` after a clean quit or
    /// interrupt, `Err(Faulted)` if any worker raised the fault flag.
    pub fn run_with_input(&mut self, input: Receiver<String>) -> Result<()> {
        info!("Starting bridge workers");
        let (cmd_tx, cmd_rx) = exchange::command_queue();

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(5);

        workers.push(self.spawn_worker("target-reader", {
            let mut worker = TargetReader::new(
                Arc::clone(&self.serial),
                Arc::clone(&self.uplink),
                self.config.hil.values_from_target,
                self.shutdown.clone(),
            );
            move || worker.run()
        })?);

        workers.push(self.spawn_worker("target-writer", {
            let mut worker = TargetWriter::new(
                Arc::clone(&self.serial),
                Arc::clone(&self.downlink),
                cmd_rx,
                self.shutdown.clone(),
            );
            move || worker.run()
        })?);

        workers.push(self.spawn_worker("uplink-receiver", {
            let mut worker = UplinkReceiver::new(
                Arc::clone(&self.recv_socket),
                Arc::clone(&self.downlink),
                self.config.hil.values_to_target,
                self.shutdown.clone(),
            );
            move || worker.run()
        })?);

        workers.push(self.spawn_worker("host-sender", {
            let mut worker = HostSender::new(
                Arc::clone(&self.send_socket),
                Arc::clone(&self.uplink),
                self.host_addr,
                self.shutdown.clone(),
            );
            move || worker.run()
        })?);

        workers.push(self.spawn_worker("command-source", {
            let mut worker = CommandSource::new(
                input,
                cmd_tx,
                self.config.console.quit_token.clone(),
                self.shutdown.clone(),
            );
            move || worker.run()
        })?);

        self.setup_signal_handler()?;

        info!(
            "Bridge running. Type commands here; {:?} ends the run.",
            self.config.console.quit_token
        );

        // Idle until any participant raises the cancellation signal
        while !self.shutdown.is_triggered() {
            thread::sleep(Duration::from_millis(100));
        }

        info!("Shutdown signal observed, joining workers...");
        for handle in workers {
            if handle.join().is_err() {
                error!("a worker panicked during the run");
                self.shutdown.fail();
            }
        }
        info!("All workers stopped");

        // The serial handle and both sockets are released when the app is
        // dropped, after every worker has been joined
        if self.shutdown.is_fault() {
            Err(Error::Faulted)
        } else {
            Ok(())
        }
    }

    /// Spawn one worker on a named thread; a fatal error inside the worker
    /// is reported and converted into a fault-triggered shutdown
    fn spawn_worker(
        &self,
        name: &str,
        work: impl FnOnce() -> Result<()> + Send + 'static,
    ) -> Result<JoinHandle<()>> {
        let shutdown = self.shutdown.clone();
        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                if let Err(e) = work() {
                    error!("{}: {}", thread_name, e);
                    shutdown.fail();
                }
            })?;
        Ok(handle)
    }

    /// Setup signal handler so SIGINT/SIGTERM behave like the quit directive
    fn setup_signal_handler(&self) -> Result<()> {
        let shutdown = self.shutdown.clone();

        thread::Builder::new()
            .name("signal-handler".to_string())
            .spawn(move || {
                let mut signals = match Signals::new([SIGINT, SIGTERM]) {
                    Ok(signals) => signals,
                    Err(e) => {
                        error!("Failed to register signal handlers: {}", e);
                        shutdown.fail();
                        return;
                    }
                };

                if let Some(sig) = signals.forever().next() {
                    info!("Received signal {:?}, initiating shutdown...", sig);
                    shutdown.trigger();
                }
            })?;

        Ok(())
    }
}
