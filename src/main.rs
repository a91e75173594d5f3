//! hil-bridge - Serial/UDP bridge daemon for hardware-in-the-loop runs
//!
//! Serial side: newline-delimited text from the target; `#` lines carry
//! sample vectors, everything else is echoed to the operator. UDP side:
//! headerless little-endian f64 datagrams to and from the simulation host.
//! Operator lines starting with `>` are forwarded to the target's shell.

use hil_bridge::app::BridgeApp;
use hil_bridge::config::AppConfig;
use hil_bridge::error::Result;
use std::env;

/// Default config path, created with defaults on first run
const DEFAULT_CONFIG_PATH: &str = "hilbridge.toml";

/// Parse config path from command line arguments.
///
/// Supports:
/// - `hil-bridge <path>` (positional)
/// - `hil-bridge --config <path>` (flag-based)
/// - `hil-bridge -c <path>` (short flag)
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    DEFAULT_CONFIG_PATH.to_string()
}

fn run() -> Result<()> {
    log::info!("hil-bridge v0.1.0 starting...");

    let config_path = parse_config_path();
    let config = AppConfig::load_or_create(&config_path)?;

    log::info!(
        "Target: {} at {} baud; host: {}:{} (listening on :{})",
        config.serial.port,
        config.serial.baud_rate,
        config.network.remote_host,
        config.network.remote_port,
        config.network.listen_port
    );
    log::info!(
        "Sample arities: {} host->target, {} target->host",
        config.hil.values_to_target,
        config.hil.values_from_target
    );

    let mut app = BridgeApp::new(config)?;
    let result = app.run();

    // App drop releases the serial handle and both sockets, after the run's
    // workers have all been joined
    drop(app);
    log::info!("hil-bridge stopped");
    result
}

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
