//! Configuration for the HIL bridge
//!
//! Loads configuration from a TOML file. On first run, when the file does
//! not exist yet, the defaults are written to that path so an editable
//! template is left behind.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub serial: SerialConfig,
    pub network: NetworkConfig,
    pub hil: HilConfig,
    pub console: ConsoleConfig,
}

/// Serial link to the hardware target
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Serial port path (e.g., "/dev/ttyUSB0" or "COM3")
    pub port: String,
    /// Baud rate (e.g., 115200)
    pub baud_rate: u32,
}

/// UDP link to the simulation host
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// Local port the bridge listens on for host datagrams
    pub listen_port: u16,
    /// Simulation host address
    pub remote_host: String,
    /// Port the simulation host listens on
    pub remote_port: u16,
}

/// Sample arities, fixed for the lifetime of a run
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HilConfig {
    /// Values per sample, host -> target
    pub values_to_target: usize,
    /// Values per sample, target -> host
    pub values_from_target: usize,
}

/// Operator console settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    /// Exact (case-sensitive) line that ends the run
    pub quit_token: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("{}: {}", path.as_ref().display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, writing the defaults first if the file is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            log::info!("Loading config from {}", path.as_ref().display());
            Self::from_file(path)
        } else {
            log::info!(
                "Config file not found, creating default at {}",
                path.as_ref().display()
            );
            let config = Self::default();
            config.to_file(path)?;
            Ok(config)
        }
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(e.to_string()))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the bridge cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.hil.values_to_target == 0 || self.hil.values_from_target == 0 {
            return Err(Error::Config(
                "sample arities must be at least 1 in both directions".to_string(),
            ));
        }
        if self.console.quit_token.trim().is_empty() {
            return Err(Error::Config("quit token must not be empty".to_string()));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig {
                port: "/dev/ttyUSB0".to_string(),
                baud_rate: 115200,
            },
            network: NetworkConfig {
                listen_port: 25001,
                remote_host: "127.0.0.1".to_string(),
                remote_port: 25000,
            },
            hil: HilConfig {
                values_to_target: 1,
                values_from_target: 1,
            },
            console: ConsoleConfig {
                quit_token: "quit".to_string(),
            },
        }
    }
}
