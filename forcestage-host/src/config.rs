//! Host configuration
//!
//! Loaded from a TOML file; every section and field is optional and falls
//! back to the bench setup the stage was built for.
//!
//! ```toml
//! [controller]
//! port = "COM5"
//!
//! [gauge]
//! port = "COM6"
//! retry_window_ms = 100
//!
//! [motion]
//! press_speed = 6
//!
//! [exchange]
//! verbose = true
//! completion_timeout_ms = 60000
//!
//! [sampling]
//! force_limit_n = 20.0
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;

/// Complete host configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub controller: PortConfig,
    pub gauge: GaugeConfig,
    pub motion: MotionConfig,
    pub exchange: ExchangeConfig,
    pub sampling: SamplingConfig,
}

impl HostConfig {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Serial port settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PortConfig {
    pub port: String,
    pub baud: u32,
    /// Read timeout; a read that times out yields an empty line
    pub timeout_ms: u64,
}

impl PortConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port: "COM5".to_string(),
            baud: 115_200,
            timeout_ms: 1_000,
        }
    }
}

/// Force gauge port and retry behaviour
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub port: String,
    pub baud: u32,
    pub timeout_ms: u64,
    /// How long an error reply is retried before giving up
    pub retry_window_ms: u64,
}

impl GaugeConfig {
    pub fn port_config(&self) -> PortConfig {
        PortConfig {
            port: self.port.clone(),
            baud: self.baud,
            timeout_ms: self.timeout_ms,
        }
    }

    pub fn retry_window(&self) -> Duration {
        Duration::from_millis(self.retry_window_ms)
    }
}

impl Default for GaugeConfig {
    fn default() -> Self {
        Self {
            port: "COM6".to_string(),
            baud: 115_200,
            timeout_ms: 1_000,
            retry_window_ms: 100,
        }
    }
}

/// Speeds used by the motion macros (mm/s, must be in the duty table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub press_speed: u16,
    pub travel_speed: u16,
    pub homing_speed: u16,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            press_speed: 6,
            travel_speed: 10,
            homing_speed: 10,
        }
    }
}

/// Request/reply behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Log every diagnostic line at info level
    pub verbose: bool,
    /// Give up waiting for the sentinel after this long
    pub completion_timeout_ms: Option<u64>,
}

impl ExchangeConfig {
    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }
}

/// Limits of a retreat-and-sample run
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Stop the motor once the force magnitude exceeds this
    pub force_limit_n: f64,
    /// Readings at or below this count as no contact
    pub force_buffer_n: f64,
    /// Stop after this long without contact once contact was made
    pub no_force_limit_s: f64,
    pub max_samples: usize,
    /// Distance to retreat
    pub travel_mm: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            force_limit_n: 20.0,
            force_buffer_n: 0.02,
            no_force_limit_s: 5.0,
            max_samples: 10_000,
            travel_mm: 50.0,
        }
    }
}
