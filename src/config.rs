use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use tracing_subscriber::EnvFilter;

use crate::cpu::CpuConfig;

/// Log level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LOG: &str = "warn";

/// Subscriber filter from a `RUST_LOG`-style directive string, or
/// [`DEFAULT_LOG`] without one.
pub fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

/// Settings for one simulation run. Missing JSON keys take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub cpu: CpuConfig,
    /// First address of the reserved region printed after the trace.
    pub dump_base: u32,
    /// Number of words in the reserved region.
    pub dump_words: u32,
    /// Stop after this many steps. Unbounded when `None`.
    pub max_steps: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            cpu: CpuConfig::default(),
            dump_base: 0x0001_0000,
            dump_words: 32,
            max_steps: None,
        }
    }
}

impl SimConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}
