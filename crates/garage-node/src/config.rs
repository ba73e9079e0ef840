//! Node configuration, read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::anyhow;
use garage_engine::EngineConfig;
use garage_flows::SimulatedBackendConfig;

/// Configuration of the garage node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Address the HTTP server binds to.
    pub addr: SocketAddr,

    /// Engine settings shared by every wizard.
    pub engine: EngineConfig,

    /// Settings for the simulated backend.
    pub backend: SimulatedBackendConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            engine: EngineConfig::default(),
            backend: SimulatedBackendConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Read `GARAGE_ADDR`, `GARAGE_COMMIT_TIMEOUT_MS` and `GARAGE_SIM_LATENCY_MS`,
    /// keeping defaults for unset variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(addr) = parse(&lookup, "GARAGE_ADDR")? {
            config.addr = addr;
        }
        if let Some(timeout) = parse(&lookup, "GARAGE_COMMIT_TIMEOUT_MS")? {
            config.engine.commit_timeout_ms = timeout;
        }
        if let Some(latency) = parse(&lookup, "GARAGE_SIM_LATENCY_MS")? {
            config.backend.latency_ms = latency;
        }

        Ok(config)
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow!("invalid {}='{}': {}", key, raw, e)),
        None => Ok(None),
    }
}
