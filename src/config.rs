use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::game::constants::net;
use crate::game::game_loop::GameLoopConfig;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Address the host binds to
    pub bind_address: IpAddr,
    /// Host port (also the default port when joining)
    pub port: u16,
    /// Minimum spacing between host snapshots
    pub snapshot_interval_ms: u64,
    /// Host treats remote input older than this as released
    pub input_stale_ms: u64,
    /// Fixed RNG seed for reproducible layouts
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: net::DEFAULT_PORT,
            snapshot_interval_ms: net::SNAPSHOT_INTERVAL_MS,
            input_stale_ms: net::INPUT_STALE_MS,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                config.bind_address = parsed;
            } else {
                tracing::warn!("Invalid BIND_ADDRESS '{}', using default", addr);
            }
        }

        if let Ok(port) = std::env::var("PORT") {
            if let Ok(parsed) = port.parse::<u16>() {
                if parsed > 0 {
                    config.port = parsed;
                } else {
                    tracing::warn!("PORT must be > 0, using default");
                }
            } else {
                tracing::warn!("Invalid PORT '{}', using default", port);
            }
        }

        if let Ok(interval) = std::env::var("SNAPSHOT_INTERVAL_MS") {
            match interval.parse::<u64>() {
                Ok(parsed) if (1..=1000).contains(&parsed) => config.snapshot_interval_ms = parsed,
                Ok(_) => tracing::warn!("SNAPSHOT_INTERVAL_MS must be 1-1000, using default"),
                Err(_) => tracing::warn!("Invalid SNAPSHOT_INTERVAL_MS '{}', using default", interval),
            }
        }

        if let Ok(stale) = std::env::var("INPUT_STALE_MS") {
            match stale.parse::<u64>() {
                Ok(parsed) if parsed > 0 => config.input_stale_ms = parsed,
                Ok(_) => tracing::warn!("INPUT_STALE_MS must be > 0, using default"),
                Err(_) => tracing::warn!("Invalid INPUT_STALE_MS '{}', using default", stale),
            }
        }

        if let Ok(seed) = std::env::var("GAME_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.seed = Some(parsed);
            } else {
                tracing::warn!("Invalid GAME_SEED '{}', ignoring", seed);
            }
        }

        config
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("Port cannot be 0".to_string());
        }
        if self.snapshot_interval_ms == 0 {
            return Err("snapshot_interval_ms must be at least 1".to_string());
        }
        if self.input_stale_ms < self.snapshot_interval_ms {
            return Err("input_stale_ms cannot be shorter than snapshot_interval_ms".to_string());
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn loop_config(&self) -> GameLoopConfig {
        GameLoopConfig {
            seed: self.seed,
            snapshot_interval_ms: self.snapshot_interval_ms,
            input_stale_ms: self.input_stale_ms,
        }
    }
}
