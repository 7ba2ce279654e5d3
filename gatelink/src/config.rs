//! Adapter configuration

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use gatelink_core::{checksum, Crc32, SharedChecksum};
use gatelink_dispatch::{DispatcherBuilder, DEFAULT_MAX_IN_FLIGHT};

use crate::error::{Error, Result};

/// Environment variable overriding the tolerated device clock skew, in seconds
pub const ENV_MAX_CLOCK_SKEW_SECS: &str = "GATELINK_MAX_CLOCK_SKEW_SECS";

/// Environment variable overriding the dispatch in-flight bound
pub const ENV_MAX_IN_FLIGHT: &str = "GATELINK_MAX_IN_FLIGHT";

/// Environment variable selecting the trailer checksum (`crc32`, `ones-complement`)
pub const ENV_CHECKSUM: &str = "GATELINK_CHECKSUM";

/// Tunables shared by an adapter's codec, validator and dispatcher
#[derive(Clone)]
pub struct AdapterConfig {
    max_clock_skew: Duration,
    max_in_flight: usize,
    checksum: SharedChecksum,
}

impl AdapterConfig {
    pub fn new() -> Self {
        Self {
            max_clock_skew: Duration::from_secs(5 * 60),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            checksum: Arc::new(Crc32),
        }
    }

    /// Set the tolerated difference between device and server clocks
    pub fn with_max_clock_skew(mut self, skew: Duration) -> Self {
        self.max_clock_skew = skew;
        self
    }

    /// Set the number of business handlers allowed to run at once
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Set the trailer checksum algorithm
    pub fn with_checksum(mut self, checksum: SharedChecksum) -> Self {
        self.checksum = checksum;
        self
    }

    /// Defaults overridden by `GATELINK_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(value) = lookup(ENV_MAX_CLOCK_SKEW_SECS) {
            let secs: u64 = value.trim().parse().map_err(|_| {
                Error::Config(format!("{ENV_MAX_CLOCK_SKEW_SECS}={value} is not a number of seconds"))
            })?;
            config.max_clock_skew = Duration::from_secs(secs);
        }

        if let Some(value) = lookup(ENV_MAX_IN_FLIGHT) {
            let max: usize = value
                .trim()
                .parse()
                .ok()
                .filter(|&n| n > 0)
                .ok_or_else(|| {
                    Error::Config(format!("{ENV_MAX_IN_FLIGHT}={value} must be a positive integer"))
                })?;
            config.max_in_flight = max;
        }

        if let Some(value) = lookup(ENV_CHECKSUM) {
            config.checksum = checksum::by_name(value.trim()).ok_or_else(|| {
                Error::Config(format!("{ENV_CHECKSUM}={value} names no known checksum"))
            })?;
        }

        debug!(config = ?config, "Loaded adapter configuration");
        Ok(config)
    }

    pub fn max_clock_skew(&self) -> Duration {
        self.max_clock_skew
    }

    /// Clock skew in milliseconds, saturating
    pub fn max_clock_skew_ms(&self) -> i64 {
        i64::try_from(self.max_clock_skew.as_millis()).unwrap_or(i64::MAX)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    pub fn checksum(&self) -> &SharedChecksum {
        &self.checksum
    }

    /// Dispatcher builder carrying this configuration's in-flight bound
    pub fn dispatcher_builder(&self) -> DispatcherBuilder {
        DispatcherBuilder::new().max_in_flight(self.max_in_flight)
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("max_clock_skew", &self.max_clock_skew)
            .field("max_in_flight", &self.max_in_flight)
            .field("checksum", &self.checksum.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.max_clock_skew_ms(), 300_000);
        assert_eq!(config.max_in_flight(), DEFAULT_MAX_IN_FLIGHT);
        assert_eq!(config.checksum().name(), "crc32");
    }

    #[test]
    fn test_overrides() {
        let config = AdapterConfig::from_lookup(lookup(&[
            (ENV_MAX_CLOCK_SKEW_SECS, "90"),
            (ENV_MAX_IN_FLIGHT, " 8 "),
            (ENV_CHECKSUM, "ones-complement"),
        ]))
        .unwrap();

        assert_eq!(config.max_clock_skew(), Duration::from_secs(90));
        assert_eq!(config.max_in_flight(), 8);
        assert_eq!(config.checksum().name(), "ones-complement");
    }

    #[test]
    fn test_rejects_bad_values() {
        for vars in [
            [(ENV_MAX_CLOCK_SKEW_SECS, "soon")],
            [(ENV_MAX_IN_FLIGHT, "0")],
            [(ENV_CHECKSUM, "md5")],
        ] {
            let result = AdapterConfig::from_lookup(lookup(&vars));
            assert!(matches!(result, Err(Error::Config(_))), "{vars:?} should be rejected");
        }
    }

    #[test]
    fn test_builders() {
        let config = AdapterConfig::new()
            .with_max_clock_skew(Duration::from_secs(10))
            .with_max_in_flight(3);
        assert_eq!(config.max_clock_skew_ms(), 10_000);
        assert_eq!(config.max_in_flight(), 3);
    }
}
