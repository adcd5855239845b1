use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Allocator configuration.
///
/// Loaded once at startup and immutable for the process lifetime. The
/// defaults reproduce the reference simulation: a pool of
/// 192.168.1.100-192.168.1.200, 600 second leases, and a sweep every second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// First address of the contiguous pool range (inclusive).
    pub pool_start: Ipv4Addr,

    /// Last address of the contiguous pool range (inclusive).
    pub pool_end: Ipv4Addr,

    /// How long an allocated lease lives before it expires.
    pub lease_duration_seconds: u32,

    /// Cadence of the background expiry sweep.
    pub sweep_interval_seconds: u64,

    /// Path of the append-only audit log.
    pub audit_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pool_start: Ipv4Addr::new(192, 168, 1, 100),
            pool_end: Ipv4Addr::new(192, 168, 1, 200),
            lease_duration_seconds: 600,
            sweep_interval_seconds: 1,
            audit_log: "dhcp_audit.log".to_string(),
        }
    }
}

impl Config {
    /// Loads the configuration from a JSON file, creating the file with
    /// default values if it does not exist.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Writes the configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks the configuration for internally inconsistent values.
    pub fn validate(&self) -> Result<()> {
        let start = u32::from(self.pool_start);
        let end = u32::from(self.pool_end);

        if start > end {
            return Err(Error::InvalidConfig(
                "pool_start must be less than or equal to pool_end".to_string(),
            ));
        }

        if self.lease_duration_seconds == 0 {
            return Err(Error::InvalidConfig(
                "lease_duration_seconds must be greater than 0".to_string(),
            ));
        }

        if self.sweep_interval_seconds == 0 {
            return Err(Error::InvalidConfig(
                "sweep_interval_seconds must be greater than 0".to_string(),
            ));
        }

        if self.audit_log.is_empty() {
            return Err(Error::InvalidConfig(
                "audit_log must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns true if the address falls within the configured pool range.
    pub fn ip_in_pool(&self, ip: Ipv4Addr) -> bool {
        let addr = u32::from(ip);
        let start = u32::from(self.pool_start);
        let end = u32::from(self.pool_end);
        addr >= start && addr <= end
    }

    /// Total number of addresses in the pool.
    pub fn pool_size(&self) -> u32 {
        u32::from(self.pool_end) - u32::from(self.pool_start) + 1
    }

    /// Sweep cadence as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_start_greater_than_end() {
        let config = Config {
            pool_start: Ipv4Addr::new(192, 168, 1, 200),
            pool_end: Ipv4Addr::new(192, 168, 1, 100),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_lease_duration() {
        let config = Config {
            lease_duration_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sweep_interval() {
        let config = Config {
            sweep_interval_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ip_in_pool() {
        let config = Config::default();
        assert!(config.ip_in_pool(Ipv4Addr::new(192, 168, 1, 150)));
        assert!(!config.ip_in_pool(Ipv4Addr::new(192, 168, 1, 50)));
        assert!(!config.ip_in_pool(Ipv4Addr::new(192, 168, 1, 250)));
    }

    #[test]
    fn test_pool_size() {
        let config = Config::default();
        assert_eq!(config.pool_size(), 101);
    }

    #[test]
    fn test_single_address_pool() {
        let config = Config {
            pool_start: Ipv4Addr::new(10, 0, 0, 1),
            pool_end: Ipv4Addr::new(10, 0, 0, 1),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.pool_size(), 1);
    }
}
