//! Probe configuration management

use crate::policy::PolicyKind;
use crate::poll::DEFAULT_POLL_INTERVAL;
use crate::probe::ProbeTarget;
use anyhow::{Context, Result, anyhow};
use protocol::{
    AlternateSetting, EndpointNumber, INTERRUPT_BYTES_MAX, InterfaceNumber, PRODUCT_ID,
    SOC_OUT_BYTES_MAX, VENDOR_ID,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default)]
    pub probe: ProbeSettings,
    #[serde(default)]
    pub device: DeviceSettings,
    #[serde(default)]
    pub poll: PollSettings,
    #[serde(default)]
    pub reports: ReportSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    #[serde(default = "ProbeSettings::default_log_level")]
    pub log_level: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}

impl ProbeSettings {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Which device and interface the command loops talk to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Vendor ID as hex, e.g. "0x16d0"
    #[serde(default = "DeviceSettings::default_vendor_id")]
    pub vendor_id: String,
    /// Product ID as hex, e.g. "0x0f3b"
    #[serde(default = "DeviceSettings::default_product_id")]
    pub product_id: String,
    #[serde(default = "DeviceSettings::default_interface")]
    pub interface: u8,
    #[serde(default)]
    pub alternate_setting: u8,
    #[serde(default = "DeviceSettings::default_endpoint")]
    pub endpoint: u8,
    /// Maximum response size requested per read
    #[serde(default = "DeviceSettings::default_read_size")]
    pub read_size: usize,
    /// Transfer timeout in milliseconds (0 = wait indefinitely)
    #[serde(default = "DeviceSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    /// Detach a bound kernel driver before claiming the interface
    #[serde(default = "DeviceSettings::default_detach")]
    pub detach_kernel_driver: bool,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            vendor_id: Self::default_vendor_id(),
            product_id: Self::default_product_id(),
            interface: Self::default_interface(),
            alternate_setting: AlternateSetting::Idle.into(),
            endpoint: Self::default_endpoint(),
            read_size: Self::default_read_size(),
            timeout_ms: Self::default_timeout_ms(),
            detach_kernel_driver: Self::default_detach(),
        }
    }
}

impl DeviceSettings {
    fn default_vendor_id() -> String {
        format!("{:#06x}", VENDOR_ID)
    }

    fn default_product_id() -> String {
        format!("{:#06x}", PRODUCT_ID)
    }

    fn default_interface() -> u8 {
        InterfaceNumber::FramerControl.into()
    }

    fn default_endpoint() -> u8 {
        EndpointNumber::FramerControl.into()
    }

    fn default_read_size() -> usize {
        SOC_OUT_BYTES_MAX
    }

    fn default_timeout_ms() -> u64 {
        1000
    }

    fn default_detach() -> bool {
        true
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollSettings {
    /// Sleep between iterations in milliseconds
    #[serde(default = "PollSettings::default_interval_ms")]
    pub interval_ms: u64,
    #[serde(default)]
    pub policy: PolicyKind,
    /// Stop after this many iterations (None = run until killed)
    #[serde(default)]
    pub max_iterations: Option<u64>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_ms: Self::default_interval_ms(),
            policy: PolicyKind::default(),
            max_iterations: None,
        }
    }
}

impl PollSettings {
    fn default_interval_ms() -> u64 {
        DEFAULT_POLL_INTERVAL.as_millis() as u64
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Interrupt report monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "ReportSettings::default_interface")]
    pub interface: u8,
    #[serde(default = "ReportSettings::default_endpoint")]
    pub endpoint: u8,
    #[serde(default = "ReportSettings::default_read_size")]
    pub read_size: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            interface: Self::default_interface(),
            endpoint: Self::default_endpoint(),
            read_size: Self::default_read_size(),
        }
    }
}

impl ReportSettings {
    fn default_interface() -> u8 {
        InterfaceNumber::Interrupt.into()
    }

    fn default_endpoint() -> u8 {
        EndpointNumber::Interrupt.into()
    }

    fn default_read_size() -> usize {
        INTERRUPT_BYTES_MAX
    }
}

impl ProbeConfig {
    /// Load configuration from the specified path
    pub fn load(path: &Path) -> Result<Self> {
        let config_path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref());

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load the first candidate file that exists
    ///
    /// Returns `Ok(None)` when none exists. A file that exists but fails to
    /// read or validate is an error, not a fallback to the next candidate.
    pub fn load_first<I>(candidates: I) -> Result<Option<Self>>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        match candidates.into_iter().find(|p| p.exists()) {
            Some(path) => Self::load(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Standard lookup locations, in order
    pub fn candidate_paths() -> Vec<PathBuf> {
        vec![
            Self::default_path(),
            PathBuf::from("/etc/tedium-probe/probe.toml"),
        ]
    }

    /// Load from the standard locations, or use defaults if none exists
    pub fn load_or_default() -> Result<Self> {
        match Self::load_first(Self::candidate_paths())? {
            Some(config) => Ok(config),
            None => {
                tracing::debug!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Parse and validate TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: ProbeConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("tedium-probe").join("probe.toml")
        } else {
            PathBuf::from(".config/tedium-probe/probe.toml")
        }
    }

    /// Target for the framer control loops
    pub fn target(&self) -> Result<ProbeTarget> {
        Ok(ProbeTarget {
            vendor_id: parse_hex_id(&self.device.vendor_id, "vendor_id")?,
            product_id: parse_hex_id(&self.device.product_id, "product_id")?,
            interface: self.device.interface,
            alternate_setting: self.device.alternate_setting,
            endpoint: self.device.endpoint,
            read_size: self.device.read_size,
            timeout: Duration::from_millis(self.device.timeout_ms),
        })
    }

    /// Target for the interrupt report monitor
    pub fn report_target(&self) -> Result<ProbeTarget> {
        Ok(ProbeTarget {
            interface: self.reports.interface,
            endpoint: self.reports.endpoint,
            read_size: self.reports.read_size,
            alternate_setting: AlternateSetting::Idle.into(),
            ..self.target()?
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.probe.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.probe.log_level,
                valid_levels.join(", ")
            ));
        }

        parse_hex_id(&self.device.vendor_id, "vendor_id")?;
        parse_hex_id(&self.device.product_id, "product_id")?;

        Self::validate_endpoint(self.device.endpoint, "device.endpoint")?;
        Self::validate_endpoint(self.reports.endpoint, "reports.endpoint")?;

        if self.device.read_size == 0 {
            return Err(anyhow!("device.read_size must be greater than 0"));
        }
        if self.reports.read_size == 0 {
            return Err(anyhow!("reports.read_size must be greater than 0"));
        }

        Ok(())
    }

    fn validate_endpoint(number: u8, name: &str) -> Result<()> {
        if !(1..=15).contains(&number) {
            return Err(anyhow!(
                "Invalid {} {}, endpoint numbers are 1-15",
                name,
                number
            ));
        }
        Ok(())
    }
}

/// Parse a hex ID (VID or PID) written as "0x1234"
pub fn parse_hex_id(id: &str, name: &str) -> Result<u16> {
    let hex_part = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| {
            anyhow!(
                "Invalid {} '{}', must start with '0x' (e.g., '0x1234')",
                name,
                id
            )
        })?;

    if hex_part.is_empty() || hex_part.len() > 4 {
        return Err(anyhow!(
            "Invalid {} '{}', hex part must be 1-4 digits",
            name,
            id
        ));
    }

    u16::from_str_radix(hex_part, 16)
        .map_err(|_| anyhow!("Invalid {} '{}', not a valid hex number", name, id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProbeConfig::default();
        assert_eq!(config.probe.log_level, "info");
        assert_eq!(config.device.vendor_id, "0x16d0");
        assert_eq!(config.device.product_id, "0x0f3b");
        assert_eq!(config.poll.interval_ms, 500);
        assert_eq!(config.poll.policy, PolicyKind::AlwaysContinue);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_target_matches_descriptor_table() {
        let target = ProbeConfig::default().target().unwrap();
        assert_eq!(target, ProbeTarget::framer_control());
    }

    #[test]
    fn test_parse_hex_id() {
        assert_eq!(parse_hex_id("0x1234", "VID").unwrap(), 0x1234);
        assert_eq!(parse_hex_id("0XABCD", "VID").unwrap(), 0xabcd);
        assert!(parse_hex_id("1234", "VID").is_err());
        assert!(parse_hex_id("0x", "VID").is_err());
        assert!(parse_hex_id("0x12345", "VID").is_err());
        assert!(parse_hex_id("0xGHIJ", "VID").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = ProbeConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed = ProbeConfig::parse(&toml_str).unwrap();

        assert_eq!(config.device.vendor_id, parsed.device.vendor_id);
        assert_eq!(config.poll.interval_ms, parsed.poll.interval_ms);
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = ProbeConfig::default();
        config.probe.log_level = "invalid".to_string();
        assert!(config.validate().is_err());

        config.probe.log_level = "debug".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_endpoint_range() {
        let mut config = ProbeConfig::default();
        config.device.endpoint = 0;
        assert!(config.validate().is_err());
        config.device.endpoint = 16;
        assert!(config.validate().is_err());
        config.device.endpoint = 15;
        assert!(config.validate().is_ok());
    }
}
