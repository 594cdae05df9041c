//! Run settings: inventory, credentials, analysis policy, processing limits.
//!
//! Settings are loaded from a YAML file once per run and are immutable
//! afterwards. Validation is fatal before any device is contacted.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use log::info;
use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::model::Device;

/// VLAN ids that are never candidates for removal (VLAN 1 plus the
/// legacy FDDI/Token Ring defaults every Cisco-family switch carries).
pub const RESERVED_VLANS: [u16; 5] = [1, 1002, 1003, 1004, 1005];

/// Default critical-name keywords for risk classification.
pub const CRITICAL_VLAN_NAMES: [&str; 6] = ["management", "mgmt", "native", "default", "voice", "data"];

/// Top-level settings document.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub devices: Vec<Device>,

    #[serde(default)]
    pub authentication: AuthSettings,

    #[serde(default)]
    pub vlan_analysis: AnalysisSettings,

    #[serde(default)]
    pub processing: ProcessingSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

impl Settings {
    /// Load settings from a YAML file.
    ///
    /// Credentials missing from the file fall back to the
    /// `NETWORK_USERNAME` / `NETWORK_PASSWORD` / `NETWORK_ENABLE_PASSWORD`
    /// environment variables. Vendor families are resolved here, once.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        let settings = Self::from_yaml(&raw)?;
        info!("Settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Parse settings from a YAML string.
    pub fn from_yaml(raw: &str) -> Result<Self> {
        let mut settings: Settings = serde_yaml::from_str(raw).map_err(ConfigError::Parse)?;
        settings.authentication.apply_env_fallbacks();
        for device in &mut settings.devices {
            device.resolve_family();
        }
        Ok(settings)
    }

    /// Check the invariants a run depends on. Errors here abort the run
    /// before any device is contacted.
    pub fn validate(&self) -> Result<()> {
        if self.devices.is_empty() {
            return Err(invalid("no devices configured"));
        }
        for device in &self.devices {
            if device.hostname.is_empty() {
                return Err(invalid("device missing required field: hostname"));
            }
            if device.ip_address.is_empty() {
                return Err(invalid(format!(
                    "device '{}' missing required field: ip_address",
                    device.hostname
                )));
            }
            if device.vendor.is_empty() {
                return Err(invalid(format!(
                    "device '{}' missing required field: vendor",
                    device.hostname
                )));
            }
        }
        if self.authentication.username.is_empty() {
            return Err(invalid("no username configured"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> crate::error::Error {
    ConfigError::Invalid {
        message: message.into(),
    }
    .into()
}

/// Shared credentials for the whole fleet.
#[derive(Debug, Default, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: Option<SecretString>,

    /// Enable-mode secret for Cisco-family devices.
    #[serde(default)]
    pub enable_password: Option<SecretString>,
}

impl AuthSettings {
    fn apply_env_fallbacks(&mut self) {
        if self.username.is_empty() {
            if let Ok(user) = std::env::var("NETWORK_USERNAME") {
                self.username = user;
            }
        }
        if self.password.is_none() {
            if let Ok(password) = std::env::var("NETWORK_PASSWORD") {
                self.password = Some(SecretString::from(password));
            }
        }
        if self.enable_password.is_none() {
            if let Ok(secret) = std::env::var("NETWORK_ENABLE_PASSWORD") {
                self.enable_password = Some(SecretString::from(secret));
            }
        }
    }
}

/// VLAN-analysis policy.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// Ids excluded from removal on top of the reserved set.
    #[serde(default = "default_exclude_vlans")]
    pub exclude_vlans: BTreeSet<u16>,

    /// Minimum observed age before a VLAN is considered for cleanup.
    /// Read from the inventory policy; enforcement happens in change review.
    #[serde(default = "default_minimum_age_days")]
    pub minimum_age_days: u32,

    #[serde(default = "default_true")]
    pub require_manual_approval: bool,

    /// Case-insensitive substrings that mark a VLAN name as critical.
    #[serde(default = "default_critical_names")]
    pub critical_vlan_names: Vec<String>,
}

impl AnalysisSettings {
    /// Reserved or operator-excluded ids are never marked unused.
    pub fn is_protected(&self, vlan_id: u16) -> bool {
        RESERVED_VLANS.contains(&vlan_id) || self.exclude_vlans.contains(&vlan_id)
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            exclude_vlans: default_exclude_vlans(),
            minimum_age_days: default_minimum_age_days(),
            require_manual_approval: true,
            critical_vlan_names: default_critical_names(),
        }
    }
}

/// Connection and concurrency limits.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessingSettings {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_devices: usize,

    /// Per-device command/connect timeout, in seconds.
    #[serde(default = "default_device_timeout")]
    pub device_timeout: u64,

    #[serde(default = "default_retries")]
    pub connection_retries: u32,

    /// Delay between connection attempts, in seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
}

impl ProcessingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.device_timeout)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }
}

impl Default for ProcessingSettings {
    fn default() -> Self {
        Self {
            max_concurrent_devices: default_max_concurrent(),
            device_timeout: default_device_timeout(),
            connection_retries: default_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Report output preferences.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_file")]
    pub file: String,

    #[serde(default = "default_true")]
    pub backup_commands: bool,

    #[serde(default = "default_true")]
    pub generate_rollback: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            file: default_output_file(),
            backup_commands: true,
            generate_rollback: true,
        }
    }
}

fn default_exclude_vlans() -> BTreeSet<u16> {
    RESERVED_VLANS.into_iter().collect()
}

fn default_minimum_age_days() -> u32 {
    30
}

fn default_critical_names() -> Vec<String> {
    CRITICAL_VLAN_NAMES.iter().map(|s| s.to_string()).collect()
}

fn default_max_concurrent() -> usize {
    5
}

fn default_device_timeout() -> u64 {
    60
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

fn default_output_file() -> String {
    "vlan_cleanup_results.json".to_string()
}
