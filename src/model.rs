//! Core data model: devices, VLAN records, per-device results.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::vendor::VendorFamily;

/// A network device targeted by a run.
///
/// Identity and connection attributes come from the inventory; the vendor
/// family is resolved once from the free-text vendor/model/device-type
/// fields when the inventory is loaded. Immutable for the duration of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub hostname: String,

    /// Management address used for the SSH connection.
    #[serde(default)]
    pub ip_address: String,

    #[serde(default)]
    pub vendor: String,

    #[serde(default)]
    pub device_type: String,

    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub version: String,

    /// Per-device private key override for key-based authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key_file: Option<PathBuf>,

    /// Resolved vendor family. Not part of the inventory file; assigned by
    /// [`VendorFamily::resolve`] at load time.
    #[serde(skip, default)]
    pub family: VendorFamily,
}

impl Device {
    /// Resolve and store the vendor family from the free-text fields.
    pub fn resolve_family(&mut self) {
        self.family = VendorFamily::resolve(&self.vendor, &self.model, &self.device_type);
    }
}

/// Removal-safety classification for a VLAN, driving the approval gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl RiskTier {
    /// High and critical findings require operator approval before removal.
    pub fn requires_approval(self) -> bool {
        matches!(self, RiskTier::High | RiskTier::Critical)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
            RiskTier::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// One VLAN as observed on one device.
///
/// Created by a vendor parser from one line of device output. The unused
/// verdict, removal command, and risk tier are known at construction time;
/// the record is never mutated afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VlanRecord {
    pub vlan_id: u16,
    pub name: String,
    pub status: String,

    /// Member ports (Cisco/Arista) or interfaces (Juniper).
    pub ports: Vec<String>,

    pub is_unused: bool,

    /// Vendor-correct removal command. Only present when `is_unused`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removal_command: Option<String>,

    #[serde(default)]
    pub risk: RiskTier,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<SystemTime>,
}

/// Outcome of analyzing one device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

/// Completed analysis of a single device.
///
/// Created once per device per run by the analysis pipeline and immutable
/// thereafter; the aggregator only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceResult {
    pub device: Device,
    pub total_vlans: usize,
    pub unused_vlans: Vec<VlanRecord>,
    pub removal_commands: Vec<String>,
    pub rollback_commands: Vec<String>,
    pub processing_time: Duration,
    pub status: RunStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default)]
    pub warnings: Vec<String>,
}

impl DeviceResult {
    /// Package a successful analysis. Warnings are computed by the caller
    /// before construction.
    pub fn success(
        device: Device,
        total_vlans: usize,
        unused_vlans: Vec<VlanRecord>,
        removal_commands: Vec<String>,
        rollback_commands: Vec<String>,
        processing_time: Duration,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            device,
            total_vlans,
            unused_vlans,
            removal_commands,
            rollback_commands,
            processing_time,
            status: RunStatus::Success,
            error_message: None,
            warnings,
        }
    }

    /// Package a failed analysis.
    pub fn failed(device: Device, processing_time: Duration, error_message: impl Into<String>) -> Self {
        Self {
            device,
            total_vlans: 0,
            unused_vlans: Vec::new(),
            removal_commands: Vec::new(),
            rollback_commands: Vec::new(),
            processing_time,
            status: RunStatus::Failed,
            error_message: Some(error_message.into()),
            warnings: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    pub fn unused_count(&self) -> usize {
        self.unused_vlans.len()
    }

    /// Share of this device's VLANs flagged for cleanup, in percent.
    pub fn cleanup_percentage(&self) -> f64 {
        if self.total_vlans == 0 {
            return 0.0;
        }
        self.unused_count() as f64 / self.total_vlans as f64 * 100.0
    }
}

/// Business impact snapshot derived from a completed set of device results.
///
/// Never persisted independently of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessMetrics {
    pub time_saved_minutes: f64,
    pub time_saved_hours: f64,
    pub estimated_cost_savings_usd: f64,
    pub devices_processed: usize,
    pub vlans_cleaned: usize,
    pub operational_benefits: Vec<String>,
}
