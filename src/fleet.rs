//! Fleet orchestration: bounded fan-out and the execute/rollback gate.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::config::AnalysisSettings;
use crate::error::{ExecutionError, Result};
use crate::model::{Device, DeviceResult, VlanRecord};
use crate::pipeline;
use crate::transport::Connector;

/// Runs the per-device analysis pipeline across a fleet under a bounded
/// worker pool, and optionally re-connects to execute approved removals.
pub struct FleetAnalyzer {
    connector: Arc<dyn Connector>,
    analysis: Arc<AnalysisSettings>,
    max_concurrent: usize,
    dry_run: bool,
}

impl FleetAnalyzer {
    pub fn new(
        connector: Arc<dyn Connector>,
        analysis: AnalysisSettings,
        max_concurrent: usize,
        dry_run: bool,
    ) -> Self {
        Self {
            connector,
            analysis: Arc::new(analysis),
            max_concurrent: max_concurrent.max(1),
            dry_run,
        }
    }

    /// Analyze every device, collecting results in completion order.
    ///
    /// Devices are fully independent: one device's failure never affects
    /// another's result, and a worker that dies still yields a synthesized
    /// `Failed` result for its device.
    pub async fn run(&self, devices: &[Device]) -> Vec<DeviceResult> {
        if devices.is_empty() {
            error!("No devices specified for processing");
            return Vec::new();
        }

        info!("Starting processing of {} devices", devices.len());

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();
        let mut pending: HashMap<tokio::task::Id, Device> = HashMap::new();

        for device in devices.iter().cloned() {
            let connector = Arc::clone(&self.connector);
            let analysis = Arc::clone(&self.analysis);
            let semaphore = Arc::clone(&semaphore);
            let for_map = device.clone();

            let handle = tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        return DeviceResult::failed(
                            device,
                            Duration::ZERO,
                            "worker pool shut down before device was scheduled",
                        );
                    }
                };
                pipeline::analyze_device(connector.as_ref(), device, &analysis).await
            });
            pending.insert(handle.id(), for_map);
        }

        let mut results = Vec::with_capacity(devices.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    pending.remove(&id);
                    results.push(result);
                }
                Err(join_error) => {
                    // The worker died; synthesize a failed result so the
                    // device still appears in the aggregate.
                    if let Some(device) = pending.remove(&join_error.id()) {
                        error!(
                            "Worker for {} died: {join_error}",
                            device.hostname
                        );
                        results.push(DeviceResult::failed(
                            device,
                            Duration::ZERO,
                            join_error.to_string(),
                        ));
                    }
                }
            }
        }

        info!("Completed processing {} devices", results.len());
        results
    }

    /// Execute approved removals against devices with successful results.
    ///
    /// Refused outright when the analyzer was built in dry-run mode.
    /// High/critical-risk VLANs are dropped from the remove-set unless
    /// `approve_all`. Deliberately sequential: destructive operations are
    /// throttled to one device at a time.
    pub async fn execute_approved(
        &self,
        results: &[DeviceResult],
        approve_all: bool,
    ) -> Result<ExecutionOutcome> {
        if self.dry_run {
            warn!("Cannot execute cleanup in dry-run mode");
            return Err(ExecutionError::DryRun.into());
        }
        if results.is_empty() {
            error!("No results available for cleanup execution");
            return Err(ExecutionError::NoResults.into());
        }

        info!("Starting VLAN cleanup execution");
        let mut cleanups = Vec::new();

        for result in results {
            if !result.is_success() || result.unused_vlans.is_empty() {
                continue;
            }

            let to_remove: Vec<&VlanRecord> = result
                .unused_vlans
                .iter()
                .filter(|vlan| {
                    if vlan.risk.requires_approval() && !approve_all {
                        warn!(
                            "Skipping high-risk VLAN {} on {}",
                            vlan.vlan_id, result.device.hostname
                        );
                        return false;
                    }
                    true
                })
                .collect();

            if to_remove.is_empty() {
                continue;
            }

            cleanups.push(self.cleanup_device(&result.device, &to_remove).await);
        }

        let succeeded = cleanups.iter().filter(|c| c.success).count();
        info!(
            "VLAN cleanup execution completed: {succeeded}/{} devices successful",
            cleanups.len()
        );

        Ok(ExecutionOutcome { devices: cleanups })
    }

    /// Remove the given VLANs from one device and persist its configuration.
    async fn cleanup_device(&self, device: &Device, vlans: &[&VlanRecord]) -> DeviceCleanup {
        let commands: Vec<String> = vlans
            .iter()
            .filter_map(|vlan| vlan.removal_command.clone())
            .collect();

        let Some(mut session) = self.connector.connect(device).await else {
            error!("Failed to connect to {} for cleanup", device.hostname);
            return DeviceCleanup::failed(device, "Failed to connect to device");
        };

        let applied: Result<()> = async {
            for vlan in vlans {
                info!("Removing VLAN {} from {}", vlan.vlan_id, device.hostname);
            }
            session.send_config_set(&commands).await?;
            session
                .send_command(device.family.persist_command())
                .await?;
            Ok(())
        }
        .await;

        if let Err(e) = session.close().await {
            warn!("Error releasing session for {}: {e}", device.hostname);
        }

        match applied {
            Ok(()) => {
                info!(
                    "Successfully cleaned up {} VLANs on {}",
                    commands.len(),
                    device.hostname
                );
                DeviceCleanup {
                    hostname: device.hostname.clone(),
                    vlans_removed: commands.len(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                error!("Error executing cleanup on {}: {e}", device.hostname);
                DeviceCleanup::failed(device, e.to_string())
            }
        }
    }
}

/// Per-device outcome of a cleanup execution.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceCleanup {
    pub hostname: String,
    pub vlans_removed: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceCleanup {
    fn failed(device: &Device, error: impl Into<String>) -> Self {
        Self {
            hostname: device.hostname.clone(),
            vlans_removed: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Outcome of one execution pass over the fleet.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionOutcome {
    pub devices: Vec<DeviceCleanup>,
}

impl ExecutionOutcome {
    /// True when every attempted device cleanup succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.devices.iter().all(|cleanup| cleanup.success)
    }

    pub fn succeeded_count(&self) -> usize {
        self.devices.iter().filter(|cleanup| cleanup.success).count()
    }
}
