//! Per-device analysis pipeline.
//!
//! Connect -> list -> classify -> generate commands -> package a result.
//! Every failure below this boundary becomes data: a `Failed` result with
//! a human-readable message. Nothing raises past the pipeline.

use std::time::Instant;

use log::{error, info, warn};

use crate::config::AnalysisSettings;
use crate::error::Result;
use crate::model::{Device, DeviceResult, VlanRecord};
use crate::transport::{Connector, DeviceSession};

/// Analyze a single device, always producing a result.
///
/// Processing time is measured wall-clock from entry to result
/// construction regardless of outcome, and the session is released before
/// returning on every path.
pub async fn analyze_device(
    connector: &dyn Connector,
    device: Device,
    analysis: &AnalysisSettings,
) -> DeviceResult {
    let started = Instant::now();

    let Some(mut session) = connector.connect(&device).await else {
        return DeviceResult::failed(device, started.elapsed(), "Failed to connect to device");
    };

    let outcome = collect(session.as_mut(), &device, analysis).await;

    if let Err(e) = session.close().await {
        warn!("Error releasing session for {}: {e}", device.hostname);
    }

    match outcome {
        Ok(analysis) => {
            info!(
                "Successfully processed {}: {} unused VLANs found",
                device.hostname,
                analysis.unused_vlans.len()
            );
            DeviceResult::success(
                device,
                analysis.total_vlans,
                analysis.unused_vlans,
                analysis.removal_commands,
                analysis.rollback_commands,
                started.elapsed(),
                analysis.warnings,
            )
        }
        Err(e) => {
            error!("Error processing device {}: {e}", device.hostname);
            DeviceResult::failed(device, started.elapsed(), e.to_string())
        }
    }
}

/// Everything a successful analysis produces, computed before the result
/// record is constructed.
struct DeviceAnalysis {
    total_vlans: usize,
    unused_vlans: Vec<VlanRecord>,
    removal_commands: Vec<String>,
    rollback_commands: Vec<String>,
    warnings: Vec<String>,
}

async fn collect(
    session: &mut dyn DeviceSession,
    device: &Device,
    analysis: &AnalysisSettings,
) -> Result<DeviceAnalysis> {
    let all_vlans = device.family.list_vlans(session, analysis).await?;
    let total_vlans = all_vlans.len();

    let unused_vlans: Vec<VlanRecord> =
        all_vlans.into_iter().filter(|vlan| vlan.is_unused).collect();

    let removal_commands: Vec<String> = unused_vlans
        .iter()
        .filter_map(|vlan| vlan.removal_command.clone())
        .collect();

    let rollback_commands = device.family.rollback_commands(&unused_vlans);

    let warnings: Vec<String> = unused_vlans
        .iter()
        .filter(|vlan| vlan.risk.requires_approval())
        .map(|vlan| {
            format!(
                "VLAN {} ({}) is marked as {} risk",
                vlan.vlan_id, vlan.name, vlan.risk
            )
        })
        .collect();

    Ok(DeviceAnalysis {
        total_vlans,
        unused_vlans,
        removal_commands,
        rollback_commands,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RiskTier, RunStatus};
    use crate::transport::testing::{ScriptedConnector, ScriptedSession};
    use crate::vendor::VendorFamily;

    fn device(hostname: &str, family: VendorFamily) -> Device {
        Device {
            hostname: hostname.to_string(),
            ip_address: "192.168.1.10".to_string(),
            vendor: family.label().to_string(),
            device_type: family.label().to_string(),
            model: String::new(),
            version: String::new(),
            ssh_key_file: None,
            family,
        }
    }

    const CISCO_TABLE: &str = "\
VLAN Name                             Status    Ports
---- -------------------------------- --------- -------------------------------
1    default                          active    Gi0/1, Gi0/2
5    management                       active
100  unused-vlan                      active
200  test-vlan                        active    Gi0/4
";

    #[tokio::test]
    async fn successful_analysis_packages_everything() {
        let connector = ScriptedConnector::new();
        let session = ScriptedSession::new().respond("show vlan brief", CISCO_TABLE);
        let probes = session.probes();
        connector.queue("sw1", session).await;

        let result = analyze_device(
            &connector,
            device("sw1", VendorFamily::CiscoIos),
            &AnalysisSettings::default(),
        )
        .await;

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.total_vlans, 4);
        // VLAN 5 (management, no ports) and VLAN 100 (no ports) are unused.
        assert_eq!(result.unused_count(), 2);
        assert!(result.unused_count() <= result.total_vlans);
        assert_eq!(
            result.removal_commands,
            vec!["no vlan 5".to_string(), "no vlan 100".to_string()]
        );
        assert_eq!(
            result.rollback_commands,
            vec![
                "vlan 5".to_string(),
                " name management".to_string(),
                "vlan 100".to_string(),
                " name unused-vlan".to_string(),
            ]
        );
        assert!(probes.closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn risky_findings_are_warned_one_to_one() {
        let connector = ScriptedConnector::new();
        connector
            .queue(
                "sw1",
                ScriptedSession::new().respond("show vlan brief", CISCO_TABLE),
            )
            .await;

        let result = analyze_device(
            &connector,
            device("sw1", VendorFamily::CiscoIos),
            &AnalysisSettings::default(),
        )
        .await;

        // "management" at id 5: name match precedes the id band, so the
        // tier is critical and it must appear in the warnings.
        let vlan = result.unused_vlans.iter().find(|v| v.vlan_id == 5).unwrap();
        assert_eq!(vlan.risk, RiskTier::Critical);
        assert_eq!(
            result.warnings,
            vec!["VLAN 5 (management) is marked as critical risk".to_string()]
        );

        // Every warned VLAN corresponds to an entry in the unused list.
        for warning in &result.warnings {
            assert!(result
                .unused_vlans
                .iter()
                .any(|v| warning.contains(&format!("VLAN {} ", v.vlan_id))));
        }
    }

    #[tokio::test]
    async fn connection_failure_yields_failed_result() {
        // Nothing queued for this hostname: every attempt fails.
        let connector = ScriptedConnector::new();

        let result = analyze_device(
            &connector,
            device("unreachable", VendorFamily::CiscoIos),
            &AnalysisSettings::default(),
        )
        .await;

        assert_eq!(result.status, RunStatus::Failed);
        assert!(
            result
                .error_message
                .as_deref()
                .unwrap()
                .contains("Failed to connect")
        );
        assert!(result.unused_vlans.is_empty());
        assert_eq!(result.total_vlans, 0);
        // Wall-clock time is measured even for failures.
        assert!(result.processing_time > std::time::Duration::ZERO);
    }

    #[tokio::test]
    async fn listing_error_yields_failed_result_with_error_text() {
        let connector = ScriptedConnector::new();
        let session = ScriptedSession::new().fail_on("show vlan brief");
        let probes = session.probes();
        connector.queue("sw1", session).await;

        let result = analyze_device(
            &connector,
            device("sw1", VendorFamily::CiscoIos),
            &AnalysisSettings::default(),
        )
        .await;

        assert_eq!(result.status, RunStatus::Failed);
        assert!(result.error_message.is_some());
        // The session is released even when listing blows up.
        assert!(probes.closed.load(std::sync::atomic::Ordering::SeqCst));
    }

    #[tokio::test]
    async fn juniper_pipeline_uses_name_keyed_commands() {
        let table = "\
VLAN-lab          250
VLAN-users        100        ge-0/0/1.0
";
        let connector = ScriptedConnector::new();
        connector
            .queue("jnp1", ScriptedSession::new().respond("show vlans", table))
            .await;

        let result = analyze_device(
            &connector,
            device("jnp1", VendorFamily::JuniperJunos),
            &AnalysisSettings::default(),
        )
        .await;

        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(result.removal_commands, vec!["delete vlans VLAN-lab".to_string()]);
        assert_eq!(
            result.rollback_commands,
            vec!["set vlans VLAN-lab vlan-id 250".to_string()]
        );
    }
}
