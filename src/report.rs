//! Report output: the JSON report document, a CSV summary, and the
//! console executive summary.
//!
//! This is a serialization surface only: it consumes completed results and
//! a finished [`FleetSummary`], never partial state.

use std::fmt::Write as _;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use log::info;
use serde_json::{Value, json};

use crate::aggregate::FleetSummary;
use crate::error::{ReportError, Result};
use crate::model::{DeviceResult, RunStatus};

const REPORT_VERSION: &str = "1.0";

/// Build the comprehensive report document.
pub fn build_report(results: &[DeviceResult], summary: &FleetSummary, dry_run: bool) -> Value {
    let device_summaries: Vec<Value> = results
        .iter()
        .map(|result| {
            json!({
                "hostname": result.device.hostname,
                "vendor": result.device.vendor,
                "status": result.status,
                "total_vlans": result.total_vlans,
                "unused_vlans_count": result.unused_count(),
                "processing_time": result.processing_time.as_secs_f64(),
                "warnings_count": result.warnings.len(),
                "cleanup_percentage": result.cleanup_percentage(),
            })
        })
        .collect();

    json!({
        "report_metadata": {
            "generated_at_epoch": epoch_seconds(),
            "report_version": REPORT_VERSION,
            "dry_run_mode": dry_run,
            "total_processing_time_seconds": summary.performance.total_secs,
        },
        "executive_summary": {
            "total_devices_analyzed": summary.total_devices,
            "successful_analyses": summary.successful_devices,
            "failed_analyses": summary.failed_devices,
            "total_vlans_discovered": summary.total_vlans,
            "unused_vlans_identified": summary.unused_vlans,
            "potential_cleanup_percentage": summary.cleanup_percentage,
            "average_processing_time_per_device": summary.performance.average_secs,
        },
        "risk_assessment": {
            "risk_distribution": summary.risk,
            "high_risk_vlans_requiring_approval": summary.risk.requiring_approval(),
            "safe_for_automated_cleanup": summary.risk.safe_for_automation(),
        },
        "business_impact": summary.metrics,
        "device_analysis": {
            "device_summaries": device_summaries,
            "vendor_breakdown": summary.vendor_breakdown,
            "performance_metrics": summary.performance,
        },
        "operational_recommendations": summary.recommendations,
        "detailed_findings": {
            "devices_with_most_unused_vlans": summary.top_candidates,
            "critical_warnings": critical_warnings(results),
            "configuration_issues": configuration_issues(results),
        },
        "next_steps": next_steps(summary),
        "detailed_results": results,
    })
}

/// Write the report document to `path` as pretty-printed JSON.
pub fn save_report(report: &Value, path: &Path) -> Result<()> {
    let rendered = serde_json::to_string_pretty(report).map_err(ReportError::Serialize)?;
    std::fs::write(path, rendered).map_err(|source| ReportError::WriteFailed {
        path: path.display().to_string(),
        source,
    })?;
    info!("Report saved to {}", path.display());
    Ok(())
}

/// Write the one-line-per-device CSV summary to `path`.
pub fn write_summary_csv(results: &[DeviceResult], path: &Path) -> Result<()> {
    let mut csv = String::from(
        "Hostname,Vendor,Status,Total_VLANs,Unused_VLANs,Cleanup_Percentage,Processing_Time,Warnings,Risk_High_Critical\n",
    );

    for result in results {
        let high_risk = result
            .unused_vlans
            .iter()
            .filter(|v| v.risk.requires_approval())
            .count();
        let status = match result.status {
            RunStatus::Success => "success",
            RunStatus::Failed => "failed",
        };
        let _ = writeln!(
            csv,
            "{},{},{},{},{},{:.2},{:.2},{},{}",
            result.device.hostname,
            result.device.vendor,
            status,
            result.total_vlans,
            result.unused_count(),
            result.cleanup_percentage(),
            result.processing_time.as_secs_f64(),
            result.warnings.len(),
            high_risk,
        );
    }

    std::fs::write(path, csv).map_err(|source| ReportError::WriteFailed {
        path: path.display().to_string(),
        source,
    })?;
    info!("CSV summary saved to {}", path.display());
    Ok(())
}

/// Render the executive summary block printed to the console.
pub fn render_executive_summary(summary: &FleetSummary) -> String {
    let mut out = String::new();
    let rule = "=".repeat(60);

    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "VLAN CLEANUP AUTOMATION - EXECUTIVE SUMMARY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Devices Analyzed: {}", summary.total_devices);
    let _ = writeln!(out, "Successful Analyses: {}", summary.successful_devices);
    let _ = writeln!(out, "Total VLANs Discovered: {}", summary.total_vlans);
    let _ = writeln!(out, "Unused VLANs Identified: {}", summary.unused_vlans);
    let _ = writeln!(out, "Potential Cleanup: {}%", summary.cleanup_percentage);
    let _ = writeln!(out);
    let _ = writeln!(out, "BUSINESS IMPACT:");
    let _ = writeln!(out, "Time Saved: {} hours", summary.metrics.time_saved_hours);
    let _ = writeln!(
        out,
        "Cost Savings: ${}",
        summary.metrics.estimated_cost_savings_usd
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "RISK ASSESSMENT:");
    let _ = writeln!(out, "Low Risk: {} VLANs", summary.risk.low);
    let _ = writeln!(out, "Medium Risk: {} VLANs", summary.risk.medium);
    let _ = writeln!(out, "High Risk: {} VLANs", summary.risk.high);
    let _ = writeln!(out, "Critical Risk: {} VLANs", summary.risk.critical);
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Safe for Automation: {} VLANs",
        summary.risk.safe_for_automation()
    );
    let _ = writeln!(
        out,
        "Require Manual Review: {} VLANs",
        summary.risk.requiring_approval()
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Next Steps:");
    for step in next_steps(summary).iter().take(3) {
        let _ = writeln!(out, "  - {step}");
    }
    let _ = writeln!(out, "{rule}");
    out
}

fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn critical_warnings(results: &[DeviceResult]) -> Vec<Value> {
    results
        .iter()
        .flat_map(|result| {
            result.warnings.iter().map(|warning| {
                json!({
                    "device": result.device.hostname,
                    "warning": warning,
                    "severity": if warning.to_lowercase().contains("critical") {
                        "critical"
                    } else {
                        "high"
                    },
                })
            })
        })
        .collect()
}

fn configuration_issues(results: &[DeviceResult]) -> Vec<Value> {
    let mut issues = Vec::new();

    for result in results {
        if !result.is_success() {
            issues.push(json!({
                "device": result.device.hostname,
                "issue_type": "connection_failure",
                "description": result.error_message,
                "recommendation": "Check device connectivity and credentials",
            }));
        }

        if result.total_vlans > 100 {
            issues.push(json!({
                "device": result.device.hostname,
                "issue_type": "high_vlan_count",
                "description": format!("Device has {} VLANs configured", result.total_vlans),
                "recommendation": "Review VLAN management practices",
            }));
        }
    }

    issues
}

fn next_steps(summary: &FleetSummary) -> Vec<String> {
    let mut steps = Vec::new();

    if summary.risk.requiring_approval() > 0 {
        steps.push(format!(
            "IMMEDIATE: Review {} high/critical risk VLANs before any cleanup",
            summary.risk.requiring_approval()
        ));
    }
    if summary.failed_devices > 0 {
        steps.push(format!(
            "URGENT: Resolve connectivity issues for {} failed devices",
            summary.failed_devices
        ));
    }
    if summary.risk.safe_for_automation() > 0 {
        steps.push(format!(
            "READY: {} VLANs can be safely removed automatically",
            summary.risk.safe_for_automation()
        ));
    }

    steps.extend(
        [
            "Schedule regular VLAN cleanup cycles",
            "Implement VLAN lifecycle management processes",
            "Update network documentation with current VLAN usage",
            "Create change management procedures for VLAN modifications",
        ]
        .iter()
        .map(|s| s.to_string()),
    );

    steps
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::aggregate::MetricsPolicy;
    use crate::model::{Device, RiskTier, VlanRecord};
    use crate::vendor::VendorFamily;

    fn sample_results() -> Vec<DeviceResult> {
        let device = Device {
            hostname: "sw1".to_string(),
            ip_address: "10.0.0.1".to_string(),
            vendor: "cisco".to_string(),
            device_type: "cisco_ios".to_string(),
            model: String::new(),
            version: String::new(),
            ssh_key_file: None,
            family: VendorFamily::CiscoIos,
        };
        let vlan = VlanRecord {
            vlan_id: 5,
            name: "management".to_string(),
            status: "active".to_string(),
            ports: Vec::new(),
            is_unused: true,
            removal_command: Some("no vlan 5".to_string()),
            risk: RiskTier::Critical,
            last_seen: None,
        };
        vec![DeviceResult::success(
            device.clone(),
            10,
            vec![vlan],
            vec!["no vlan 5".to_string()],
            vec!["vlan 5".to_string(), " name management".to_string()],
            Duration::from_secs(4),
            vec!["VLAN 5 (management) is marked as critical risk".to_string()],
        ),
        DeviceResult::failed(device, Duration::from_secs(1), "unreachable")]
    }

    #[test]
    fn report_document_has_all_sections() {
        let results = sample_results();
        let summary = FleetSummary::from_results(&results, &MetricsPolicy::default());
        let report = build_report(&results, &summary, true);

        for section in [
            "report_metadata",
            "executive_summary",
            "risk_assessment",
            "business_impact",
            "device_analysis",
            "operational_recommendations",
            "detailed_findings",
            "next_steps",
            "detailed_results",
        ] {
            assert!(report.get(section).is_some(), "missing section {section}");
        }

        assert_eq!(report["report_metadata"]["dry_run_mode"], json!(true));
        assert_eq!(
            report["executive_summary"]["total_devices_analyzed"],
            json!(2)
        );
        assert_eq!(
            report["risk_assessment"]["risk_distribution"]["critical"],
            json!(1)
        );
    }

    #[test]
    fn critical_warnings_carry_severity() {
        let warnings = critical_warnings(&sample_results());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0]["severity"], json!("critical"));
        assert_eq!(warnings[0]["device"], json!("sw1"));
    }

    #[test]
    fn configuration_issues_flag_failures() {
        let issues = configuration_issues(&sample_results());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0]["issue_type"], json!("connection_failure"));
    }

    #[test]
    fn csv_summary_has_header_and_one_row_per_device() {
        let results = sample_results();
        let dir = std::env::temp_dir().join("vlansweep-csv-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("summary.csv");

        write_summary_csv(&results, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Hostname,Vendor,Status"));
        assert!(lines[1].starts_with("sw1,cisco,success,10,1,"));
        assert!(lines[2].starts_with("sw1,cisco,failed,0,0,"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn executive_summary_renders_key_figures() {
        let results = sample_results();
        let summary = FleetSummary::from_results(&results, &MetricsPolicy::default());
        let rendered = render_executive_summary(&summary);

        assert!(rendered.contains("Devices Analyzed: 2"));
        assert!(rendered.contains("Unused VLANs Identified: 1"));
        assert!(rendered.contains("Critical Risk: 1 VLANs"));
        assert!(rendered.contains("IMMEDIATE: Review 1 high/critical"));
    }
}
