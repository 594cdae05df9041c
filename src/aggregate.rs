//! Fleet-level aggregation: counts, risk histogram, vendor breakdown,
//! business metrics, and operational recommendations.
//!
//! A pure reducer over a completed, immutable result set. Running it twice
//! over the same input yields identical output.

use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{BusinessMetrics, DeviceResult, RiskTier};

/// Tunable constants behind the business-impact calculation. These are
/// policy, not physics.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsPolicy {
    pub manual_minutes_per_device: f64,
    pub automated_minutes_per_device: f64,
    pub cost_per_minute_usd: f64,
}

impl Default for MetricsPolicy {
    fn default() -> Self {
        Self {
            manual_minutes_per_device: 30.0,
            automated_minutes_per_device: 2.0,
            cost_per_minute_usd: 2.0,
        }
    }
}

/// Histogram of unused VLANs by risk tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
}

impl RiskCounts {
    fn record(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
            RiskTier::Critical => self.critical += 1,
        }
    }

    /// VLANs that need operator approval before removal.
    pub fn requiring_approval(&self) -> usize {
        self.high + self.critical
    }

    /// VLANs eligible for automated cleanup.
    pub fn safe_for_automation(&self) -> usize {
        self.low + self.medium
    }
}

/// Per-vendor slice of the fleet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VendorBreakdown {
    pub device_count: usize,
    pub total_vlans: usize,
    pub unused_vlans: usize,
    pub successful_devices: usize,
    pub success_rate: f64,
    pub cleanup_percentage: f64,
}

/// One entry in the top-cleanup-candidates ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupCandidate {
    pub hostname: String,
    pub vendor: String,
    pub unused_vlans: usize,
    pub total_vlans: usize,
    pub cleanup_percentage: f64,
    pub high_risk_vlans: usize,
}

/// Processing-time statistics over successful devices, in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceStats {
    pub fastest_secs: f64,
    pub slowest_secs: f64,
    pub average_secs: f64,
    pub total_secs: f64,
}

/// Aggregate view over one completed run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub total_devices: usize,
    pub successful_devices: usize,
    pub failed_devices: usize,
    pub total_vlans: usize,
    pub unused_vlans: usize,
    pub cleanup_percentage: f64,
    pub risk: RiskCounts,
    pub vendor_breakdown: IndexMap<String, VendorBreakdown>,
    pub top_candidates: Vec<CleanupCandidate>,
    pub performance: PerformanceStats,
    pub metrics: BusinessMetrics,
    pub recommendations: Vec<String>,
}

const TOP_CANDIDATE_LIMIT: usize = 5;

const OPERATIONAL_BENEFITS: [&str; 6] = [
    "Reduced security attack surface through VLAN cleanup",
    "Improved network performance by removing unused broadcast domains",
    "Enhanced compliance posture with clean network configurations",
    "Simplified troubleshooting with cleaner VLAN database",
    "Reduced management overhead for network operations",
    "Better documentation accuracy for network inventory",
];

const STANDING_RECOMMENDATIONS: [&str; 5] = [
    "Implement regular VLAN cleanup cycles (monthly/quarterly)",
    "Establish VLAN naming conventions to improve identification",
    "Create approval workflows for VLAN changes",
    "Consider implementing automated VLAN provisioning with lifecycle management",
    "Document VLAN usage and ownership for better governance",
];

impl FleetSummary {
    /// Reduce a completed result set into the aggregate view.
    pub fn from_results(results: &[DeviceResult], policy: &MetricsPolicy) -> Self {
        let total_devices = results.len();
        let successful_devices = results.iter().filter(|r| r.is_success()).count();
        let failed_devices = total_devices - successful_devices;

        let total_vlans: usize = results.iter().map(|r| r.total_vlans).sum();
        let unused_vlans: usize = results.iter().map(|r| r.unused_count()).sum();
        let cleanup_percentage = percentage(unused_vlans, total_vlans);

        let mut risk = RiskCounts::default();
        for result in results {
            for vlan in &result.unused_vlans {
                risk.record(vlan.risk);
            }
        }

        Self {
            total_devices,
            successful_devices,
            failed_devices,
            total_vlans,
            unused_vlans,
            cleanup_percentage,
            vendor_breakdown: vendor_breakdown(results),
            top_candidates: top_candidates(results),
            performance: performance(results),
            metrics: business_metrics(results, policy, successful_devices, unused_vlans),
            recommendations: recommendations(
                results,
                &risk,
                failed_devices,
                cleanup_percentage,
            ),
            risk,
        }
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn vendor_breakdown(results: &[DeviceResult]) -> IndexMap<String, VendorBreakdown> {
    let mut breakdown: IndexMap<String, VendorBreakdown> = IndexMap::new();

    for result in results {
        let entry = breakdown
            .entry(result.device.vendor.clone())
            .or_default();
        entry.device_count += 1;
        entry.total_vlans += result.total_vlans;
        entry.unused_vlans += result.unused_count();
        if result.is_success() {
            entry.successful_devices += 1;
        }
    }

    for entry in breakdown.values_mut() {
        entry.success_rate = percentage(entry.successful_devices, entry.device_count);
        entry.cleanup_percentage = percentage(entry.unused_vlans, entry.total_vlans);
    }

    breakdown
}

fn top_candidates(results: &[DeviceResult]) -> Vec<CleanupCandidate> {
    let mut candidates: Vec<CleanupCandidate> = results
        .iter()
        .filter(|r| r.is_success() && !r.unused_vlans.is_empty())
        .map(|r| CleanupCandidate {
            hostname: r.device.hostname.clone(),
            vendor: r.device.vendor.clone(),
            unused_vlans: r.unused_count(),
            total_vlans: r.total_vlans,
            cleanup_percentage: percentage(r.unused_count(), r.total_vlans),
            high_risk_vlans: r
                .unused_vlans
                .iter()
                .filter(|v| v.risk.requires_approval())
                .count(),
        })
        .collect();

    // Stable sort: ties keep input order.
    candidates.sort_by(|a, b| b.unused_vlans.cmp(&a.unused_vlans));
    candidates.truncate(TOP_CANDIDATE_LIMIT);
    candidates
}

fn performance(results: &[DeviceResult]) -> PerformanceStats {
    let total_secs: f64 = results.iter().map(|r| r.processing_time.as_secs_f64()).sum();
    let successful: Vec<f64> = results
        .iter()
        .filter(|r| r.is_success())
        .map(|r| r.processing_time.as_secs_f64())
        .collect();

    let average_secs = if results.is_empty() {
        0.0
    } else {
        total_secs / results.len() as f64
    };

    PerformanceStats {
        fastest_secs: successful.iter().copied().reduce(f64::min).unwrap_or(0.0),
        slowest_secs: successful.iter().copied().reduce(f64::max).unwrap_or(0.0),
        average_secs: round2(average_secs),
        total_secs: round2(total_secs),
    }
}

fn business_metrics(
    results: &[DeviceResult],
    policy: &MetricsPolicy,
    successful_devices: usize,
    unused_vlans: usize,
) -> BusinessMetrics {
    if results.is_empty() {
        return BusinessMetrics {
            time_saved_minutes: 0.0,
            time_saved_hours: 0.0,
            estimated_cost_savings_usd: 0.0,
            devices_processed: 0,
            vlans_cleaned: 0,
            operational_benefits: Vec::new(),
        };
    }

    let time_saved_minutes = (policy.manual_minutes_per_device
        - policy.automated_minutes_per_device)
        * successful_devices as f64;

    BusinessMetrics {
        time_saved_minutes,
        time_saved_hours: round2(time_saved_minutes / 60.0),
        estimated_cost_savings_usd: time_saved_minutes * policy.cost_per_minute_usd,
        devices_processed: successful_devices,
        vlans_cleaned: unused_vlans,
        operational_benefits: OPERATIONAL_BENEFITS.iter().map(|s| s.to_string()).collect(),
    }
}

fn recommendations(
    results: &[DeviceResult],
    risk: &RiskCounts,
    failed_devices: usize,
    cleanup_percentage: f64,
) -> Vec<String> {
    if results.is_empty() {
        return vec!["No processing results available for recommendations".to_string()];
    }

    let mut recommendations = Vec::new();

    if risk.requiring_approval() > 0 {
        recommendations.push(format!(
            "Manual review required for {} high/critical risk VLANs before removal",
            risk.requiring_approval()
        ));
    }

    if failed_devices > 0 {
        recommendations.push(format!(
            "Investigate connection issues for {failed_devices} failed devices"
        ));
    }

    if cleanup_percentage > 20.0 {
        recommendations.push(
            "High percentage of unused VLANs detected - consider implementing VLAN lifecycle management"
                .to_string(),
        );
    }

    recommendations.extend(STANDING_RECOMMENDATIONS.iter().map(|s| s.to_string()));
    recommendations
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::model::{Device, RiskTier, VlanRecord};
    use crate::vendor::VendorFamily;

    fn device(hostname: &str, vendor: &str) -> Device {
        Device {
            hostname: hostname.to_string(),
            ip_address: "10.0.0.1".to_string(),
            vendor: vendor.to_string(),
            device_type: String::new(),
            model: String::new(),
            version: String::new(),
            ssh_key_file: None,
            family: VendorFamily::CiscoIos,
        }
    }

    fn unused(vlan_id: u16, risk: RiskTier) -> VlanRecord {
        VlanRecord {
            vlan_id,
            name: format!("vlan{vlan_id}"),
            status: "active".to_string(),
            ports: Vec::new(),
            is_unused: true,
            removal_command: Some(format!("no vlan {vlan_id}")),
            risk,
            last_seen: None,
        }
    }

    fn success(hostname: &str, vendor: &str, total: usize, vlans: Vec<VlanRecord>) -> DeviceResult {
        let removal = vlans
            .iter()
            .filter_map(|v| v.removal_command.clone())
            .collect();
        DeviceResult::success(
            device(hostname, vendor),
            total,
            vlans,
            removal,
            Vec::new(),
            Duration::from_secs(3),
            Vec::new(),
        )
    }

    fn sample_results() -> Vec<DeviceResult> {
        vec![
            success(
                "sw1",
                "cisco",
                10,
                vec![unused(100, RiskTier::Medium), unused(600, RiskTier::Low)],
            ),
            success("sw2", "arista", 8, vec![unused(5, RiskTier::Critical)]),
            DeviceResult::failed(device("sw3", "juniper"), Duration::from_secs(1), "unreachable"),
        ]
    }

    #[test]
    fn counts_and_histogram() {
        let summary = FleetSummary::from_results(&sample_results(), &MetricsPolicy::default());

        assert_eq!(summary.total_devices, 3);
        assert_eq!(summary.successful_devices, 2);
        assert_eq!(summary.failed_devices, 1);
        assert_eq!(summary.total_vlans, 18);
        assert_eq!(summary.unused_vlans, 3);
        assert_eq!(
            summary.risk,
            RiskCounts {
                low: 1,
                medium: 1,
                high: 0,
                critical: 1,
            }
        );
        assert_eq!(summary.risk.requiring_approval(), 1);
        assert_eq!(summary.risk.safe_for_automation(), 2);
    }

    #[test]
    fn vendor_breakdown_rates() {
        let summary = FleetSummary::from_results(&sample_results(), &MetricsPolicy::default());

        let cisco = &summary.vendor_breakdown["cisco"];
        assert_eq!(cisco.device_count, 1);
        assert_eq!(cisco.success_rate, 100.0);
        assert_eq!(cisco.cleanup_percentage, 20.0);

        let juniper = &summary.vendor_breakdown["juniper"];
        assert_eq!(juniper.device_count, 1);
        assert_eq!(juniper.success_rate, 0.0);
        assert_eq!(juniper.total_vlans, 0);
        assert_eq!(juniper.cleanup_percentage, 0.0);
    }

    #[test]
    fn top_candidates_ranked_descending_with_stable_ties() {
        let results = vec![
            success("a", "cisco", 10, vec![unused(100, RiskTier::Low)]),
            success(
                "b",
                "cisco",
                10,
                vec![unused(101, RiskTier::Low), unused(102, RiskTier::Low)],
            ),
            success("c", "cisco", 10, vec![unused(103, RiskTier::Low)]),
        ];
        let summary = FleetSummary::from_results(&results, &MetricsPolicy::default());

        let order: Vec<&str> = summary
            .top_candidates
            .iter()
            .map(|c| c.hostname.as_str())
            .collect();
        // b leads; a and c tie and keep input order.
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn business_metrics_use_policy_constants() {
        let summary = FleetSummary::from_results(&sample_results(), &MetricsPolicy::default());

        // (30 - 2) minutes x 2 successful devices.
        assert_eq!(summary.metrics.time_saved_minutes, 56.0);
        assert_eq!(summary.metrics.time_saved_hours, 0.93);
        assert_eq!(summary.metrics.estimated_cost_savings_usd, 112.0);
        assert_eq!(summary.metrics.devices_processed, 2);
        assert_eq!(summary.metrics.vlans_cleaned, 3);
        assert_eq!(summary.metrics.operational_benefits.len(), 6);
    }

    #[test]
    fn custom_policy_changes_the_numbers_not_the_shape() {
        let policy = MetricsPolicy {
            manual_minutes_per_device: 45.0,
            automated_minutes_per_device: 5.0,
            cost_per_minute_usd: 1.5,
        };
        let summary = FleetSummary::from_results(&sample_results(), &policy);
        assert_eq!(summary.metrics.time_saved_minutes, 80.0);
        assert_eq!(summary.metrics.estimated_cost_savings_usd, 120.0);
    }

    #[test]
    fn recommendations_follow_the_rule_list() {
        let summary = FleetSummary::from_results(&sample_results(), &MetricsPolicy::default());

        assert!(summary.recommendations[0].contains("Manual review required for 1"));
        assert!(summary.recommendations[1].contains("1 failed devices"));
        // 3/18 = 16.7%: below the 20% threshold, no lifecycle advisory.
        assert!(!summary
            .recommendations
            .iter()
            .any(|r| r.contains("High percentage")));
        // Standing recommendations always close the list.
        assert!(summary.recommendations.len() >= STANDING_RECOMMENDATIONS.len() + 2);
    }

    #[test]
    fn high_cleanup_percentage_adds_lifecycle_advisory() {
        let results = vec![success(
            "sw1",
            "cisco",
            4,
            vec![unused(100, RiskTier::Low), unused(101, RiskTier::Low)],
        )];
        let summary = FleetSummary::from_results(&results, &MetricsPolicy::default());
        assert!(summary
            .recommendations
            .iter()
            .any(|r| r.contains("High percentage")));
    }

    #[test]
    fn empty_results_yield_zeroed_metrics() {
        let summary = FleetSummary::from_results(&[], &MetricsPolicy::default());
        assert_eq!(summary.total_devices, 0);
        assert_eq!(summary.metrics.time_saved_minutes, 0.0);
        assert_eq!(summary.cleanup_percentage, 0.0);
        assert_eq!(
            summary.recommendations,
            vec!["No processing results available for recommendations".to_string()]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let results = sample_results();
        let policy = MetricsPolicy::default();
        let first = FleetSummary::from_results(&results, &policy);
        let second = FleetSummary::from_results(&results, &policy);
        assert_eq!(first, second);
    }
}
