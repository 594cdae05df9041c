//! Risk classification for VLAN removal.
//!
//! A heuristic, not ground truth: low numeric ids conventionally host
//! management and infrastructure VLANs even when unnamed, and the 100-199
//! band is a common voice-VLAN convention. Findings in the high and
//! critical tiers are surfaced as warnings and gated behind operator
//! approval; they are never auto-trusted for destructive action.

use crate::model::RiskTier;

/// Assess the removal risk of a VLAN from its name and numeric id.
///
/// Pure function of `(name, vlan_id, critical_names)`; evaluation order is
/// strict, first match wins:
///
/// 1. name contains a critical keyword (case-insensitive) -> critical
/// 2. id in `[1, 10)` -> high
/// 3. id in `[100, 200)` -> medium
/// 4. otherwise -> low
pub fn assess(name: &str, vlan_id: u16, critical_names: &[String]) -> RiskTier {
    let lowered = name.to_lowercase();
    if critical_names
        .iter()
        .any(|keyword| lowered.contains(&keyword.to_lowercase()))
    {
        return RiskTier::Critical;
    }

    if (1..10).contains(&vlan_id) {
        return RiskTier::High;
    }

    if (100..200).contains(&vlan_id) {
        return RiskTier::Medium;
    }

    RiskTier::Low
}
