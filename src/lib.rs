//! # vlansweep
//!
//! Async multi-vendor VLAN inventory and cleanup engine for network devices.
//!
//! vlansweep connects to a fleet of Cisco, Arista, and Juniper switches
//! over SSH, inventories their VLAN tables, classifies each VLAN as in-use
//! or unused with a removal-risk tier, and emits vendor-correct removal and
//! rollback commands plus aggregate reporting. Mutation is a separate,
//! opt-in pass gated on operator approval; analysis alone never changes
//! device state.
//!
//! ## Features
//!
//! - Async SSH sessions via russh with prompt-scraped PTY channels
//! - Multi-vendor support (Cisco IOS family, Arista EOS, Juniper JUNOS)
//! - Per-device retry discipline with bounded-concurrency fan-out
//! - Conservative usage classification (reserved ids, member ports,
//!   SVI/IRB probes) that fails toward leaving VLANs in place
//! - Risk tiers driving an approval gate for destructive operations
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vlansweep::{FleetAnalyzer, Settings, SshConnector};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vlansweep::Error> {
//!     let settings = Settings::load("config.yaml")?;
//!     settings.validate()?;
//!
//!     let connector = SshConnector::new(
//!         Arc::new(settings.authentication),
//!         settings.processing.clone(),
//!     );
//!     let fleet = FleetAnalyzer::new(
//!         Arc::new(connector),
//!         settings.vlan_analysis.clone(),
//!         settings.processing.max_concurrent_devices,
//!         true, // dry run
//!     );
//!
//!     let results = fleet.run(&settings.devices).await;
//!     println!("{} devices analyzed", results.len());
//!     Ok(())
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod fleet;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod risk;
pub mod transport;
pub mod vendor;

// Re-export main types for convenience
pub use aggregate::{FleetSummary, MetricsPolicy};
pub use config::Settings;
pub use error::Error;
pub use fleet::{ExecutionOutcome, FleetAnalyzer};
pub use model::{BusinessMetrics, Device, DeviceResult, RiskTier, VlanRecord};
pub use transport::{Connector, DeviceSession, SshConnector};
pub use vendor::VendorFamily;
