//! hikscan Core Library
//!
//! This crate provides the core functionality for inventorying Hikvision
//! camera fleets:
//! - Session authentication with a single credential fallback
//! - Fault-isolated collection of identity, clock and network data
//! - Clock drift classification
//! - Ordered network interface probing
//! - Device list parsing and CSV export
//!
//! # Example
//!
//! ```no_run
//! use hikscan_core::{config, credentials, device_api, scan};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = config::load_scan_config();
//!     let connector = device_api::IsapiConnector::new(config.device.port);
//!     let resolver = credentials::FallbackResolver::new(config.device.fallback_password.clone());
//!
//!     if let Some(report) = scan::run_inventory(&config, &connector, &resolver, None).await? {
//!         println!("Collected {} devices", report.summary.devices);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod credentials;
pub mod device_api;
pub mod error;
pub mod inventory;
pub mod scan;
pub mod scanner;

#[cfg(test)]
mod test_support;

pub use config::{DeviceSettings, ScanConfig};
pub use error::{ApiError, AuthError, CredentialError, InventoryError};
pub use inventory::DeviceTarget;
pub use scanner::{Collector, DeviceRecord};
