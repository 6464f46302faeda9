//! Per-device inventory record.

use crate::device_api::{DeviceInfo, InterfaceAddressing, TimeInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder for any field that was never populated
pub const UNKNOWN: &str = "unknown";

/// Every scanned device is a Hikvision device
pub const VENDOR: &str = "Hikvision";

/// Overall collection status. `Success` means a validated session was
/// obtained, nothing more; per-category results live in [`LookupOutcome`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectionStatus {
    Success,
    #[default]
    Error,
}

/// Result of one lookup category (identity, clock, network).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupOutcome {
    /// Data was read and applied
    Collected,
    /// The device answered without the expected sub-object
    NoData,
    /// The query failed
    Failed,
    /// Not attempted because no session was obtained
    #[default]
    Skipped,
}

/// How much of a record was filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coverage {
    Complete,
    Partial,
    None,
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coverage::Complete => write!(f, "complete"),
            Coverage::Partial => write!(f, "partial"),
            Coverage::None => write!(f, "none"),
        }
    }
}

/// One row of the inventory. Column names match the exported CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    #[serde(rename = "MAC")]
    pub mac_address: String,
    #[serde(rename = "IP")]
    pub address: String,
    #[serde(rename = "Name")]
    pub device_name: String,
    #[serde(rename = "Vendor")]
    pub vendor: String,
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "Serial")]
    pub serial_number: String,
    #[serde(rename = "Clock Status")]
    pub clock_status: String,
    #[serde(rename = "Time Sync Mode")]
    pub time_mode: String,
    #[serde(rename = "Time Zone")]
    pub time_zone: String,
    #[serde(rename = "Configured IP")]
    pub configured_ip: String,
    #[serde(rename = "Subnet Mask")]
    pub subnet_mask: String,
    #[serde(rename = "Default Gateway")]
    pub default_gateway: String,
    #[serde(rename = "Collection Status")]
    pub status: CollectionStatus,
    #[serde(rename = "Authenticated")]
    pub authenticated: bool,
    #[serde(rename = "Identity Lookup")]
    pub identity_lookup: LookupOutcome,
    #[serde(rename = "Clock Lookup")]
    pub clock_lookup: LookupOutcome,
    #[serde(rename = "Network Lookup")]
    pub network_lookup: LookupOutcome,
    #[serde(rename = "Label")]
    pub label: String,
}

impl DeviceRecord {
    /// A record with every field at its default.
    pub fn new(address: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            mac_address: UNKNOWN.to_string(),
            address: address.into(),
            device_name: UNKNOWN.to_string(),
            vendor: VENDOR.to_string(),
            model: UNKNOWN.to_string(),
            serial_number: UNKNOWN.to_string(),
            clock_status: UNKNOWN.to_string(),
            time_mode: UNKNOWN.to_string(),
            time_zone: UNKNOWN.to_string(),
            configured_ip: UNKNOWN.to_string(),
            subnet_mask: UNKNOWN.to_string(),
            default_gateway: UNKNOWN.to_string(),
            status: CollectionStatus::Error,
            authenticated: false,
            identity_lookup: LookupOutcome::Skipped,
            clock_lookup: LookupOutcome::Skipped,
            network_lookup: LookupOutcome::Skipped,
            label: label.into(),
        }
    }

    pub fn apply_identity(&mut self, info: DeviceInfo) {
        set_if_present(&mut self.device_name, info.device_name);
        set_if_present(&mut self.model, info.model);
        set_if_present(&mut self.serial_number, info.serial_number);
        set_if_present(&mut self.mac_address, info.mac_address);
    }

    /// Timezone and sync mode only; the clock label comes from drift evaluation.
    pub fn apply_time(&mut self, time: &TimeInfo) {
        set_if_present(&mut self.time_zone, time.time_zone.clone());
        set_if_present(&mut self.time_mode, time.time_mode.clone());
    }

    pub fn apply_addressing(&mut self, addressing: InterfaceAddressing) {
        set_if_present(&mut self.configured_ip, addressing.ip_address);
        set_if_present(&mut self.subnet_mask, addressing.subnet_mask);
        set_if_present(&mut self.default_gateway, addressing.default_gateway);
    }

    pub fn mark_authenticated(&mut self) {
        self.authenticated = true;
        self.status = CollectionStatus::Success;
    }

    pub fn coverage(&self) -> Coverage {
        if !self.authenticated {
            return Coverage::None;
        }
        let all_collected = [self.identity_lookup, self.clock_lookup, self.network_lookup]
            .iter()
            .all(|outcome| *outcome == LookupOutcome::Collected);
        if all_collected {
            Coverage::Complete
        } else {
            Coverage::Partial
        }
    }
}

fn set_if_present(field: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = value;
    }
}
