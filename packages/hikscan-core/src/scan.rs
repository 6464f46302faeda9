//! Scan driver: device list in, inventory file out.

use crate::config::{DeviceSettings, ScanConfig};
use crate::credentials::{CredentialResolver, resolve_primary};
use crate::device_api::DeviceConnector;
use crate::error::InventoryError;
use crate::inventory::{self, DeviceTarget};
use crate::scanner::{Collector, Coverage, DeviceRecord};
use serde::Serialize;
use std::time::Instant;

/// Progress update emitted before each device is processed
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanProgress {
    /// 1-based position in the device list
    pub index: usize,
    pub total: usize,
    pub address: String,
    pub label: String,
}

/// Callback type for scan progress updates
pub type ProgressCallback = Box<dyn Fn(&ScanProgress) + Send + Sync>;

/// Totals over a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub devices: usize,
    pub authenticated: usize,
    pub complete: usize,
    pub partial: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn from_records(records: &[DeviceRecord]) -> Self {
        let mut summary = ScanSummary {
            devices: records.len(),
            ..Default::default()
        };
        for record in records {
            if record.authenticated {
                summary.authenticated += 1;
            }
            match record.coverage() {
                Coverage::Complete => summary.complete += 1,
                Coverage::Partial => summary.partial += 1,
                Coverage::None => summary.failed += 1,
            }
        }
        summary
    }
}

/// Result of a full inventory run.
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub records: Vec<DeviceRecord>,
    pub summary: ScanSummary,
    pub elapsed_secs: f64,
}

/// Collect one record per target, strictly in order and one device at a time.
pub async fn scan_devices(
    targets: &[DeviceTarget],
    settings: &DeviceSettings,
    connector: &dyn DeviceConnector,
    resolver: &dyn CredentialResolver,
    progress: Option<&ProgressCallback>,
) -> Vec<DeviceRecord> {
    scan_devices_with(Collector::new(connector, settings), targets, settings, resolver, progress).await
}

async fn scan_devices_with(
    collector: Collector<'_>,
    targets: &[DeviceTarget],
    settings: &DeviceSettings,
    resolver: &dyn CredentialResolver,
    progress: Option<&ProgressCallback>,
) -> Vec<DeviceRecord> {
    let total = targets.len();
    let mut records = Vec::with_capacity(total);

    for (idx, target) in targets.iter().enumerate() {
        tracing::info!("Processing: {} ({})...", target.label, target.address);

        if let Some(callback) = progress {
            callback(&ScanProgress {
                index: idx + 1,
                total,
                address: target.address.clone(),
                label: target.label.clone(),
            });
        }

        let password = resolve_primary(resolver, &target.label, &settings.fallback_password);
        let record = collector
            .collect_device(&target.address, &target.label, &password)
            .await;
        records.push(record);
    }

    records
}

/// Read the device list, scan every device and write the inventory file.
///
/// Returns `Ok(None)` when the device list is empty. Missing or unreadable
/// input and an unwritable output file abort the run.
pub async fn run_inventory(
    config: &ScanConfig,
    connector: &dyn DeviceConnector,
    resolver: &dyn CredentialResolver,
    progress: Option<ProgressCallback>,
) -> Result<Option<ScanReport>, InventoryError> {
    let start = Instant::now();

    let targets = inventory::read_targets(&config.input_path).inspect_err(|e| {
        tracing::error!("{}", e);
    })?;

    if targets.is_empty() {
        tracing::warn!("Device list {} is empty", config.input_path.display());
        return Ok(None);
    }

    tracing::info!("Loaded {} devices for inventory", targets.len());

    let records = scan_devices(&targets, &config.device, connector, resolver, progress.as_ref()).await;

    inventory::write_records(&config.output_path, &records).inspect_err(|e| {
        tracing::error!("{}", e);
    })?;

    let summary = ScanSummary::from_records(&records);
    let elapsed_secs = start.elapsed().as_secs_f64();
    tracing::info!(
        "Scan complete in {:.1}s: {} devices, {} authenticated, {} complete, {} partial, {} failed",
        elapsed_secs,
        summary.devices,
        summary.authenticated,
        summary.complete,
        summary.partial,
        summary.failed
    );

    Ok(Some(ScanReport {
        records,
        summary,
        elapsed_secs,
    }))
}
