//! End-to-end run over a device list file with an in-memory device API.

use async_trait::async_trait;
use hikscan_core::config::ScanConfig;
use hikscan_core::credentials::{Credential, CredentialResolver};
use hikscan_core::device_api::{DeviceConnector, DeviceInfo, DeviceSession, InterfaceAddressing, TimeInfo};
use hikscan_core::error::CredentialError;
use hikscan_core::scanner::{CollectionStatus, Coverage, LookupOutcome, UNKNOWN};
use hikscan_core::{ApiError, inventory, scan};
use std::collections::HashMap;
use std::time::Duration;

/// Per-label passwords, as a site password generator would produce.
struct LabelResolver;

impl CredentialResolver for LabelResolver {
    fn resolve(&self, label: &str) -> Result<String, CredentialError> {
        Ok(format!("{}-pw", label))
    }
}

#[derive(Clone)]
enum Behaviour {
    /// Accepts only this secret, answers everything
    Healthy(&'static str),
    /// Refuses connections
    Offline,
    /// Accepts this secret, but has no working network interface
    NoNetwork(&'static str),
}

struct Fleet {
    devices: HashMap<&'static str, Behaviour>,
}

struct Session {
    behaviour: Behaviour,
    secret: String,
}

impl Session {
    fn check(&self) -> Result<(), ApiError> {
        match &self.behaviour {
            Behaviour::Offline => Err(ApiError::Connection("connection refused".into())),
            Behaviour::Healthy(secret) | Behaviour::NoNetwork(secret) if *secret == self.secret => Ok(()),
            _ => Err(ApiError::Unauthorized(401)),
        }
    }
}

#[async_trait]
impl DeviceSession for Session {
    async fn device_info(&self) -> Result<Option<DeviceInfo>, ApiError> {
        self.check()?;
        Ok(Some(DeviceInfo {
            device_name: Some("Camera, \"North\"".into()),
            model: Some("DS-2CD2387G2-LU".into()),
            serial_number: Some("DS2CD2387G2LU0042".into()),
            mac_address: Some("44:19:b6:01:02:03".into()),
        }))
    }

    async fn time(&self) -> Result<Option<TimeInfo>, ApiError> {
        self.check()?;
        Ok(Some(TimeInfo {
            time_mode: Some("manual".into()),
            local_time: Some("2001-01-01T00:00:00+00:00".into()),
            time_zone: Some("CST+0:00:00".into()),
        }))
    }

    async fn network_interface(&self, id: u32) -> Result<Option<InterfaceAddressing>, ApiError> {
        self.check()?;
        match (&self.behaviour, id) {
            (Behaviour::Healthy(_), 0) => Ok(Some(InterfaceAddressing {
                ip_address: Some("10.1.0.20".into()),
                subnet_mask: Some("255.255.0.0".into()),
                default_gateway: Some("10.1.0.1".into()),
            })),
            _ => Err(ApiError::Status(404)),
        }
    }
}

#[async_trait]
impl DeviceConnector for Fleet {
    async fn open_session(
        &self,
        address: &str,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<Box<dyn DeviceSession>, ApiError> {
        let behaviour = self
            .devices
            .get(address)
            .cloned()
            .unwrap_or(Behaviour::Offline);
        Ok(Box::new(Session {
            behaviour,
            secret: credential.secret().to_string(),
        }))
    }
}

#[tokio::test]
async fn test_full_run_round_trips_through_csv() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ips.txt");
    let output = dir.path().join("inventory.csv");
    std::fs::write(
        &input,
        "10.1.0.20,gate\n10.1.0.21,dock\nbad-line\n10.1.0.22,yard\n10.1.0.23,roof\n",
    )
    .unwrap();

    let mut config = ScanConfig {
        input_path: input,
        output_path: output.clone(),
        ..ScanConfig::default()
    };
    config.device.fallback_password = "factory".to_string();

    let fleet = Fleet {
        devices: HashMap::from([
            ("10.1.0.20", Behaviour::Healthy("gate-pw")),
            ("10.1.0.21", Behaviour::Healthy("factory")),
            ("10.1.0.22", Behaviour::NoNetwork("yard-pw")),
        ]),
    };

    let report = scan::run_inventory(&config, &fleet, &LabelResolver, None)
        .await
        .unwrap()
        .expect("device list is not empty");

    let records = &report.records;
    let labels: Vec<_> = records.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, vec!["gate", "dock", "yard", "roof"]);

    // primary password accepted
    assert_eq!(records[0].coverage(), Coverage::Complete);
    assert_eq!(records[0].configured_ip, "10.1.0.20");
    assert_eq!(records[0].default_gateway, "10.1.0.1");
    assert!(records[0].clock_status.starts_with("Drift of "));

    // fallback password accepted
    assert_eq!(records[1].status, CollectionStatus::Success);
    assert_eq!(records[1].serial_number, "DS2CD2387G2LU0042");

    // no usable interface: partial, network fields left at default
    assert_eq!(records[2].coverage(), Coverage::Partial);
    assert_eq!(records[2].network_lookup, LookupOutcome::Failed);
    assert_eq!(records[2].configured_ip, UNKNOWN);

    // offline: nothing collected
    assert_eq!(records[3].status, CollectionStatus::Error);
    assert!(!records[3].authenticated);
    assert_eq!(records[3].mac_address, UNKNOWN);

    assert_eq!(report.summary.devices, 4);
    assert_eq!(report.summary.authenticated, 3);
    assert_eq!(report.summary.failed, 1);

    let read_back = inventory::read_records(&output).unwrap();
    assert_eq!(&read_back, records);
}

#[tokio::test]
async fn test_unwritable_output_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("ips.txt");
    std::fs::write(&input, "10.1.0.20,gate\n").unwrap();

    let config = ScanConfig {
        input_path: input,
        output_path: dir.path().join("missing-dir").join("inventory.csv"),
        ..ScanConfig::default()
    };
    let fleet = Fleet {
        devices: HashMap::new(),
    };

    let result = scan::run_inventory(&config, &fleet, &LabelResolver, None).await;
    assert!(matches!(
        result,
        Err(hikscan_core::InventoryError::OutputWrite { .. })
    ));
}
