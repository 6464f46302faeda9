//! Device API capability.
//!
//! The collection pipeline only talks to devices through [`DeviceConnector`]
//! and [`DeviceSession`]. The ISAPI binding in [`isapi`] is the production
//! implementation; tests plug in scripted fakes.

pub mod digest;
pub mod isapi;
pub mod xml;

pub use isapi::IsapiConnector;

use crate::credentials::Credential;
use crate::error::ApiError;
use async_trait::async_trait;
use std::time::Duration;

/// Identity sub-object of the device info resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub mac_address: Option<String>,
}

/// Time sub-object of the device clock resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeInfo {
    pub time_mode: Option<String>,
    pub local_time: Option<String>,
    pub time_zone: Option<String>,
}

/// Addressing block of one network interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceAddressing {
    pub ip_address: Option<String>,
    pub subnet_mask: Option<String>,
    pub default_gateway: Option<String>,
}

/// An open handle to one device.
///
/// Each query returns `Ok(None)` when the device answered but the expected
/// sub-object was missing from the response.
#[async_trait]
pub trait DeviceSession: Send + Sync {
    async fn device_info(&self) -> Result<Option<DeviceInfo>, ApiError>;

    async fn time(&self) -> Result<Option<TimeInfo>, ApiError>;

    async fn network_interface(&self, id: u32) -> Result<Option<InterfaceAddressing>, ApiError>;
}

/// Opens sessions to devices.
///
/// Opening a session is not proof that the credential works; callers must
/// validate with a query before trusting it.
#[async_trait]
pub trait DeviceConnector: Send + Sync {
    async fn open_session(
        &self,
        address: &str,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceSession>, ApiError>;
}
