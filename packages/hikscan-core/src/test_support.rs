//! Scripted device fakes and log capture for unit tests.

use crate::config::DeviceSettings;
use crate::credentials::Credential;
use crate::device_api::{DeviceConnector, DeviceInfo, DeviceSession, InterfaceAddressing, TimeInfo};
use crate::error::ApiError;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::fmt::MakeWriter;

pub const PASSWORD: &str = "admin1234";

/// 2024-01-15T02:30:00Z, i.e. 10:30 at UTC+8
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 2, 30, 0).unwrap()
}

pub fn settings() -> DeviceSettings {
    DeviceSettings {
        fallback_password: PASSWORD.to_string(),
        timeout: Duration::from_secs(1),
        ..DeviceSettings::default()
    }
}

pub fn addressing(ip: &str) -> InterfaceAddressing {
    InterfaceAddressing {
        ip_address: Some(ip.to_string()),
        subnet_mask: Some("255.255.255.0".to_string()),
        default_gateway: Some("192.168.1.1".to_string()),
    }
}

/// Scripted behaviour of one device.
#[derive(Debug, Clone)]
pub struct FakeDevice {
    accepted: Vec<String>,
    transport_error: Option<ApiError>,
    identity: Result<Option<DeviceInfo>, ApiError>,
    identity_after_auth: Option<ApiError>,
    time: Result<Option<TimeInfo>, ApiError>,
    interfaces: HashMap<u32, Result<Option<InterfaceAddressing>, ApiError>>,
}

impl FakeDevice {
    /// Accepts [`PASSWORD`] and answers every query.
    pub fn healthy() -> Self {
        Self {
            accepted: vec![PASSWORD.to_string()],
            transport_error: None,
            identity: Ok(Some(DeviceInfo {
                device_name: Some("Lobby Dome".to_string()),
                model: Some("DS-2CD2143G2-I".to_string()),
                serial_number: Some("DS2CD2143G2I0000001".to_string()),
                mac_address: Some("bc:ad:28:aa:bb:cc".to_string()),
            })),
            identity_after_auth: None,
            time: Ok(Some(TimeInfo {
                time_mode: Some("NTP".to_string()),
                local_time: Some("2024-01-15T10:30:00+08:00".to_string()),
                time_zone: Some("CST-8:00:00".to_string()),
            })),
            interfaces: HashMap::from([(1, Ok(Some(addressing("192.168.1.64"))))]),
        }
    }

    pub fn accepting(mut self, secrets: &[&str]) -> Self {
        self.accepted = secrets.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Every call fails with `error`, before credentials are checked.
    pub fn unreachable(mut self, error: ApiError) -> Self {
        self.transport_error = Some(error);
        self
    }

    pub fn with_identity(mut self, identity: Result<Option<DeviceInfo>, ApiError>) -> Self {
        self.identity = identity;
        self
    }

    /// Validation succeeds, later identity queries fail with `error`.
    pub fn failing_identity_after_auth(mut self, error: ApiError) -> Self {
        self.identity_after_auth = Some(error);
        self
    }

    pub fn with_time(mut self, time: Result<Option<TimeInfo>, ApiError>) -> Self {
        self.time = time;
        self
    }

    pub fn with_local_time(mut self, local_time: Option<&str>) -> Self {
        if let Ok(Some(time)) = &mut self.time {
            time.local_time = local_time.map(str::to_string);
        }
        self
    }

    pub fn with_interface(
        mut self,
        id: u32,
        response: Result<Option<InterfaceAddressing>, ApiError>,
    ) -> Self {
        self.interfaces.insert(id, response);
        self
    }

    /// A session authenticated with the first accepted secret.
    pub fn session(&self) -> FakeSession {
        let secret = self.accepted.first().cloned().unwrap_or_default();
        FakeSession::new(self.clone(), secret)
    }
}

pub struct FakeSession {
    device: FakeDevice,
    secret: String,
    identity_calls: AtomicUsize,
    probes: Mutex<Vec<u32>>,
}

impl FakeSession {
    fn new(device: FakeDevice, secret: String) -> Self {
        Self {
            device,
            secret,
            identity_calls: AtomicUsize::new(0),
            probes: Mutex::new(Vec::new()),
        }
    }

    /// Interface ids queried so far, in order.
    pub fn probed(&self) -> Vec<u32> {
        self.probes.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ApiError> {
        if let Some(error) = &self.device.transport_error {
            return Err(error.clone());
        }
        if !self.device.accepted.contains(&self.secret) {
            return Err(ApiError::Unauthorized(401));
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceSession for FakeSession {
    async fn device_info(&self) -> Result<Option<DeviceInfo>, ApiError> {
        self.check()?;
        let call = self.identity_calls.fetch_add(1, Ordering::SeqCst);
        if call > 0 {
            if let Some(error) = &self.device.identity_after_auth {
                return Err(error.clone());
            }
        }
        self.device.identity.clone()
    }

    async fn time(&self) -> Result<Option<TimeInfo>, ApiError> {
        self.check()?;
        self.device.time.clone()
    }

    async fn network_interface(&self, id: u32) -> Result<Option<InterfaceAddressing>, ApiError> {
        self.check()?;
        self.probes.lock().unwrap().push(id);
        self.device
            .interfaces
            .get(&id)
            .cloned()
            .unwrap_or(Err(ApiError::Status(404)))
    }
}

/// Connector over a fixed set of fake devices. Unknown addresses are unreachable.
#[derive(Default)]
pub struct FakeConnector {
    devices: HashMap<String, FakeDevice>,
    attempts: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, address: &str, device: FakeDevice) -> Self {
        self.devices.insert(address.to_string(), device);
        self
    }

    /// Secrets used to open sessions, in order.
    pub fn attempted_secrets(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, secret)| secret.clone())
            .collect()
    }

    /// Addresses sessions were opened to, in order.
    pub fn attempted_addresses(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }
}

#[async_trait]
impl DeviceConnector for FakeConnector {
    async fn open_session(
        &self,
        address: &str,
        credential: &Credential,
        _timeout: Duration,
    ) -> Result<Box<dyn DeviceSession>, ApiError> {
        self.attempts
            .lock()
            .unwrap()
            .push((address.to_string(), credential.secret().to_string()));

        let device = self.devices.get(address).cloned().unwrap_or_else(|| {
            FakeDevice::healthy().unreachable(ApiError::Connection("no route to host".to_string()))
        });
        Ok(Box::new(FakeSession::new(device, credential.secret().to_string())))
    }
}

/// Collects formatted log output of the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route this thread's events here until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buffer = self.buffer.lock().unwrap();
        String::from_utf8_lossy(&buffer)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Number of lines containing `needle`.
    pub fn count(&self, needle: &str) -> usize {
        self.lines().iter().filter(|line| line.contains(needle)).count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
