//! ISAPI (Hikvision HTTP API) binding of the device capability.

use super::digest::{self, Challenge};
use super::xml::{child_section, child_text, root_element};
use super::{DeviceConnector, DeviceInfo, DeviceSession, InterfaceAddressing, TimeInfo};
use crate::credentials::Credential;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use std::time::Duration;

/// Default HTTP port of the ISAPI endpoint
pub const DEFAULT_HTTP_PORT: u16 = 80;

const DEVICE_INFO_PATH: &str = "/ISAPI/System/deviceInfo";
const TIME_PATH: &str = "/ISAPI/System/time";
const INTERFACE_PATH: &str = "/ISAPI/System/Network/interfaces";

/// Opens ISAPI sessions over plain HTTP.
#[derive(Debug, Clone)]
pub struct IsapiConnector {
    port: u16,
}

impl IsapiConnector {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Default for IsapiConnector {
    fn default() -> Self {
        Self::new(DEFAULT_HTTP_PORT)
    }
}

#[async_trait]
impl DeviceConnector for IsapiConnector {
    async fn open_session(
        &self,
        address: &str,
        credential: &Credential,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceSession>, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ApiError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Box::new(IsapiSession {
            client,
            base_url: format!("http://{}:{}", address, self.port),
            credential: credential.clone(),
        }))
    }
}

/// One device, one credential. No I/O happens until the first query.
pub struct IsapiSession {
    client: reqwest::Client,
    base_url: String,
    credential: Credential,
}

impl IsapiSession {
    /// GET an ISAPI resource, answering the device's authentication challenge.
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self.client.get(&url).send().await?;

        let resp = if resp.status() == StatusCode::UNAUTHORIZED {
            let challenge = resp
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(digest::parse_challenge);

            match challenge {
                Some(Challenge::Digest(challenge)) => {
                    let header = challenge.authorization(
                        &self.credential.username,
                        self.credential.secret(),
                        "GET",
                        path,
                        &digest::generate_cnonce(),
                        1,
                    );
                    self.client.get(&url).header(AUTHORIZATION, header).send().await?
                }
                Some(Challenge::Basic) => {
                    self.client
                        .get(&url)
                        .basic_auth(&self.credential.username, Some(self.credential.secret()))
                        .send()
                        .await?
                }
                None => return Err(ApiError::Unauthorized(StatusCode::UNAUTHORIZED.as_u16())),
            }
        } else {
            resp
        };

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        // a 200 from something other than ISAPI (web login page, proxy) is not an answer
        match root_element(&body) {
            Some(root) if !root.eq_ignore_ascii_case("html") => Ok(body),
            _ => Err(ApiError::Malformed(format!("{} did not return an XML document", path))),
        }
    }
}

#[async_trait]
impl DeviceSession for IsapiSession {
    async fn device_info(&self) -> Result<Option<DeviceInfo>, ApiError> {
        let body = self.get(DEVICE_INFO_PATH).await?;
        Ok(parse_device_info(&body))
    }

    async fn time(&self) -> Result<Option<TimeInfo>, ApiError> {
        let body = self.get(TIME_PATH).await?;
        Ok(parse_time(&body))
    }

    async fn network_interface(&self, id: u32) -> Result<Option<InterfaceAddressing>, ApiError> {
        let body = self.get(&format!("{}/{}", INTERFACE_PATH, id)).await?;
        Ok(parse_interface(&body))
    }
}

/// Parse a `<DeviceInfo>` document.
pub fn parse_device_info(body: &str) -> Option<DeviceInfo> {
    let info = child_section(body, "DeviceInfo")?;
    Some(DeviceInfo {
        device_name: child_text(info, "deviceName"),
        model: child_text(info, "model"),
        serial_number: child_text(info, "serialNumber"),
        mac_address: child_text(info, "macAddress"),
    })
}

/// Parse a `<Time>` document.
pub fn parse_time(body: &str) -> Option<TimeInfo> {
    let time = child_section(body, "Time")?;
    Some(TimeInfo {
        time_mode: child_text(time, "timeMode"),
        local_time: child_text(time, "localTime"),
        time_zone: child_text(time, "timeZone"),
    })
}

/// Parse a `<NetworkInterface>` document. Requires the `<IPAddress>` block.
pub fn parse_interface(body: &str) -> Option<InterfaceAddressing> {
    let iface = child_section(body, "NetworkInterface")?;
    let addressing = child_section(iface, "IPAddress")?;
    Some(InterfaceAddressing {
        ip_address: child_text(addressing, "ipAddress"),
        subnet_mask: child_text(addressing, "subnetMask"),
        default_gateway: child_section(addressing, "DefaultGateway")
            .and_then(|gateway| child_text(gateway, "ipAddress")),
    })
}
