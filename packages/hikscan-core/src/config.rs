//! Scan configuration.
//!
//! Settings are resolved with priority:
//! 1. Environment variables (`HIK_USER`, `HIK_PASSWORD`, ...)
//! 2. Config file (`~/.config/hikscan/config.toml`)
//! 3. Default values
//!
//! Command-line flags are applied on top by the CLI.

use crate::device_api::isapi::DEFAULT_HTTP_PORT;
use crate::scanner::network::DEFAULT_INTERFACE_IDS;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_USERNAME: &str = "admin";
pub const DEFAULT_PASSWORD: &str = "admin1234";
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_INPUT_FILE: &str = "ips.txt";
pub const DEFAULT_OUTPUT_FILE: &str = "camera_scanner_info.csv";
pub const DEFAULT_LOG_FILE: &str = "scan_log.txt";

const ENV_USER: &str = "HIK_USER";
const ENV_PASSWORD: &str = "HIK_PASSWORD";
const ENV_PORT: &str = "HIK_PORT";
const ENV_TIMEOUT: &str = "HIK_TIMEOUT_SECS";
const ENV_PASSWORD_COMMAND: &str = "HIK_PASSWORD_COMMAND";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    device: Option<DeviceSection>,
    scan: Option<ScanSection>,
}

#[derive(Debug, Deserialize, Default)]
struct DeviceSection {
    username: Option<String>,
    /// Fallback password, tried when the per-device password is rejected
    password: Option<String>,
    port: Option<u16>,
    timeout_secs: Option<u64>,
    /// Interface ids probed in order for addressing data
    interfaces: Option<Vec<u32>>,
    /// Program that prints a password for a device label
    password_command: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ScanSection {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

/// Where the device settings came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// At least one value from the config file
    ConfigFile,
    /// At least one value from an environment variable
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::ConfigFile => write!(f, "config file"),
            ConfigSource::Environment => write!(f, "environment variable"),
        }
    }
}

/// Settings used for every device in a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSettings {
    pub username: String,
    pub fallback_password: String,
    pub port: u16,
    /// Connect and response timeout for every call to one device
    pub timeout: Duration,
    pub interface_ids: Vec<u32>,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            username: DEFAULT_USERNAME.to_string(),
            fallback_password: DEFAULT_PASSWORD.to_string(),
            port: DEFAULT_HTTP_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            interface_ids: DEFAULT_INTERFACE_IDS.to_vec(),
        }
    }
}

/// Everything a scan run needs.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub device: DeviceSettings,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub password_command: Option<String>,
    pub source: ConfigSource,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            device: DeviceSettings::default(),
            input_path: PathBuf::from(DEFAULT_INPUT_FILE),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            password_command: None,
            source: ConfigSource::Default,
        }
    }
}

impl ScanConfig {
    /// Merge a parsed config file and an environment lookup over the defaults.
    pub fn from_sources(file: Option<ConfigFile>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ScanConfig::default();

        if let Some(file) = file {
            if let Some(device) = file.device {
                config.source = ConfigSource::ConfigFile;
                if let Some(username) = device.username.filter(|u| !u.trim().is_empty()) {
                    config.device.username = username.trim().to_string();
                }
                if let Some(password) = device.password {
                    config.device.fallback_password = password;
                }
                if let Some(port) = device.port {
                    config.device.port = port;
                }
                if let Some(secs) = device.timeout_secs.filter(|s| *s > 0) {
                    config.device.timeout = Duration::from_secs(secs);
                }
                if let Some(ids) = device.interfaces.filter(|ids| !ids.is_empty()) {
                    config.device.interface_ids = ids;
                }
                config.password_command = device.password_command.filter(|c| !c.trim().is_empty());
            }
            if let Some(scan) = file.scan {
                if let Some(input) = scan.input {
                    config.input_path = input;
                }
                if let Some(output) = scan.output {
                    config.output_path = output;
                }
                if let Some(log_file) = scan.log_file {
                    config.log_path = log_file;
                }
            }
        }

        let lookup = |key: &str| env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut from_env = false;

        if let Some(username) = lookup(ENV_USER) {
            config.device.username = username;
            from_env = true;
        }
        if let Some(password) = lookup(ENV_PASSWORD) {
            config.device.fallback_password = password;
            from_env = true;
        }
        if let Some(port) = lookup(ENV_PORT) {
            match port.parse() {
                Ok(port) => {
                    config.device.port = port;
                    from_env = true;
                }
                Err(e) => tracing::warn!("Ignoring {}='{}': {}", ENV_PORT, port, e),
            }
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT) {
            match timeout.parse::<u64>() {
                Ok(secs) if secs > 0 => {
                    config.device.timeout = Duration::from_secs(secs);
                    from_env = true;
                }
                _ => tracing::warn!("Ignoring {}='{}': not a positive integer", ENV_TIMEOUT, timeout),
            }
        }
        if let Some(command) = lookup(ENV_PASSWORD_COMMAND) {
            config.password_command = Some(command);
            from_env = true;
        }

        if from_env {
            config.source = ConfigSource::Environment;
        }

        config
    }
}

/// Get the path to the configuration file
fn get_config_file_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("hikscan").join("config.toml"))
}

/// Parse config file contents
pub fn parse_config_file(content: &str) -> Result<ConfigFile, toml::de::Error> {
    toml::from_str(content)
}

/// Load configuration from the config file
fn load_config_file() -> Option<ConfigFile> {
    let path = get_config_file_path()?;

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

/// Load scan configuration from the environment, config file and defaults
pub fn load_scan_config() -> ScanConfig {
    ScanConfig::from_sources(load_config_file(), |key| std::env::var(key).ok())
}

/// Get the config file path as a string for display
pub fn get_config_file_path_string() -> String {
    get_config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(unable to determine config directory)".to_string())
}

/// Generate example config file content
pub fn generate_example_config() -> String {
    format!(
        r#"# hikscan configuration
# Place this file at: {}

[device]
# Username for every device
username = "{}"
# Fallback password, tried when the per-device password is rejected
password = "{}"
# ISAPI HTTP port
port = {}
# Connect/response timeout per call, in seconds
timeout_secs = {}
# Network interface ids probed in order
interfaces = [1, 0]
# Optional program printing a password for a device label
# password_command = "/usr/local/bin/gen-camera-pass"

[scan]
input = "{}"
output = "{}"
log_file = "{}"
"#,
        get_config_file_path_string(),
        DEFAULT_USERNAME,
        DEFAULT_PASSWORD,
        DEFAULT_HTTP_PORT,
        DEFAULT_TIMEOUT_SECS,
        DEFAULT_INPUT_FILE,
        DEFAULT_OUTPUT_FILE,
        DEFAULT_LOG_FILE,
    )
}
