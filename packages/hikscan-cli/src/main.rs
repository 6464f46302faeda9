//! hikscan CLI - inventory a fleet of Hikvision cameras
//!
//! This binary:
//! - Reads a list of `address,label` lines
//! - Authenticates to each camera over ISAPI
//! - Collects identity, clock and network configuration
//! - Writes one CSV row per camera

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hikscan_core::config::{self, ScanConfig};
use hikscan_core::credentials::{CommandResolver, CredentialResolver, FallbackResolver};
use hikscan_core::device_api::IsapiConnector;
use hikscan_core::scan::{self, ProgressCallback, ScanProgress};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hikscan")]
#[command(version)]
#[command(about = "Inventory Hikvision cameras into a CSV file")]
#[command(long_about = "
hikscan reads a device list, logs in to every camera over ISAPI and writes
one CSV row per camera with its identity, clock state and network settings.

Device list format (one camera per line):
  192.168.1.64,lobby-dome
  192.168.1.65,parking-bullet

Quick start:
  1. Check settings:  hikscan config
  2. Run a scan:      hikscan scan --input ips.txt --output inventory.csv
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan every device in the list and write the inventory
    Scan(ScanArgs),

    /// Show configuration paths and settings
    Config,
}

#[derive(clap::Args, Default)]
pub struct ScanArgs {
    /// Device list (address,label per line)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// CSV file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Log file (appended)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Username for every device
    #[arg(short, long)]
    user: Option<String>,

    /// ISAPI HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Program printing the password for a device label
    #[arg(long)]
    password_command: Option<String>,
}

impl ScanArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    fn apply(self, config: &mut ScanConfig) {
        if let Some(input) = self.input {
            config.input_path = input;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(log_file) = self.log_file {
            config.log_path = log_file;
        }
        if let Some(user) = self.user {
            config.device.username = user;
        }
        if let Some(port) = self.port {
            config.device.port = port;
        }
        if let Some(secs) = self.timeout.filter(|s| *s > 0) {
            config.device.timeout = Duration::from_secs(secs);
        }
        if let Some(command) = self.password_command {
            config.password_command = Some(command);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_file = logging::init(cli.verbose);

    match cli.command {
        Commands::Scan(args) => {
            let mut config = config::load_scan_config();
            args.apply(&mut config);
            log_file.attach(&config.log_path);
            cmd_scan(cli.format, &config).await
        }
        Commands::Config => {
            log_file.detach();
            cmd_config(cli.format)
        }
    }
}

fn build_resolver(config: &ScanConfig) -> Result<Box<dyn CredentialResolver>> {
    match &config.password_command {
        Some(command) => {
            let resolver = CommandResolver::from_command_line(command)
                .context("Invalid password command")?;
            tracing::info!("Resolving per-device passwords with '{}'", resolver.program());
            Ok(Box::new(resolver))
        }
        None => Ok(Box::new(FallbackResolver::new(
            config.device.fallback_password.clone(),
        ))),
    }
}

async fn cmd_scan(format: OutputFormat, config: &ScanConfig) -> Result<()> {
    if let OutputFormat::Text = format {
        println!("Starting Hikvision inventory scan...");
    }

    let resolver = build_resolver(config)?;
    let connector = IsapiConnector::new(config.device.port);

    let progress_callback: Option<ProgressCallback> = match format {
        OutputFormat::Text => Some(Box::new(|progress: &ScanProgress| {
            println!(
                "  [{}/{}] {} ({})",
                progress.index, progress.total, progress.label, progress.address
            );
        })),
        OutputFormat::Json => None,
    };

    let started_at = chrono::Local::now();
    let report = scan::run_inventory(config, &connector, resolver.as_ref(), progress_callback)
        .await
        .context("Scan aborted")?;

    let Some(report) = report else {
        match format {
            OutputFormat::Text => println!("Device list is empty, nothing to scan."),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({
                    "status": "empty",
                    "input": config.input_path.display().to_string(),
                }));
            }
        }
        return Ok(());
    };

    match format {
        OutputFormat::Text => {
            println!();
            println!(
                "Scanned {} devices in {:.1}s (started {})",
                report.summary.devices,
                report.elapsed_secs,
                started_at.format("%Y-%m-%d %H:%M:%S")
            );
            println!();
            for record in &report.records {
                println!(
                    "  {:15} {:8} {:8} {:20} {}",
                    record.address,
                    format!("{:?}", record.status),
                    record.coverage().to_string(),
                    record.model,
                    record.clock_status
                );
            }
            println!();
            println!(
                "Authenticated: {}  Complete: {}  Partial: {}  Failed: {}",
                report.summary.authenticated,
                report.summary.complete,
                report.summary.partial,
                report.summary.failed
            );
            println!("Inventory written to {}", config.output_path.display());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "status": "complete",
                "started_at": started_at.to_rfc3339(),
                "elapsed_secs": report.elapsed_secs,
                "output": config.output_path.display().to_string(),
                "summary": report.summary,
                "records": report.records,
            }));
        }
    }

    Ok(())
}

fn cmd_config(format: OutputFormat) -> Result<()> {
    let config = config::load_scan_config();
    let config_path = config::get_config_file_path_string();

    match format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:      {}", config_path);
            println!("Settings source:  {}", config.source);
            println!("Username:         {}", config.device.username);
            println!("Port:             {}", config.device.port);
            println!("Timeout:          {}s", config.device.timeout.as_secs());
            println!("Interfaces:       {:?}", config.device.interface_ids);
            println!(
                "Password command: {}",
                config.password_command.as_deref().unwrap_or("-")
            );
            println!("Input:            {}", config.input_path.display());
            println!("Output:           {}", config.output_path.display());
            println!("Log file:         {}", config.log_path.display());
            println!();
            println!("Environment variables:");
            println!("  HIK_USER             - Username for every device");
            println!("  HIK_PASSWORD         - Fallback password");
            println!("  HIK_PORT             - ISAPI HTTP port");
            println!("  HIK_TIMEOUT_SECS     - Per-call timeout");
            println!("  HIK_PASSWORD_COMMAND - Per-device password generator");
            println!();
            println!("Example config.toml:");
            println!();
            println!("{}", config::generate_example_config());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "config_file": config_path,
                "source": config.source.to_string(),
                "username": config.device.username,
                "port": config.device.port,
                "timeout_secs": config.device.timeout.as_secs(),
                "interfaces": config.device.interface_ids,
                "password_command": config.password_command,
                "input": config.input_path.display().to_string(),
                "output": config.output_path.display().to_string(),
                "log_file": config.log_path.display().to_string(),
            }));
        }
    }

    Ok(())
}
