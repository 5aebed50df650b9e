//! tedium-probe
//!
//! Diagnostic tool for the Tedium X8 T1/E1 interface. Opens the device over
//! libusb and exercises the framer control and interrupt endpoints.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use common::{UsbHost, setup_logging};
use probe::config::{ProbeConfig, parse_hex_id};
use probe::usb::RusbHost;
use probe::{PollSummary, Poller, ProbeTarget, build_policy};
use protocol::HostCommand;
use std::io::{self, Write};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "tedium-probe")]
#[command(author, version, about = "Tedium X8 USB probe - poke the framer over USB")]
#[command(long_about = "
Opens the Tedium X8 by vendor/product ID, activates the framer control
interface and polls it with a register-read command, printing each response.
Transfer errors are printed and polling continues.

EXAMPLES:
    # Poll forever (Ctrl+C to stop)
    tedium-probe

    # Poll ten times with debug logging
    tedium-probe --log-level debug poll --count 10

    # Watch framer interrupt reports
    tedium-probe reports

    # Read and write single registers
    tedium-probe read-register 0x01fe
    tedium-probe write-register 0x0340 0x55

    # List attached USB devices
    tedium-probe --list-devices

CONFIGURATION:
    The probe looks for configuration files in the following order:
    1. Path specified with --config
    2. ~/.config/tedium-probe/probe.toml
    3. /etc/tedium-probe/probe.toml
    4. Built-in defaults from the device descriptor table
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<std::path::PathBuf>,

    /// Save default configuration to default location and exit
    #[arg(long)]
    save_config: bool,

    /// List USB devices and exit
    #[arg(long)]
    list_devices: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Vendor ID override (hex, e.g. 0x16d0)
    #[arg(long, value_name = "HEX")]
    vendor_id: Option<String>,

    /// Product ID override (hex, e.g. 0x0f3b)
    #[arg(long, value_name = "HEX")]
    product_id: Option<String>,

    /// Transfer timeout in milliseconds (0 = wait indefinitely)
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Args, Debug, Default)]
struct LoopArgs {
    /// Stop after this many iterations
    #[arg(long, value_name = "N")]
    count: Option<u64>,

    /// Sleep between iterations in milliseconds
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Stop when the device disconnects instead of retrying
    #[arg(long)]
    stop_on_disconnect: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the register-read command and print each response (default)
    Poll(LoopArgs),
    /// Write the command repeatedly without reading responses
    Write(LoopArgs),
    /// Print decoded framer interrupt reports
    Reports(LoopArgs),
    /// Read one framer register
    ReadRegister {
        #[arg(value_parser = parse_number::<u16>)]
        address: u16,
    },
    /// Write one framer register
    WriteRegister {
        #[arg(value_parser = parse_number::<u16>)]
        address: u16,
        #[arg(value_parser = parse_number::<u8>)]
        value: u8,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Handle --save-config flag early (before loading config)
    if args.save_config {
        let config = ProbeConfig::default();
        let path = ProbeConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path),
        None => ProbeConfig::load_or_default(),
    }
    .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args)?;

    // Use CLI log level if specified, otherwise use config value
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.probe.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("tedium-probe v{}", env!("CARGO_PKG_VERSION"));

    let host = RusbHost::new(config.device.detach_kernel_driver)
        .context("Failed to initialize libusb")?;

    if args.list_devices {
        return list_devices(&host, &config);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match args.command.unwrap_or(Command::Poll(LoopArgs::default())) {
        Command::Poll(loop_args) => {
            let mut poller = make_poller(&config, &loop_args);
            probe::run_poll(&host, config.target()?, &mut poller, &mut out)
                .context("Probe failed")?
        }
        Command::Write(loop_args) => {
            let mut poller = make_poller(&config, &loop_args);
            probe::run_write_only(&host, config.target()?, &mut poller, &mut out)
                .context("Write loop failed")?
        }
        Command::Reports(loop_args) => {
            let mut poller = make_poller(&config, &loop_args);
            probe::run_reports(&host, config.report_target()?, &mut poller, &mut out)
                .context("Report monitor failed")?
        }
        Command::ReadRegister { address } => {
            let command = HostCommand::RegisterRead { address };
            let value = probe::execute_command(&host, config.target()?, command)
                .context("Register read failed")?;
            if let Some(value) = value {
                writeln!(out, "{:#06x} = {:#04x}", address, value)?;
            }
            return Ok(());
        }
        Command::WriteRegister { address, value } => {
            let command = HostCommand::RegisterWrite { address, value };
            probe::execute_command(&host, config.target()?, command)
                .context("Register write failed")?;
            return Ok(());
        }
    };

    report_summary(&summary);
    Ok(())
}

fn apply_overrides(config: &mut ProbeConfig, args: &Args) -> Result<()> {
    if let Some(vid) = &args.vendor_id {
        parse_hex_id(vid, "--vendor-id")?;
        config.device.vendor_id = vid.clone();
    }
    if let Some(pid) = &args.product_id {
        parse_hex_id(pid, "--product-id")?;
        config.device.product_id = pid.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.device.timeout_ms = timeout_ms;
    }
    Ok(())
}

fn make_poller(
    config: &ProbeConfig,
    loop_args: &LoopArgs,
) -> Poller<Box<dyn probe::PollPolicy>> {
    let kind = if loop_args.stop_on_disconnect {
        probe::PolicyKind::StopOnDisconnect
    } else {
        config.poll.policy
    };
    let max_iterations = loop_args.count.or(config.poll.max_iterations);
    let interval = loop_args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.poll.interval());

    Poller::new(build_policy(kind, max_iterations), interval)
}

fn list_devices(host: &RusbHost, config: &ProbeConfig) -> Result<()> {
    let target: ProbeTarget = config.target()?;
    let devices = host.list_devices().context("Failed to enumerate devices")?;

    if devices.is_empty() {
        println!("No USB devices found.");
        return Ok(());
    }

    println!("Found {} USB device(s):\n", devices.len());
    for device in devices {
        let is_target =
            device.vendor_id == target.vendor_id && device.product_id == target.product_id;
        let marker = if is_target { "  <- target" } else { "" };
        println!(
            "  Bus {:03} Device {:03}: ID {:04x}:{:04x}{}",
            device.bus_number, device.address, device.vendor_id, device.product_id, marker
        );
    }
    Ok(())
}

fn report_summary(summary: &PollSummary) {
    info!(
        "Done: {} iterations, {} ok, {} failed",
        summary.iterations, summary.successes, summary.failures
    );
}

/// Parse a decimal or 0x-prefixed hex number
fn parse_number<T>(s: &str) -> std::result::Result<T, String>
where
    T: TryFrom<u32>,
{
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    }
    .map_err(|e| format!("invalid number '{}': {}", s, e))?;

    T::try_from(value).map_err(|_| format!("'{}' is out of range", s))
}
