//! appsflyer-relay - deliver track events to the AppsFlyer in-app events API
//!
//! This tool provides commands for:
//! - Checking destination configuration
//! - Previewing the request a track message would produce
//! - Sending a track message
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/appsflyer-relay/config.toml (~/.config/appsflyer-relay/config.toml)
//! - Logs: $XDG_STATE_HOME/appsflyer-relay/ (~/.local/state/appsflyer-relay/)

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use appsflyer_relay_core::{message, AppsFlyer, Config, DeliveryOutcome, Event, Preview};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "appsflyer-relay")]
#[command(about = "Deliver track events to AppsFlyer")]
#[command(version)]
struct Args {
    /// Verbose output (writes a log file)
    #[arg(short, long)]
    verbose: bool,

    /// Config file to use instead of the XDG default
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show destination configuration
    Status,

    /// Validate a track message and print the request it would produce
    Preview {
        /// JSON file holding the track message, or "-" for stdin
        input: PathBuf,
    },

    /// Validate and deliver a track message
    Send {
        /// JSON file holding the track message, or "-" for stdin
        input: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    // Initialize logging if verbose
    let _log_guard = if args.verbose {
        Some(
            appsflyer_relay_core::logging::init(&config.logging)
                .context("failed to initialize logging")?,
        )
    } else {
        None
    };

    tracing::debug!("appsflyer-relay starting");

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Preview { input } => cmd_preview(&config, &input),
        Command::Send { input } => cmd_send(&config, &input),
    }
}

fn cmd_status(config: &Config) -> Result<ExitCode> {
    println!("AppsFlyer Destination Configuration");
    println!("===================================");
    println!();

    let settings = &config.appsflyer;
    println!(
        "Dev Key:         {}",
        if settings.has_dev_key() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!(
        "Apple App ID:    {}",
        settings.apple_app_id().unwrap_or("<not set>")
    );
    println!(
        "Android App ID:  {}",
        settings.android_app_id().unwrap_or("<not set>")
    );
    println!("Base URL:        {}", config.transport.base_url);
    println!("Timeout:         {}s", config.transport.timeout_secs);
    println!(
        "Max Retries:     {}",
        appsflyer_relay_core::dispatch::MAX_RETRIES
    );
    println!(
        "Log File:        {}",
        appsflyer_relay_core::logging::log_file_path().display()
    );

    println!();
    if !settings.has_dev_key() {
        println!("Status: Not ready (dev key missing). Add it to config.toml:");
        println!();
        println!("  [appsflyer]");
        println!("  dev_key = \"xxxxxxxxxxxxxxxxxxxxxx\"");
        println!("  apple_app_id = \"123456789\"");
        println!("  android_app_id = \"com.example.app\"");
    } else if settings.apple_app_id().is_none() && settings.android_app_id().is_none() {
        println!("Status: Not ready (configure at least one app ID)");
    } else {
        println!("Status: Ready to deliver");
    }

    Ok(ExitCode::SUCCESS)
}

fn cmd_preview(config: &Config, input: &Path) -> Result<ExitCode> {
    let event = read_event(input)?;
    let adapter = AppsFlyer::from_config(config).context("failed to create adapter")?;

    match adapter.preview(&event) {
        Ok(Preview::Deliverable(outbound)) => {
            println!("POST {}", adapter.dispatcher().url_for(&outbound.endpoint));
            println!("Device Type: {}", outbound.device_type);
            println!();
            println!("{}", serde_json::to_string_pretty(&outbound.payload)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(Preview::Rejected(reason)) => {
            println!("Rejected: {}", reason);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            eprintln!("Invalid: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("failed to build payload"),
    }
}

fn cmd_send(config: &Config, input: &Path) -> Result<ExitCode> {
    let event = read_event(input)?;
    let adapter = AppsFlyer::from_config(config).context("failed to create adapter")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    match runtime.block_on(adapter.deliver(&event)) {
        Ok(DeliveryOutcome::Delivered { status }) => {
            println!("Delivered ({})", status);
            Ok(ExitCode::SUCCESS)
        }
        Ok(DeliveryOutcome::Rejected(reason)) => {
            println!("Rejected: {}", reason);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_validation() => {
            eprintln!("Invalid: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) if e.is_delivery() => {
            eprintln!("Delivery failed, retry later: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("failed to deliver event"),
    }
}

/// Read and decode a track message from a file or stdin
fn read_event(input: &Path) -> Result<Event> {
    let content = if input.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    message::parse_track(&content).context("failed to decode track message")
}
