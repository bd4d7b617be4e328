//! parkgate - headless monitor for RFID parking gate terminals.
//!
//! ```text
//! parkgate monitor --port /dev/ttyUSB0 --allow 93064AFC
//! parkgate replay capture.log --allow 93064AFC --json
//! parkgate ports
//! ```
//!
//! Logs go to stderr and honour `RUST_LOG`; events go to stdout.

mod output;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tokio_util::codec::FramedRead;
use tracing::{info, warn};

use parkgate_core::MonitorConfig;
use parkgate_monitor::{Monitor, MonitorSignal, SignalReceiver};
use parkgate_protocol::StatusLineCodec;
use parkgate_serial::{ConnectionSupervisor, LinkSettings, SerialPortOpener, available_ports};

use crate::output::Format;

/// Headless monitor for RFID parking gate terminals.
#[derive(Parser, Debug)]
#[command(name = "parkgate", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to a terminal and print events as they arrive.
    Monitor {
        #[command(flatten)]
        config: ConfigArgs,

        /// Serial device (e.g. /dev/ttyUSB0 or COM3).
        #[arg(long)]
        port: Option<String>,

        /// Baud rate.
        #[arg(long)]
        baud: Option<u32>,

        /// Read timeout in milliseconds.
        #[arg(long = "timeout-ms")]
        timeout_ms: Option<u64>,
    },
    /// Feed recorded captures through the monitor and print the result.
    Replay {
        #[command(flatten)]
        config: ConfigArgs,

        /// Capture files, processed in order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List serial devices.
    Ports,
}

/// Options shared by commands that run a monitor.
#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Authorized credential (repeatable, added to the configured list).
    #[arg(long = "allow", value_name = "UID")]
    allow: Vec<String>,

    /// Occupancy shown before the first event.
    #[arg(long)]
    starting_places: Option<u32>,

    /// Print signals and the summary as JSON.
    #[arg(long)]
    json: bool,
}

impl ConfigArgs {
    /// Load the configuration file (or defaults) and apply overrides.
    fn load(&self) -> anyhow::Result<MonitorConfig> {
        let mut config = match &self.config {
            Some(path) => MonitorConfig::from_path(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => MonitorConfig::default(),
        };

        config.allow_list.extend(self.allow.iter().cloned());
        if let Some(places) = self.starting_places {
            config.starting_places = places;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor {
            config,
            port,
            baud,
            timeout_ms,
        } => {
            let format = Format::from_flag(config.json);
            let mut settings = config.load()?;
            if port.is_some() {
                settings.serial.port = port;
            }
            if let Some(baud) = baud {
                settings.serial.baud_rate = baud;
            }
            if let Some(timeout_ms) = timeout_ms {
                settings.serial.read_timeout_ms = timeout_ms;
            }
            settings.validate()?;
            run_monitor(&settings, format).await
        }
        Commands::Replay { config, files } => {
            let format = Format::from_flag(config.json);
            let settings = config.load()?;
            settings.validate()?;
            run_replay(&settings, &files, format).await
        }
        Commands::Ports => {
            let ports = available_ports().context("enumerating serial ports")?;
            if ports.is_empty() {
                warn!("No serial ports found");
            }
            for port in ports {
                println!("{port}");
            }
            Ok(())
        }
    }
}

async fn run_monitor(config: &MonitorConfig, format: Format) -> anyhow::Result<()> {
    let Some(link) = LinkSettings::from_config(&config.serial) else {
        bail!("no serial port given; use --port or set serial.port in the config file");
    };

    let (monitor, mut signals) = Monitor::new(config);
    let view = monitor.view();
    let mut supervisor = ConnectionSupervisor::new(SerialPortOpener, monitor);
    supervisor.connect(link)?;

    // Ctrl-C or a lost link ends the session.
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            signal = signals.recv() => {
                let Some(signal) = signal else { break };
                println!("{}", format.signal(&signal)?);
                if matches!(signal, MonitorSignal::ConnectionError(_)) {
                    break;
                }
            }
        }
    }

    tokio::task::block_in_place(|| supervisor.disconnect());
    print_pending(&mut signals, format)?;
    println!("{}", format.summary(&view)?);
    Ok(())
}

async fn run_replay(
    config: &MonitorConfig,
    files: &[PathBuf],
    format: Format,
) -> anyhow::Result<()> {
    let (monitor, mut signals) = Monitor::new(config);

    for path in files {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        info!(path = %path.display(), "Replaying capture");

        let mut lines = FramedRead::new(file, StatusLineCodec::new());
        while let Some(line) = lines.next().await {
            let line = line.with_context(|| format!("reading {}", path.display()))?;
            monitor.ingest(line);
            print_pending(&mut signals, format)?;
        }
    }

    println!("{}", format.summary(&monitor.view())?);
    Ok(())
}

/// Print every signal already queued.
fn print_pending(signals: &mut SignalReceiver, format: Format) -> anyhow::Result<()> {
    while let Ok(signal) = signals.try_recv() {
        println!("{}", format.signal(&signal)?);
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
