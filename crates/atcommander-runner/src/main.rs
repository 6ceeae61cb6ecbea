//! `atcmd`: drive an RN-42 or XBee module's command mode from the host.
//!
//! ## Usage
//!
//! ```bash
//! # List available serial ports
//! atcmd --list-ports
//!
//! # Find the module's baud rate and switch it to 115200
//! atcmd --port /dev/ttyUSB0 --platform xbee enter set-baud=115200
//!
//! # Same session against a simulated RN-42 listening at 38400
//! atcmd --simulate 38400 enter set-baud=115200 reboot
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use atcommander::sim::SimulatedModule;
use atcommander::{AtCommander, PlatformKind};
use atcommander_runner::config::RunnerConfig;
use atcommander_runner::error::{RunnerError, RunnerResult};
use atcommander_runner::{run_session, serial, Action};
use clap::{ArgAction, Parser};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "atcmd", version, about = "Drive AT command mode devices over a serial port")]
struct Cli {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port, overriding the config file.
    #[arg(short, long)]
    port: Option<String>,

    /// Device family (rn42 or xbee), overriding the config file.
    #[arg(long)]
    platform: Option<PlatformKind>,

    /// Comma separated baud rates to sweep, overriding the config file.
    #[arg(long, value_delimiter = ',')]
    baud_rates: Option<Vec<u32>>,

    /// Talk to a simulated module listening at this baud rate.
    #[arg(long, value_name = "BAUD")]
    simulate: Option<u32>,

    /// List serial ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Actions to run in order: enter, exit, store, reboot, set-baud=<BAUD>.
    actions: Vec<Action>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> RunnerResult<RunnerConfig> {
    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if let Some(port) = &cli.port {
        config.port = Some(port.clone());
    }
    if let Some(platform) = cli.platform {
        config.commander.platform = platform;
    }
    if let Some(baud_rates) = &cli.baud_rates {
        config.commander.baud_rates = baud_rates.clone();
    }
    Ok(config)
}

fn run(cli: Cli) -> RunnerResult<()> {
    if cli.list_ports {
        return serial::list_ports();
    }

    let config = load_config(&cli)?;
    let platform = config.commander.platform.descriptor();

    let (transport, module) = match cli.simulate {
        Some(baud) => {
            info!("simulating {} at baud {}", platform.name, baud);
            let module = SimulatedModule::shared(platform, baud);
            (SimulatedModule::transport(&module), Some(module))
        }
        None => {
            let path = config.port.as_deref().ok_or(RunnerError::NoPort)?;
            let initial_baud = config.commander.baud_rates.first().copied().unwrap_or(9600);
            let port = serial::open(
                path,
                initial_baud,
                Duration::from_millis(config.read_timeout_ms),
            )?;
            info!("opened {}", path);
            (serial::serial_transport(port), None)
        }
    };

    let mut commander = AtCommander::from_settings(&config.commander, transport);
    let result = run_session(&mut commander, &cli.actions);

    if let Some(module) = module {
        let module = module.borrow();
        let written = String::from_utf8_lossy(module.written()).into_owned();
        info!(
            baud = module.baud(),
            configured_baud = module.configured_baud(),
            stored_baud = ?module.stored_baud(),
            reboots = module.reboots(),
            written = %written.escape_debug(),
            "simulated module state"
        );
    }
    result
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
