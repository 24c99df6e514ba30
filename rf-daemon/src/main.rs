//! refand - temperature-driven PWM fan control daemon
//!
//! Reads hwmon-style temperature sensors, maps each reading onto a duty
//! cycle through a per-fan linear curve with start/stop hysteresis, writes
//! the result to the fan's PWM control file, and verifies the write took
//! effect before trusting it.
//!
//! # Safety model
//! - **Write-then-verify**: every duty-cycle write is read back; a mismatch
//!   shuts the daemon down rather than leaving a fan at an unverified speed
//! - **Fail-fast**: sensor or actuator failures are never retried mid-loop
//! - **Clean handoff**: on any exit path (including crashes and fatal
//!   signals) every fan's mode switch is returned to the hardware's
//!   automatic control
//!
//! # Exit status
//! - `1` - no configuration file provided
//! - `2` - configuration unreadable, unparseable, or invalid
//! - `3` - hardware write/verify failure
//! - `128+N` - terminated by fatal signal N

mod config;
mod control_loop;
mod shutdown;

use std::path::{Path, PathBuf};
use std::process;

use tracing::{error, info};

use config::Config;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const EXIT_NO_CONFIG: i32 = 1;
const EXIT_BAD_CONFIG: i32 = 2;
const EXIT_HARDWARE: i32 = 3;

fn print_help() {
    eprintln!("refand {} - temperature-driven PWM fan control daemon", VERSION);
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("    refand [OPTIONS] CONFIG");
    eprintln!();
    eprintln!("ARGS:");
    eprintln!("    CONFIG              Path to the TOML configuration file");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("    -v, --version       Print version");
    eprintln!("    -h, --help          Print this help");
    eprintln!();
    eprintln!("ENVIRONMENT:");
    eprintln!("    REFAND_LOG          Log level (trace, debug, info, warn, error)");
    eprintln!();
    eprintln!("EXIT STATUS:");
    eprintln!("    1  no configuration provided");
    eprintln!("    2  configuration parse/validation failure");
    eprintln!("    3  hardware write or verify failure");
}

/// Log to the systemd journal when it is available, stdout otherwise.
fn init_logging() {
    let log_level = std::env::var("REFAND_LOG").unwrap_or_else(|_| "info".to_string());

    if Path::new("/run/systemd/journal/socket").exists() {
        match tracing_journald::layer() {
            Ok(journald_layer) => {
                use tracing_subscriber::prelude::*;
                tracing_subscriber::registry()
                    .with(journald_layer)
                    .with(tracing_subscriber::EnvFilter::new(&log_level))
                    .init();
                return;
            }
            Err(e) => {
                eprintln!("Failed to create journald layer: {}, falling back to stdout", e);
            }
        }
    }

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(&log_level)
        .init();
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                return;
            }
            "-v" | "--version" => {
                println!("refand {}", VERSION);
                return;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                process::exit(EXIT_NO_CONFIG);
            }
            arg => {
                if config_path.is_some() {
                    eprintln!("Multiple configuration paths given");
                    process::exit(EXIT_NO_CONFIG);
                }
                config_path = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    init_logging();
    info!("STARTUP: refand {} starting", VERSION);

    let Some(config_path) = config_path else {
        error!("No configuration file provided, exiting");
        process::exit(EXIT_NO_CONFIG);
    };

    let cfg = match Config::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Configuration loading failed, exiting");
            process::exit(EXIT_BAD_CONFIG);
        }
    };

    let mut units = match cfg.build_units() {
        Ok(units) => units,
        Err(e) => {
            error!(error = %e, "Fan setup failed, exiting");
            process::exit(EXIT_BAD_CONFIG);
        }
    };

    info!(
        fans = units.len(),
        config = %config_path.display(),
        "STARTUP: configuration loaded"
    );

    shutdown::install(&units);
    let mut reset = shutdown::reset_entries(&units);

    // The loop only comes back on a failed cycle; restore hardware control
    // before reporting the failure through the exit status.
    let err = match control_loop::run(&mut units, cfg.interval()) {
        Err(e) => e,
        Ok(()) => unreachable!("control loop never returns cleanly"),
    };

    error!(error = %err, "Control cycle failed, shutting down");
    shutdown::restore_automatic(&mut reset);
    process::exit(EXIT_HARDWARE);
}
