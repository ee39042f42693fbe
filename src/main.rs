//! deskreg - drive a desktop window registry from a command script
//!
//! Reads commands from a script file (or stdin), applies them to one
//! registry, and prints the resulting window stack.
//!
//! # Quick Start
//!
//! ```text
//! deskreg session.txt        # Run a script, then list windows
//! deskreg -q < session.txt   # Read from stdin, no final listing
//! deskreg -z 0 session.txt   # Count z values up from 0
//! ```
//!
//! # Commands
//!
//! | Command | Action |
//! |---------|--------|
//! | open ID TITLE X Y W H [minimized] [maximized] | Open or bring to front |
//! | close ID | Remove window |
//! | minimize ID / maximize ID | Minimize / toggle maximized |
//! | restore ID / focus ID | Bring to front |
//! | move ID X Y / resize ID W H | Geometry |
//! | list / stats | Window table / collected metrics |

use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use deskreg::config::{self, Config as DeskregConfig};
use deskreg::shell::{format_listing, Shell};
use deskreg::wm::{MetricsObserver, TracingObserver, WindowRegistry};

/// Command line options
#[derive(Default)]
struct Config {
    /// Explicit config file
    config_path: Option<PathBuf>,
    /// Overrides `initial_z_index` from the config file
    initial_z: Option<u64>,
    /// Skip the final listing
    quiet: bool,
    /// Write the effective config to ~/.deskreg/config.toml and exit
    init_config: bool,
    /// Script file; stdin when absent
    script: Option<PathBuf>,
}

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_version() {
    eprintln!("deskreg {}", VERSION);
}

fn print_help() {
    eprintln!("deskreg {} - Desktop window registry driver", VERSION);
    eprintln!();
    eprintln!("Usage: deskreg [OPTIONS] [SCRIPT]");
    eprintln!();
    eprintln!("Reads commands from SCRIPT, or stdin when no script is given.");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -c, --config <FILE>   Use this config file instead of ~/.deskreg/config.toml");
    eprintln!("  -z, --initial-z <N>   Starting value of the z counter (default: 100)");
    eprintln!("  -q, --quiet           Do not list windows after the script");
    eprintln!("      --init-config     Write the effective config to ~/.deskreg/config.toml");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  open <id> <title> <x> <y> <w> <h> [minimized] [maximized]");
    eprintln!("  close <id>            Remove a window");
    eprintln!("  minimize <id>         Minimize (drops focus)");
    eprintln!("  maximize <id>         Toggle maximized");
    eprintln!("  restore <id>          Un-minimize and bring to front");
    eprintln!("  focus <id>            Bring to front");
    eprintln!("  move <id> <x> <y>     Move a window");
    eprintln!("  resize <id> <w> <h>   Resize a window");
    eprintln!("  list                  Show windows back to front");
    eprintln!("  stats                 Show collected metrics");
    eprintln!();
    eprintln!("Titles with spaces must be double-quoted. Lines starting with # are ignored.");
    eprintln!();
    eprintln!("Configuration: ~/.deskreg/config.toml");
    eprintln!("Log file:      ~/.deskreg/deskreg.log");
}

fn parse_args() -> Result<Config, String> {
    let args: Vec<String> = env::args().collect();
    let mut config = Config::default();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing config file argument".to_string());
                }
                config.config_path = Some(PathBuf::from(&args[i]));
            }
            "-z" | "--initial-z" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing initial z argument".to_string());
                }
                let value = args[i]
                    .parse()
                    .map_err(|_| format!("Invalid initial z: {}", args[i]))?;
                config.initial_z = Some(value);
            }
            "-q" | "--quiet" => {
                config.quiet = true;
            }
            "--init-config" => {
                config.init_config = true;
            }
            arg if arg.starts_with('-') && arg != "-" => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
            arg => {
                if config.script.is_some() {
                    return Err(format!("Unexpected argument: {}", arg));
                }
                if arg != "-" {
                    config.script = Some(PathBuf::from(arg));
                }
            }
        }
        i += 1;
    }

    Ok(config)
}

/// Log to ~/.deskreg/deskreg.log; RUST_LOG overrides the configured level
fn init_logging(level: &str) {
    let log_path = config::data_dir()
        .map(|dir| dir.join("deskreg.log"))
        .unwrap_or_else(|| PathBuf::from("deskreg.log"));

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let cli = match parse_args() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    let mut settings = match &cli.config_path {
        Some(path) => DeskregConfig::load_from(path)?,
        None => DeskregConfig::load(),
    };
    if let Some(z) = cli.initial_z {
        settings.initial_z_index = z;
    }

    init_logging(&settings.log_level);
    info!("deskreg starting...");

    if cli.init_config {
        let path = settings.save()?;
        eprintln!("Wrote {}", path.display());
        return Ok(());
    }

    run(&cli, &settings)
}

fn run(cli: &Config, settings: &DeskregConfig) -> anyhow::Result<()> {
    let mut registry = WindowRegistry::new(settings.initial_z_index);
    info!("Initial z index: {}", settings.initial_z_index);

    if settings.telemetry.tracing {
        registry.add_observer(TracingObserver);
    }
    let metrics = if settings.telemetry.metrics {
        let observer = MetricsObserver::new();
        let handle = observer.handle();
        registry.add_observer(observer);
        Some(handle)
    } else {
        None
    };

    {
        let mut shell = Shell::new(&mut registry, settings.listing.title_width);
        if let Some(handle) = metrics {
            shell = shell.with_metrics(handle);
        }

        let script = match &cli.script {
            Some(path) => {
                info!("Script: {}", path.display());
                std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read script {}", path.display()))?
            }
            None => io::read_to_string(io::stdin()).context("Failed to read commands from stdin")?,
        };

        if let Err(e) = shell.run_lines(script.lines(), |out| println!("{}", out)) {
            error!("{}", e);
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    if !cli.quiet {
        for line in format_listing(&registry, settings.listing.title_width) {
            println!("{}", line);
        }
    }

    info!("Finished with {} window(s)", registry.len());
    Ok(())
}
