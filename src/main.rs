//! procctl: process control from the command line.
//!
//! ```text
//! procctl pid                       print own PID
//! procctl kill <PID> [-s SIGNAL]    send a signal (default SIGTERM)
//! procctl probe <PID>               exit 0 if the process exists, 1 if not
//! procctl info                      platform capabilities as JSON
//! procctl run [-c FILE] [--daemon]  run until a shutdown signal arrives
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::json;

use procctl::observability::logging;
use procctl::signals::parse_signal;
use procctl::{Platform, ProcessControl};

#[derive(Parser)]
#[command(name = "procctl")]
#[command(about = "Process control: signals, daemonize, process titles", long_about = None)]
struct Cli {
    /// Log level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print this process's PID
    Pid,
    /// Send a signal to a process
    Kill {
        /// Target process ID
        pid: i32,
        /// Signal name or number (TERM, SIGHUP, 9, ...)
        #[arg(short, long, default_value = "TERM")]
        signal: String,
    },
    /// Check whether a process exists
    Probe {
        /// Process ID to probe
        pid: i32,
    },
    /// Show platform capabilities
    Info,
    /// Run until a shutdown signal arrives
    Run {
        /// Configuration file (TOML); reloaded on reload signals
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Detach from the terminal before starting
        #[arg(long)]
        daemon: bool,
        /// Process title, overrides the config file
        #[arg(long)]
        title: Option<String>,
    },
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Pid => {
            println!("{}", ProcessControl::get_pid());
        }
        Commands::Kill { pid, signal } => {
            logging::init(cli.log_level.as_deref().unwrap_or("warn"))?;
            let signal = parse_signal(&signal)?;
            ProcessControl::kill(pid, signal)?;
        }
        Commands::Probe { pid } => {
            let alive = ProcessControl::is_alive(pid);
            println!("{}", if alive { "alive" } else { "absent" });
            if !alive {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Info => {
            let platform = Platform::current();
            let info = json!({
                "pid": ProcessControl::get_pid(),
                "platform": platform,
                "title_supported": platform.supports_title(),
                "title": ProcessControl::title(),
                "fork_with_scheduler": platform.allows_fork_with_scheduler(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::Run {
            config,
            daemon,
            title,
        } => return run(config, daemon, title, cli.log_level),
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(unix)]
fn run(
    path: Option<PathBuf>,
    daemon: bool,
    title: Option<String>,
    log_level: Option<String>,
) -> Result<ExitCode, Box<dyn Error>> {
    use procctl::config::{load_config, ProcessConfig};
    use procctl::lifecycle::Runner;

    let mut config = match &path {
        Some(path) => load_config(path)?,
        None => ProcessConfig::default(),
    };
    if daemon {
        config.daemon.enabled = true;
    }
    if title.is_some() {
        config.process.title = title;
    }

    let level = log_level.unwrap_or_else(|| config.observability.log_level.clone());
    let log = logging::init(&level)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "procctl starting");

    let signal = Runner::new(config, path).with_logging(log).run()?;

    tracing::info!(signal, "Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

#[cfg(not(unix))]
fn run(
    _path: Option<PathBuf>,
    _daemon: bool,
    _title: Option<String>,
    _log_level: Option<String>,
) -> Result<ExitCode, Box<dyn Error>> {
    Err("procctl run needs POSIX signals".into())
}
