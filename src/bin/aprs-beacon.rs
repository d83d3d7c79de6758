//! APRS-IS beacon binary with an operator console.
//!
//! ```bash
//! cargo run --bin aprs-beacon -- --autostart
//! ```
//!
//! ## Console Commands
//!
//! Type `help` at the prompt. `start` validates the settings (including the
//! passcode), saves them and starts beaconing; `stop` halts it; `exit` or
//! Ctrl+C stops and quits.
//!
//! ## Endpoints
//!
//! - Status: http://localhost:8080/status

use aprs_beacon::aprs::PacketFormat;
use aprs_beacon::aprsis::{AprsIsServer, AprsIsTransmitter};
use aprs_beacon::config::IntervalPolicy;
use aprs_beacon::console::{Console, ConsoleCommand, ConsoleOutcome};
use aprs_beacon::scheduler::Scheduler;
use aprs_beacon::settings_store;
use aprs_beacon::status::{StatusServer, DEFAULT_STATUS_PORT};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Minimum-interval deployment profile.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Profile {
    /// 5 minute minimum
    Standard,
    /// 20 minute minimum
    Conservative,
}

#[derive(Parser)]
#[command(name = "aprs-beacon")]
#[command(about = "Periodic APRS-IS position beacon", version)]
struct Args {
    /// Settings file (default: ~/.aprs-beacon/settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Minimum beacon interval profile
    #[arg(long, value_enum, default_value = "standard")]
    profile: Profile,

    /// Minimum beacon interval in seconds, overriding --profile
    #[arg(long)]
    min_interval: Option<u64>,

    /// APRS-IS server as host or host:port
    #[arg(long, default_value = "rotate.aprs2.net:14580")]
    server: AprsIsServer,

    /// Port for the HTTP status endpoint
    #[arg(long, default_value_t = DEFAULT_STATUS_PORT)]
    status_port: u16,

    /// Do not start the HTTP status endpoint
    #[arg(long)]
    no_status: bool,

    /// Start beaconing immediately with the stored settings
    #[arg(long)]
    autostart: bool,

    /// Prefix the comment with '#'
    #[arg(long)]
    comment_marker: bool,
}

impl Args {
    fn policy(&self) -> IntervalPolicy {
        match (self.min_interval, self.profile) {
            (Some(secs), _) => IntervalPolicy::Custom(secs),
            (None, Profile::Standard) => IntervalPolicy::Standard,
            (None, Profile::Conservative) => IntervalPolicy::Conservative,
        }
    }

    fn format(&self) -> PacketFormat {
        if self.comment_marker {
            PacketFormat::CommentMarker
        } else {
            PacketFormat::Canonical
        }
    }
}

/// Print console output to stdout.
fn print_console(msg: &str) {
    println!("{}", msg);
    let _ = std::io::stdout().flush();
}

/// Print the prompt.
fn print_prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    info!("=== APRS Beacon starting ===");

    let settings_path = match args.settings.clone() {
        Some(path) => path,
        None => match settings_store::default_settings_path() {
            Ok(path) => path,
            Err(e) => {
                error!("Cannot locate settings file: {}", e);
                std::process::exit(1);
            }
        },
    };

    let settings = match settings_store::load_or_create_settings_at(&settings_path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("Failed to load settings from {:?}: {}", settings_path, e);
            std::process::exit(1);
        }
    };

    let policy = args.policy();
    info!("Minimum interval: {}s", policy.min_secs());

    let transmitter = AprsIsTransmitter::new(args.server.clone());
    info!("APRS-IS server: {}", transmitter.server());
    let scheduler = Arc::new(Scheduler::new(Arc::new(transmitter)));

    // Keep server alive - dropped at shutdown
    let status_server = if args.no_status {
        None
    } else {
        match StatusServer::start(None, args.status_port, scheduler.clone()) {
            Ok(server) => {
                info!(
                    "Status server at http://localhost:{}/status",
                    server.port()
                );
                Some(server)
            }
            Err(e) => {
                warn!("Failed to start status server: {}", e);
                None
            }
        }
    };

    let mut console = Console::new(
        scheduler.clone(),
        settings,
        settings_path,
        policy,
        args.format(),
    );

    print_console("");
    print_console("=== APRS Beacon ===");
    print_console("Type 'help' for commands");
    print_console("");

    if args.autostart {
        if let ConsoleOutcome::Continue(text) = console.handle(ConsoleCommand::Start) {
            print_console(&text);
        }
    }
    print_prompt();

    let cancel = CancellationToken::new();

    // Stdin is blocking; run the console on the blocking pool
    let stdin_cancel = cancel.clone();
    let _stdin_task = tokio::task::spawn_blocking(move || {
        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        while !stdin_cancel.is_cancelled() {
            match lines.next() {
                Some(Ok(line)) => match console.handle(ConsoleCommand::parse(&line)) {
                    ConsoleOutcome::Continue(text) => {
                        print_console(&text);
                        print_prompt();
                    }
                    ConsoleOutcome::Exit(text) => {
                        print_console(&text);
                        stdin_cancel.cancel();
                    }
                },
                Some(Err(e)) => {
                    warn!("Failed to read console input: {}", e);
                    break;
                }
                None => {
                    // Detached from a terminal; keep beaconing until a signal.
                    info!("Console input closed, Ctrl+C to exit");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            print_console("\nShutting down...");
        }
        _ = cancel.cancelled() => {}
    }
    cancel.cancel();

    let exit_scheduler = scheduler.clone();
    if let Err(e) = tokio::task::spawn_blocking(move || exit_scheduler.exit()).await {
        error!("Scheduler shutdown task failed: {}", e);
    }
    drop(status_server);

    info!("Shutdown complete");
    // The console thread may still be blocked on stdin.
    std::process::exit(0);
}
