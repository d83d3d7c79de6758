//! Operator console.
//!
//! Line-oriented control surface for the beacon: edit settings, start and
//! stop the scheduler, and preview what would be sent.
//!
//! # Commands
//!
//! - `start` - Validate settings, save them, start beaconing
//! - `stop` - Stop beaconing
//! - `status` - Show scheduler state and counters
//! - `show` - Show current settings
//! - `set <KEY> <value>` - Change a setting (not applied until next start)
//! - `preview` - Show the login line and report that would be sent now
//! - `passcode <callsign>` - Compute the APRS-IS passcode for a callsign
//! - `help` - Show available commands
//! - `exit` - Stop beaconing and quit
//!
//! # Example Session
//!
//! ```text
//! > set callsign N0CALL-9
//! CALLSIGN = N0CALL-9
//! > passcode N0CALL-9
//! Passcode for N0CALL: 13023
//! > set passcode 13023
//! PASSCODE = *****
//! > start
//! Beacon started for N0CALL-9 every 1200s
//! ```

use crate::aprs::{base_callsign, compute_passcode, BeaconPacket, PacketFormat};
use crate::config::{BeaconSettings, IntervalPolicy};
use crate::scheduler::Scheduler;
use crate::settings_store;
use crate::status::StatusSnapshot;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// Parsed console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Validate, save and start.
    Start,
    /// Stop beaconing.
    Stop,
    /// Show scheduler status.
    Status,
    /// Show current settings.
    Show,
    /// Change one setting.
    Set { key: String, value: String },
    /// Show the packet that would be sent.
    Preview,
    /// Compute a passcode.
    Passcode { callsign: String },
    /// Show help.
    Help,
    /// Stop and quit.
    Exit,
    /// Unknown or invalid command.
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse a command from input line.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            return ConsoleCommand::Unknown(String::new());
        }

        let mut parts = input.splitn(2, ' ');
        let cmd = parts.next().unwrap_or("");
        let args = parts.next().unwrap_or("").trim();

        match cmd.to_lowercase().as_str() {
            "start" | "go" => ConsoleCommand::Start,
            "stop" | "halt" => ConsoleCommand::Stop,
            "status" | "stat" | "s" => ConsoleCommand::Status,
            "show" | "settings" | "ls" => ConsoleCommand::Show,
            "set" => {
                let mut set_parts = args.splitn(2, ' ');
                let key = set_parts.next().unwrap_or("").to_string();
                // The value keeps inner spaces (comments) but not surrounding ones.
                let value = set_parts.next().unwrap_or("").trim().to_string();
                if key.is_empty() {
                    ConsoleCommand::Unknown("Usage: set <KEY> <value>".to_string())
                } else {
                    ConsoleCommand::Set { key, value }
                }
            }
            "preview" | "p" => ConsoleCommand::Preview,
            "passcode" | "pass" => {
                if args.is_empty() {
                    ConsoleCommand::Unknown("Usage: passcode <callsign>".to_string())
                } else {
                    ConsoleCommand::Passcode {
                        callsign: args.to_string(),
                    }
                }
            }
            "help" | "h" | "?" => ConsoleCommand::Help,
            "exit" | "quit" | "q" => ConsoleCommand::Exit,
            _ => ConsoleCommand::Unknown(format!(
                "Unknown command: {}. Type 'help' for commands.",
                cmd
            )),
        }
    }
}

/// Help text for available commands.
pub const HELP_TEXT: &str = r#"
Available commands:
  start                Validate and save settings, then start beaconing
  stop                 Stop beaconing
  status               Show beacon status
  show                 Show current settings
  set <KEY> <value>    Change a setting (CALLSIGN, PASSCODE, LAT, LON,
                       TABLE, SYMBOL, COMMENT, INTERVAL)
  preview              Show the packet that would be sent now
  passcode <callsign>  Compute the APRS-IS passcode for a callsign
  help                 Show this help
  exit                 Stop beaconing and quit

Shortcuts: s=status, p=preview, h=help, q=exit
"#;

/// What the caller should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutcome {
    /// Print the text and keep reading.
    Continue(String),
    /// Print the text and shut down.
    Exit(String),
}

/// Console state: the settings being edited and the scheduler they drive.
pub struct Console {
    scheduler: Arc<Scheduler>,
    settings: BeaconSettings,
    settings_path: PathBuf,
    policy: IntervalPolicy,
    format: PacketFormat,
}

impl Console {
    /// Create a console editing `settings`, saved to `settings_path` on start.
    pub fn new(
        scheduler: Arc<Scheduler>,
        settings: BeaconSettings,
        settings_path: PathBuf,
        policy: IntervalPolicy,
        format: PacketFormat,
    ) -> Self {
        Self {
            scheduler,
            settings,
            settings_path,
            policy,
            format,
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &BeaconSettings {
        &self.settings
    }

    /// Run one command.
    pub fn handle(&mut self, command: ConsoleCommand) -> ConsoleOutcome {
        let text = match command {
            ConsoleCommand::Start => self.start(),
            ConsoleCommand::Stop => {
                if self.scheduler.stop() {
                    "Beacon stopped".to_string()
                } else {
                    "Beacon is not running".to_string()
                }
            }
            ConsoleCommand::Status => StatusSnapshot::capture(&self.scheduler).to_string(),
            ConsoleCommand::Show => format!("Settings ({:?}):\n{}", self.settings_path, self.settings),
            ConsoleCommand::Set { key, value } => match self.settings.set(&key, value) {
                Ok(()) => {
                    let key = key.to_uppercase();
                    let shown = if key == "PASSCODE" {
                        "*****"
                    } else {
                        self.settings.get(&key).unwrap_or("")
                    };
                    format!("{} = {}", key, shown)
                }
                Err(e) => format!("Error: {}", e),
            },
            ConsoleCommand::Preview => match self.settings.to_config(self.policy, self.format) {
                Ok(config) => {
                    let packet = BeaconPacket::build(&config);
                    format!("{}\n{}", packet.login, packet.report)
                }
                Err(e) => format!("Error: {}", e),
            },
            ConsoleCommand::Passcode { callsign } => format!(
                "Passcode for {}: {}",
                base_callsign(&callsign),
                compute_passcode(&callsign)
            ),
            ConsoleCommand::Help => HELP_TEXT.to_string(),
            ConsoleCommand::Exit => {
                self.scheduler.exit();
                return ConsoleOutcome::Exit("Exiting".to_string());
            }
            ConsoleCommand::Unknown(msg) => msg,
        };
        ConsoleOutcome::Continue(text)
    }

    /// Validate, persist, then start.
    fn start(&mut self) -> String {
        if self.scheduler.is_running() {
            return "Beacon already running".to_string();
        }

        let config = match self.settings.to_config(self.policy, self.format) {
            Ok(config) => config,
            Err(e) => return format!("Error: {}", e),
        };

        if let Err(e) = settings_store::save_settings_to(&self.settings, &self.settings_path) {
            warn!("Failed to save settings: {}", e);
            return format!("Error: failed to save settings: {}", e);
        }

        let summary = format!(
            "Beacon started for {} every {}s",
            config.callsign, config.interval_secs
        );
        if self.scheduler.start(config) {
            info!("{}", summary);
            summary
        } else {
            "Beacon already running".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aprsis::{Transmit, TransmitError};
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    struct CountingTransmitter(AtomicUsize);

    impl Transmit for CountingTransmitter {
        fn send(&self, _packet: &BeaconPacket) -> Result<(), TransmitError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn test_console() -> (Console, PathBuf) {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir()
            .join(format!("aprs-beacon-console-{}-{}", std::process::id(), id))
            .join("settings.json");
        let scheduler = Arc::new(Scheduler::new(Arc::new(CountingTransmitter(
            AtomicUsize::new(0),
        ))));
        let console = Console::new(
            scheduler,
            BeaconSettings::default(),
            path.clone(),
            IntervalPolicy::Standard,
            PacketFormat::Canonical,
        );
        (console, path)
    }

    fn text(outcome: ConsoleOutcome) -> String {
        match outcome {
            ConsoleOutcome::Continue(t) | ConsoleOutcome::Exit(t) => t,
        }
    }

    // ==================== Parsing ====================

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(ConsoleCommand::parse("start"), ConsoleCommand::Start);
        assert_eq!(ConsoleCommand::parse(" STOP "), ConsoleCommand::Stop);
        assert_eq!(ConsoleCommand::parse("s"), ConsoleCommand::Status);
        assert_eq!(ConsoleCommand::parse("show"), ConsoleCommand::Show);
        assert_eq!(ConsoleCommand::parse("p"), ConsoleCommand::Preview);
        assert_eq!(ConsoleCommand::parse("?"), ConsoleCommand::Help);
        assert_eq!(ConsoleCommand::parse("q"), ConsoleCommand::Exit);
    }

    #[test]
    fn test_parse_set_keeps_inner_spaces() {
        assert_eq!(
            ConsoleCommand::parse("set comment  Hello from   Rust "),
            ConsoleCommand::Set {
                key: "comment".to_string(),
                value: "Hello from   Rust".to_string()
            }
        );
        assert!(matches!(
            ConsoleCommand::parse("set"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_passcode() {
        assert_eq!(
            ConsoleCommand::parse("passcode n0call-9"),
            ConsoleCommand::Passcode {
                callsign: "n0call-9".to_string()
            }
        );
        assert!(matches!(
            ConsoleCommand::parse("passcode"),
            ConsoleCommand::Unknown(_)
        ));
    }

    #[test]
    fn test_parse_unknown_and_empty() {
        assert!(matches!(ConsoleCommand::parse("reboot"), ConsoleCommand::Unknown(_)));
        assert!(matches!(ConsoleCommand::parse("   "), ConsoleCommand::Unknown(_)));
    }

    // ==================== Handling ====================

    #[test]
    fn test_passcode_command() {
        let (mut console, _) = test_console();
        let out = text(console.handle(ConsoleCommand::parse("passcode n0call-9")));
        assert_eq!(out, "Passcode for N0CALL: 13023");
    }

    #[test]
    fn test_start_rejects_default_passcode() {
        let (mut console, path) = test_console();
        let out = text(console.handle(ConsoleCommand::Start));
        assert!(out.contains("passcode is invalid"), "{}", out);
        assert!(!console.scheduler.is_running());
        assert!(!path.exists());
    }

    #[test]
    fn test_set_then_start_saves_and_runs() {
        let (mut console, path) = test_console();
        console.handle(ConsoleCommand::parse("set callsign N0CALL-9"));
        let out = text(console.handle(ConsoleCommand::parse("set passcode 13023")));
        assert_eq!(out, "PASSCODE = *****");

        let out = text(console.handle(ConsoleCommand::Start));
        assert_eq!(out, "Beacon started for N0CALL-9 every 1200s");
        assert!(console.scheduler.is_running());

        let saved = settings_store::load_settings_from(&path).unwrap();
        assert_eq!(saved.callsign, "N0CALL-9");

        let out = text(console.handle(ConsoleCommand::Start));
        assert_eq!(out, "Beacon already running");

        let outcome = console.handle(ConsoleCommand::Exit);
        assert_eq!(outcome, ConsoleOutcome::Exit("Exiting".to_string()));
        assert!(!console.scheduler.is_running());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_start_not_attempted_when_save_fails() {
        let (mut console, path) = test_console();
        // A plain file where the settings directory should be
        let dir = path.parent().unwrap().to_path_buf();
        std::fs::create_dir_all(dir.parent().unwrap()).unwrap();
        std::fs::write(&dir, "not a directory").unwrap();

        console.handle(ConsoleCommand::parse("set callsign N0CALL-9"));
        console.handle(ConsoleCommand::parse("set passcode 13023"));
        let out = text(console.handle(ConsoleCommand::Start));
        assert!(out.starts_with("Error: failed to save settings"), "{}", out);
        assert!(!console.scheduler.is_running());

        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn test_start_rejects_short_interval() {
        let (mut console, _) = test_console();
        console.handle(ConsoleCommand::parse("set callsign N0CALL"));
        console.handle(ConsoleCommand::parse("set passcode 13023"));
        console.handle(ConsoleCommand::parse("set interval 60"));
        let out = text(console.handle(ConsoleCommand::Start));
        assert_eq!(out, "Error: interval too short: 60s (min 300s)");
    }

    #[test]
    fn test_set_unknown_key() {
        let (mut console, _) = test_console();
        let out = text(console.handle(ConsoleCommand::parse("set altitude 100")));
        assert_eq!(out, "Error: unknown setting: altitude");
    }

    #[test]
    fn test_preview() {
        let (mut console, _) = test_console();
        console.handle(ConsoleCommand::parse("set callsign N0CALL"));
        console.handle(ConsoleCommand::parse("set passcode 13023"));
        let out = text(console.handle(ConsoleCommand::Preview));
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("user N0CALL pass 13023 vers "));
        assert!(lines[1].starts_with("N0CALL>APRS,TCPIP*,qAC,CWOP-6:@"));
        assert!(lines[1].ends_with("4100.00N/02700.00ErAPRS Beacon"));
    }

    #[test]
    fn test_stop_when_idle() {
        let (mut console, _) = test_console();
        let out = text(console.handle(ConsoleCommand::Stop));
        assert_eq!(out, "Beacon is not running");
    }
}
