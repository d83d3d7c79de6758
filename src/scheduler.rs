//! Beacon scheduler.
//!
//! Owns the Idle/Running state and the worker thread that transmits one
//! beacon every interval.
//!
//! # Cancellation
//!
//! Stopping is cooperative. [`Scheduler::stop`] clears the run flag and
//! returns immediately; the worker notices within one poll interval (one
//! second by default) while waiting, and never interrupts a send that is
//! already in flight. Worst-case time to a fully stopped worker is therefore
//! the send timeout plus the poll interval.
//!
//! Every run gets its own flag. A worker left over from a previous run keeps
//! its (cleared) flag, so a quick Stop/Start never resurrects it and at most
//! one loop is ever sending.
//!
//! # Example
//!
//! ```no_run
//! use aprs_beacon::aprsis::{AprsIsServer, AprsIsTransmitter};
//! use aprs_beacon::config::BeaconSettings;
//! use aprs_beacon::scheduler::Scheduler;
//! use aprs_beacon::{IntervalPolicy, PacketFormat};
//! use std::sync::Arc;
//!
//! let scheduler = Scheduler::new(Arc::new(AprsIsTransmitter::new(AprsIsServer::rotate())));
//! let config = BeaconSettings::default()
//!     .to_config(IntervalPolicy::Standard, PacketFormat::Canonical)?;
//! scheduler.start(config);
//! // ...
//! scheduler.exit();
//! # Ok::<(), aprs_beacon::ConfigError>(())
//! ```

use crate::aprs::BeaconPacket;
use crate::aprsis::Transmit;
use crate::config::BeaconConfig;
use crate::status::BeaconStats;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How often the worker checks the run flag while waiting.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// No beacon loop is active.
    Idle,
    /// A beacon loop is active.
    Running,
}

impl SchedulerState {
    /// Lowercase name for status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
        }
    }
}

impl std::fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One started loop.
struct Run {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    callsign: String,
}

/// Clears the run flag when the worker exits, including by panic.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Periodic beacon scheduler.
///
/// Construct once per process and share behind an `Arc`; all methods take
/// `&self`.
pub struct Scheduler {
    transmitter: Arc<dyn Transmit>,
    stats: Arc<BeaconStats>,
    poll_interval: Duration,
    current: Mutex<Option<Run>>,
}

impl Scheduler {
    /// Create an idle scheduler sending through `transmitter`.
    pub fn new(transmitter: Arc<dyn Transmit>) -> Self {
        Self {
            transmitter,
            stats: Arc::new(BeaconStats::new()),
            poll_interval: DEFAULT_POLL_INTERVAL,
            current: Mutex::new(None),
        }
    }

    /// Override the run-flag poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Shared beacon statistics.
    pub fn stats(&self) -> Arc<BeaconStats> {
        self.stats.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Run>> {
        // A poisoned lock only means a previous holder panicked; the data is
        // still a plain Option.
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current state.
    pub fn state(&self) -> SchedulerState {
        match self.lock().as_ref() {
            Some(run) if run.running.load(Ordering::Acquire) => SchedulerState::Running,
            _ => SchedulerState::Idle,
        }
    }

    /// Returns true while a beacon loop is active.
    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    /// Callsign of the active run, if any.
    pub fn active_callsign(&self) -> Option<String> {
        match self.lock().as_ref() {
            Some(run) if run.running.load(Ordering::Acquire) => Some(run.callsign.clone()),
            _ => None,
        }
    }

    /// Start beaconing with `config`.
    ///
    /// Returns `false` without doing anything if a loop is already running.
    /// The config is not validated here; callers validate before starting.
    pub fn start(&self, config: BeaconConfig) -> bool {
        let mut current = self.lock();

        if let Some(run) = current.as_ref() {
            if run.running.load(Ordering::Acquire) {
                debug!("Start ignored, beacon already running");
                return false;
            }
        }

        // Reap a finished worker; one still finishing its last send is
        // detached and exits on its own cleared flag.
        if let Some(previous) = current.take() {
            if previous.handle.is_finished() && previous.handle.join().is_err() {
                warn!("Previous beacon thread panicked");
            }
        }

        let running = Arc::new(AtomicBool::new(true));
        let callsign = config.callsign.clone();
        let worker = Worker {
            config,
            running: running.clone(),
            transmitter: self.transmitter.clone(),
            stats: self.stats.clone(),
            poll_interval: self.poll_interval,
        };

        let handle = thread::Builder::new()
            .name("beacon".to_string())
            .spawn(move || worker.run());

        match handle {
            Ok(handle) => {
                info!("Beacon started.");
                *current = Some(Run {
                    running,
                    handle,
                    callsign,
                });
                true
            }
            Err(e) => {
                warn!("Failed to spawn beacon thread: {}", e);
                false
            }
        }
    }

    /// Stop beaconing.
    ///
    /// Returns whether a loop was running. Does not wait for the worker.
    pub fn stop(&self) -> bool {
        let was_running = match self.lock().as_ref() {
            Some(run) => run.running.swap(false, Ordering::AcqRel),
            None => false,
        };
        info!("Beacon stopped.");
        was_running
    }

    /// Stop and wait for the worker to finish.
    ///
    /// Blocks for at most the send timeout plus one poll interval.
    pub fn exit(&self) {
        self.stop();
        let run = self.lock().take();
        if let Some(run) = run {
            if run.handle.join().is_err() {
                warn!("Beacon thread panicked");
            }
        }
        info!("Scheduler shut down");
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(run) = self.lock().as_ref() {
            run.running.store(false, Ordering::Release);
        }
    }
}

/// State moved into the worker thread.
struct Worker {
    config: BeaconConfig,
    running: Arc<AtomicBool>,
    transmitter: Arc<dyn Transmit>,
    stats: Arc<BeaconStats>,
    poll_interval: Duration,
}

impl Worker {
    fn run(self) {
        let _guard = RunGuard(self.running.clone());
        info!(
            "Beacon loop for {} every {}s",
            self.config.callsign, self.config.interval_secs
        );

        while self.running.load(Ordering::Acquire) {
            let packet = BeaconPacket::build(&self.config);
            match self.transmitter.send(&packet) {
                Ok(()) => self.stats.record_sent(&packet.report),
                // Already logged by the transmitter; skip this cycle.
                Err(e) => self.stats.record_error(&e.to_string()),
            }

            if !self.wait(self.config.interval()) {
                break;
            }
        }

        debug!("Beacon loop for {} exited", self.config.callsign);
    }

    /// Sleep for `interval`, checking the run flag every poll interval.
    ///
    /// Returns `false` as soon as the flag is cleared. An interval too large
    /// to represent as a deadline waits until stopped.
    fn wait(&self, interval: Duration) -> bool {
        let deadline = Instant::now().checked_add(interval);
        loop {
            if !self.running.load(Ordering::Acquire) {
                return false;
            }
            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return true;
                    }
                    self.poll_interval.min(deadline - now)
                }
                None => self.poll_interval,
            };
            thread::sleep(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aprs::compute_passcode;
    use crate::aprsis::TransmitError;
    use std::io;
    use std::sync::atomic::AtomicUsize;

    const POLL: Duration = Duration::from_millis(20);

    /// Counts sends, optionally failing every one of them.
    struct MockTransmitter {
        sent: AtomicUsize,
        fail: bool,
    }

    impl MockTransmitter {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                sent: AtomicUsize::new(0),
                fail,
            })
        }

        fn count(&self) -> usize {
            self.sent.load(Ordering::SeqCst)
        }
    }

    impl Transmit for MockTransmitter {
        fn send(&self, _packet: &BeaconPacket) -> Result<(), TransmitError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TransmitError::Connection(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "simulated",
                )))
            } else {
                Ok(())
            }
        }
    }

    fn config(interval_secs: u64) -> BeaconConfig {
        BeaconConfig::new("N0CALL", compute_passcode("N0CALL").to_string(), 1.0, 2.0)
            .with_interval(interval_secs)
    }

    fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn test_starts_idle() {
        let scheduler = Scheduler::new(MockTransmitter::new(false));
        assert_eq!(scheduler.state(), SchedulerState::Idle);
        assert!(!scheduler.stop());
        assert_eq!(scheduler.active_callsign(), None);
    }

    #[test]
    fn test_start_sends_immediately() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        assert!(scheduler.start(config(600)));
        assert!(scheduler.is_running());
        assert_eq!(scheduler.active_callsign().as_deref(), Some("N0CALL"));
        assert!(wait_for(|| mock.count() == 1));
        assert!(wait_for(|| scheduler.stats().sent() == 1));

        scheduler.exit();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_double_start_runs_one_loop() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        assert!(scheduler.start(config(600)));
        assert!(!scheduler.start(config(600)));
        assert!(wait_for(|| mock.count() >= 1));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(mock.count(), 1);

        scheduler.exit();
    }

    #[test]
    fn test_stop_during_wait_is_prompt() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        scheduler.start(config(600));
        assert!(wait_for(|| mock.count() == 1));

        let started = Instant::now();
        assert!(scheduler.stop());
        scheduler.exit();
        assert!(started.elapsed() < Duration::from_secs(1));

        thread::sleep(Duration::from_millis(100));
        assert_eq!(mock.count(), 1);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn test_repeats_every_interval() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        scheduler.start(config(1));
        assert!(wait_for(|| mock.count() >= 3));
        scheduler.exit();

        let after_exit = mock.count();
        thread::sleep(Duration::from_millis(1200));
        assert_eq!(mock.count(), after_exit);
    }

    #[test]
    fn test_send_failure_keeps_running() {
        let mock = MockTransmitter::new(true);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        scheduler.start(config(1));
        let stats = scheduler.stats();
        assert!(wait_for(|| stats.errors() >= 2));
        assert!(mock.count() >= 2);
        assert!(scheduler.is_running());

        assert_eq!(stats.sent(), 0);
        assert!(stats.last_error().unwrap().contains("simulated"));

        scheduler.exit();
    }

    #[test]
    fn test_restart_after_stop() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        scheduler.start(config(600));
        assert!(wait_for(|| mock.count() == 1));
        scheduler.stop();

        assert!(scheduler.start(config(600)));
        assert!(wait_for(|| mock.count() == 2));
        thread::sleep(Duration::from_millis(100));
        assert_eq!(mock.count(), 2);

        scheduler.exit();
    }

    #[test]
    fn test_panicking_transmitter_returns_to_idle() {
        struct Panics;
        impl Transmit for Panics {
            fn send(&self, _packet: &BeaconPacket) -> Result<(), TransmitError> {
                panic!("transmitter bug");
            }
        }

        let scheduler = Scheduler::new(Arc::new(Panics)).with_poll_interval(POLL);
        scheduler.start(config(600));
        assert!(wait_for(|| !scheduler.is_running()));

        // The panicked worker is reaped and a new run can start
        assert!(wait_for(|| scheduler
            .lock()
            .as_ref()
            .map_or(true, |run| run.handle.is_finished())));
        assert!(scheduler.start(config(600)));
        assert!(wait_for(|| !scheduler.is_running()));
        scheduler.exit();
    }

    #[test]
    fn test_unrepresentable_interval_waits_until_stopped() {
        let mock = MockTransmitter::new(false);
        let scheduler = Scheduler::new(mock.clone()).with_poll_interval(POLL);

        scheduler.start(config(u64::MAX));
        assert!(wait_for(|| mock.count() == 1));
        thread::sleep(Duration::from_millis(100));
        assert!(scheduler.is_running());
        assert_eq!(mock.count(), 1);

        scheduler.exit();
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    /// Records which callsign each send came from and holds every send.
    struct SlowTransmitter {
        delay: Duration,
        senders: Mutex<Vec<String>>,
    }

    impl SlowTransmitter {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                senders: Mutex::new(Vec::new()),
            })
        }

        fn sends_from(&self, callsign: &str) -> usize {
            self.senders
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.as_str() == callsign)
                .count()
        }
    }

    impl Transmit for SlowTransmitter {
        fn send(&self, packet: &BeaconPacket) -> Result<(), TransmitError> {
            let callsign = packet.report.split('>').next().unwrap_or("").to_string();
            self.senders.lock().unwrap().push(callsign);
            thread::sleep(self.delay);
            Ok(())
        }
    }

    #[test]
    fn test_restart_during_send_leaves_one_loop() {
        let slow = SlowTransmitter::new(Duration::from_millis(300));
        let scheduler = Scheduler::new(slow.clone()).with_poll_interval(POLL);
        let passcode = compute_passcode("N0CALL").to_string();

        let first = BeaconConfig::new("N0CALL-1", passcode.clone(), 1.0, 2.0).with_interval(1);
        assert!(scheduler.start(first));
        // First send is now in flight
        assert!(wait_for(|| slow.sends_from("N0CALL-1") == 1));

        assert!(scheduler.stop());
        let second = BeaconConfig::new("N0CALL-2", passcode, 1.0, 2.0).with_interval(1);
        assert!(scheduler.start(second));
        assert_eq!(scheduler.active_callsign().as_deref(), Some("N0CALL-2"));

        // Long enough for the old worker to finish its send and for the new
        // loop to complete a second cycle
        thread::sleep(Duration::from_millis(1800));
        assert!(scheduler.is_running());
        scheduler.exit();

        assert_eq!(slow.sends_from("N0CALL-1"), 1);
        assert!(slow.sends_from("N0CALL-2") >= 2);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SchedulerState::Running.to_string(), "running");
        assert_eq!(SchedulerState::Idle.as_str(), "idle");
    }
}
