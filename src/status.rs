//! Beacon statistics and HTTP status endpoint.
//!
//! Provides a simple `/status` endpoint that returns the scheduler state and
//! beacon counters as JSON. Uses `tiny_http` on a background thread.
//!
//! # Example Response
//!
//! ```json
//! {
//!   "state": "running",
//!   "callsign": "N0CALL-9",
//!   "uptime_secs": 3600,
//!   "beacons_sent": 3,
//!   "send_errors": 1,
//!   "last_packet": "N0CALL-9>APRS,TCPIP*,qAC,CWOP-6:@181230z4107.40N/02730.00WrAPRS Beacon",
//!   "last_error": "connection failed: Connection refused (os error 111)"
//! }
//! ```

use crate::scheduler::Scheduler;
use log::{error, info, warn};
use serde::Serialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tiny_http::{Header, Method, Response, Server};

/// Default port for the status server.
pub const DEFAULT_STATUS_PORT: u16 = 8080;

/// Beacon counters shared between the worker and the status surfaces.
#[derive(Debug)]
pub struct BeaconStats {
    start_time: Instant,
    sent: AtomicUsize,
    errors: AtomicUsize,
    last_packet: Mutex<Option<String>>,
    last_error: Mutex<Option<String>>,
}

impl BeaconStats {
    /// Create zeroed statistics.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            sent: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            last_packet: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// Record a delivered beacon.
    pub fn record_sent(&self, report: &str) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last_packet.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(report.to_string());
    }

    /// Record a failed send.
    pub fn record_error(&self, reason: &str) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        *last = Some(reason.to_string());
    }

    /// Beacons delivered.
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    /// Sends that failed.
    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }

    /// Most recent delivered report.
    pub fn last_packet(&self) -> Option<String> {
        self.last_packet
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Most recent send error.
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Get uptime in seconds.
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

impl Default for BeaconStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view served by `/status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub state: &'static str,
    pub callsign: Option<String>,
    pub uptime_secs: u64,
    pub beacons_sent: usize,
    pub send_errors: usize,
    pub last_packet: Option<String>,
    pub last_error: Option<String>,
}

impl StatusSnapshot {
    /// Capture the scheduler's current state and counters.
    pub fn capture(scheduler: &Scheduler) -> Self {
        let stats = scheduler.stats();
        Self {
            state: scheduler.state().as_str(),
            callsign: scheduler.active_callsign(),
            uptime_secs: stats.uptime_secs(),
            beacons_sent: stats.sent(),
            send_errors: stats.errors(),
            last_packet: stats.last_packet(),
            last_error: stats.last_error(),
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            error!("Failed to serialize status: {}", e);
            "{}".to_string()
        })
    }
}

impl std::fmt::Display for StatusSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Beacon Status:")?;
        writeln!(f, "  State: {}", self.state)?;
        if let Some(callsign) = &self.callsign {
            writeln!(f, "  Callsign: {}", callsign)?;
        }
        writeln!(f, "  Uptime: {}s", self.uptime_secs)?;
        writeln!(f, "  Sent: {}  Errors: {}", self.beacons_sent, self.send_errors)?;
        if let Some(packet) = &self.last_packet {
            writeln!(f, "  Last packet: {}", packet)?;
        }
        if let Some(err) = &self.last_error {
            writeln!(f, "  Last error: {}", err)?;
        }
        Ok(())
    }
}

/// HTTP status server.
///
/// Runs in a background thread and serves [`StatusSnapshot`] as JSON.
pub struct StatusServer {
    /// Server thread handle.
    handle: Option<thread::JoinHandle<()>>,
    /// Flag to signal shutdown.
    shutdown: Arc<AtomicBool>,
    /// Bound address (port resolved when 0 was requested).
    addr: SocketAddr,
}

impl StatusServer {
    /// Start the status server.
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - IP address to bind to (use `None` for 127.0.0.1)
    /// * `port` - Port to listen on (0 picks a free port)
    /// * `scheduler` - Scheduler whose state is reported
    ///
    /// # Returns
    ///
    /// A handle to the running server. Drop it to stop the server.
    pub fn start(
        bind_addr: Option<IpAddr>,
        port: u16,
        scheduler: Arc<Scheduler>,
    ) -> Result<Self, std::io::Error> {
        let ip = bind_addr.unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));

        let server = Server::http((ip, port))
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, format!("{}", e)))?;
        let addr = server
            .server_addr()
            .to_ip()
            .unwrap_or_else(|| SocketAddr::new(ip, port));

        info!("Status server listening on http://{}/status", addr);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::spawn(move || {
            Self::run_server(server, scheduler, shutdown_clone);
        });

        Ok(Self {
            handle: Some(handle),
            shutdown,
            addr,
        })
    }

    /// Port the server is bound to.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Address the server is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn run_server(server: Server, scheduler: Arc<Scheduler>, shutdown: Arc<AtomicBool>) {
        let content_type =
            Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).expect("static header");
        let location = Header::from_bytes(&b"Location"[..], &b"/status"[..]).expect("static header");
        let allow_get = Header::from_bytes(&b"Allow"[..], &b"GET"[..]).expect("static header");

        loop {
            if shutdown.load(Ordering::Acquire) {
                info!("Status server shutting down");
                break;
            }

            match server.recv_timeout(Duration::from_millis(100)) {
                Ok(Some(request)) => {
                    if request.method() != &Method::Get {
                        let response = Response::from_string("Method Not Allowed")
                            .with_status_code(405)
                            .with_header(allow_get.clone());
                        let _ = request.respond(response);
                        continue;
                    }

                    let response = match request.url() {
                        "/status" | "/status/" => {
                            let json = StatusSnapshot::capture(&scheduler).to_json();
                            Response::from_string(json)
                                .with_header(content_type.clone())
                                .with_status_code(200)
                        }
                        "/" => Response::from_string("See /status for beacon status")
                            .with_status_code(302)
                            .with_header(location.clone()),
                        _ => Response::from_string("Not Found").with_status_code(404),
                    };

                    if let Err(e) = request.respond(response) {
                        warn!("Failed to send response: {}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Server error: {}", e);
                    break;
                }
            }
        }
    }

    /// Stop the server.
    ///
    /// Note: May take up to 100ms due to polling interval.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusServer {
    fn drop(&mut self) {
        self.stop();
    }
}
