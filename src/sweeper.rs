use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::engine::{SharedTracker, SweepReport};
use crate::util::Clock;

/// How often the thread wakes up to check the flag and the clock.
const WAKE_INTERVAL: Duration = Duration::from_millis(100);

/// Quiet unless the sweep removed something.
pub fn log_sweep(report: &SweepReport) {
    if report.access_points + report.clients > 0 || report.target_expired {
        info!(
            "Evicted {} access points and {} clients{}",
            report.access_points,
            report.clients,
            if report.target_expired {
                ", target lost"
            } else {
                ""
            }
        );
    }
}

/// Calls [Tracker::sweep](crate::engine::Tracker::sweep) on a fixed period.
pub struct Sweeper {
    handle: Option<thread::JoinHandle<()>>,
    alive: Arc<AtomicBool>,
}

impl Default for Sweeper {
    fn default() -> Self {
        Sweeper::new()
    }
}

impl Sweeper {
    pub fn new() -> Sweeper {
        Sweeper {
            handle: None,
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    pub fn start(&mut self, tracker: SharedTracker, clock: Arc<dyn Clock>, interval_ms: u64) {
        if self.handle.is_some() {
            return;
        }
        self.alive.store(true, Ordering::SeqCst);
        let alive = self.alive.clone();

        self.handle = Some(thread::spawn(move || {
            let mut last_sweep = clock.now_ms();
            while alive.load(Ordering::SeqCst) {
                let now = clock.now_ms();
                if now.saturating_sub(last_sweep) >= interval_ms {
                    last_sweep = now;
                    let report = tracker.with(|tracker| tracker.sweep(now));
                    log_sweep(&report);
                }
                thread::sleep(WAKE_INTERVAL);
            }
        }));
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
