use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::engine::SharedTracker;
use crate::util::Clock;

/// Whatever actually retunes the radio.
pub trait RadioControl: Send {
    fn set_channel(&mut self, channel: u8) -> Result<(), String>;
}

/// Doesn't touch hardware: logs every decision and remembers it. Used for replays, where
/// there is no radio to tune.
#[derive(Clone, Debug, Default)]
pub struct LoggingRadio {
    history: Arc<Mutex<Vec<u8>>>,
}

impl LoggingRadio {
    pub fn new() -> Self {
        LoggingRadio::default()
    }

    /// Every channel set so far, oldest first.
    pub fn history(&self) -> Vec<u8> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl RadioControl for LoggingRadio {
    fn set_channel(&mut self, channel: u8) -> Result<(), String> {
        info!("Tuning to channel {}", channel);
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(channel);
        Ok(())
    }
}

/// Runs the channel scheduler on its own thread and hands each hop to a [RadioControl].
pub struct ChannelHopper {
    handle: Option<thread::JoinHandle<()>>,
    alive: Arc<AtomicBool>,
}

impl Default for ChannelHopper {
    fn default() -> Self {
        ChannelHopper::new()
    }
}

impl ChannelHopper {
    pub fn new() -> ChannelHopper {
        ChannelHopper {
            handle: None,
            alive: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// `poll` is how often the scheduler is asked, not the dwell time.
    pub fn start(
        &mut self,
        tracker: SharedTracker,
        clock: Arc<dyn Clock>,
        mut radio: Box<dyn RadioControl>,
        poll: Duration,
    ) {
        if self.handle.is_some() {
            return;
        }
        self.alive.store(true, Ordering::SeqCst);
        let alive = self.alive.clone();

        self.handle = Some(thread::spawn(move || {
            let first = tracker.with(|tracker| tracker.current_channel());
            if let Err(e) = radio.set_channel(first) {
                warn!("Couldn't set channel {}: {}", first, e);
            }

            while alive.load(Ordering::SeqCst) {
                let now = clock.now_ms();
                if let Some(channel) = tracker.with(|tracker| tracker.tick(now)) {
                    if let Err(e) = radio.set_channel(channel) {
                        warn!("Couldn't set channel {}: {}", channel, e);
                    }
                }
                thread::sleep(poll);
            }
        }));
    }

    pub fn stop(&mut self) {
        self.alive.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Channel hop thread panicked");
            }
        }
    }
}

impl Drop for ChannelHopper {
    fn drop(&mut self) {
        self.stop();
    }
}
