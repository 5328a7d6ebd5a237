use libwifi::error::Error;
use log::warn;
use std::sync::Arc;
use std::time::Duration;

use crate::capture::CapturedFrame;
use crate::engine::SharedTracker;
use crate::hopper::RadioControl;
use crate::sweeper::log_sweep;
use crate::util::{Clock, ReplayClock};

/// Feeds a recorded capture through the tracker on the capture's own timeline.
///
/// Engine time is the offset of each frame's timestamp from the first frame's, so a file
/// replayed at full speed ages and evicts devices exactly as it would have live. Hops and
/// sweeps are driven from the same timeline, ahead of the frame that moved it.
pub struct ReplayDriver {
    tracker: SharedTracker,
    radio: Box<dyn RadioControl>,
    clock: Arc<ReplayClock>,
    origin: Option<Duration>,
    sweep_interval_ms: u64,
    last_sweep: u64,
    frames: u64,
}

impl ReplayDriver {
    pub fn new(
        tracker: SharedTracker,
        mut radio: Box<dyn RadioControl>,
        clock: Arc<ReplayClock>,
        sweep_interval_ms: u64,
    ) -> Self {
        let first = tracker.with(|tracker| tracker.current_channel());
        if let Err(e) = radio.set_channel(first) {
            warn!("Couldn't set channel {}: {}", first, e);
        }

        ReplayDriver {
            last_sweep: clock.now_ms(),
            tracker,
            radio,
            clock,
            origin: None,
            sweep_interval_ms,
            frames: 0,
        }
    }

    /// Frames fed so far, rejected ones included.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Where `timestamp` lands on the replay timeline. The first call fixes the origin.
    pub fn timeline_ms(&mut self, timestamp: Duration) -> u64 {
        let origin = *self.origin.get_or_insert(timestamp);
        let offset = u64::try_from(timestamp.saturating_sub(origin).as_millis()).unwrap_or(u64::MAX);
        self.clock.advance_to(offset)
    }

    /// Advance the timeline to the frame, run whatever hop or sweep falls due, then hand the
    /// frame to the tracker. The classification error, if any, is passed back.
    pub fn feed(&mut self, frame: &CapturedFrame) -> Result<(), Error> {
        let now = self.timeline_ms(frame.timestamp);
        self.frames += 1;

        let sweep_due = now.saturating_sub(self.last_sweep) >= self.sweep_interval_ms;
        if sweep_due {
            self.last_sweep = now;
        }

        let (hop, sweep, result) = self.tracker.with(|tracker| {
            let hop = tracker.tick(now);
            let sweep = sweep_due.then(|| tracker.sweep(now));
            (hop, sweep, tracker.handle_frame(&frame.as_raw(), now))
        });

        if let Some(channel) = hop {
            if let Err(e) = self.radio.set_channel(channel) {
                warn!("Couldn't set channel {}: {}", channel, e);
            }
        }
        if let Some(report) = sweep {
            log_sweep(&report);
        }
        result
    }
}
