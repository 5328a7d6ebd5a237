use log::{trace, warn};
use std::collections::BTreeSet;

use crate::config::{is_valid_channel, ConfigError, MAX_CHANNEL, MIN_CHANNEL};

const CHANNEL_COUNT: usize = (MAX_CHANNEL - MIN_CHANNEL + 1) as usize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelStats {
    pub channel: u8,
    /// Beacons heard on this channel since the last reset.
    pub ap_count: u32,
    pub frame_count: u64,
    pub last_activity: u64,
}

impl ChannelStats {
    fn reset(&mut self) {
        self.ap_count = 0;
        self.frame_count = 0;
        self.last_activity = 0;
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"channel\": {},\"ap_count\": {},\"frame_count\": {},\"last_activity\": {}}}",
            self.channel, self.ap_count, self.frame_count, self.last_activity
        )
    }
}

/// Per channel counters for channels 1 to 13. Anything else is rejected at the door.
#[derive(Clone, Debug)]
pub struct ChannelActivity {
    stats: [ChannelStats; CHANNEL_COUNT],
    /// Out of range channels already reported.
    ignored: BTreeSet<u8>,
}

impl Default for ChannelActivity {
    fn default() -> Self {
        let mut stats = [ChannelStats::default(); CHANNEL_COUNT];
        for (channel, slot) in (MIN_CHANNEL..=MAX_CHANNEL).zip(stats.iter_mut()) {
            slot.channel = channel;
        }
        ChannelActivity {
            stats,
            ignored: BTreeSet::new(),
        }
    }
}

impl ChannelActivity {
    pub fn new() -> Self {
        ChannelActivity::default()
    }

    fn slot_mut(&mut self, channel: u8) -> Option<&mut ChannelStats> {
        if !is_valid_channel(channel) {
            if self.ignored.insert(channel) {
                warn!("Ignoring activity on channel {}, only 1-13 are tracked", channel);
            } else {
                trace!("Ignoring activity on channel {}", channel);
            }
            return None;
        }
        self.stats.get_mut((channel - MIN_CHANNEL) as usize)
    }

    pub fn get(&self, channel: u8) -> Option<&ChannelStats> {
        if !is_valid_channel(channel) {
            return None;
        }
        self.stats.get((channel - MIN_CHANNEL) as usize)
    }

    pub fn all(&self) -> &[ChannelStats] {
        &self.stats
    }

    /// Count one frame. Returns `false` for channels outside 1-13.
    pub fn record_frame(&mut self, channel: u8, now: u64) -> bool {
        match self.slot_mut(channel) {
            Some(slot) => {
                slot.frame_count = slot.frame_count.saturating_add(1);
                slot.last_activity = now;
                true
            }
            None => false,
        }
    }

    pub fn record_ap(&mut self, channel: u8) -> bool {
        match self.slot_mut(channel) {
            Some(slot) => {
                slot.ap_count = slot.ap_count.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Zero the counters of every channel untouched for more than `idle_ms`.
    /// Channels that were already zeroed are left alone. Returns how many were reset.
    pub fn reset_stale(&mut self, now: u64, idle_ms: u64) -> usize {
        let mut reset = 0;
        for slot in self.stats.iter_mut() {
            let active = slot.frame_count > 0 || slot.ap_count > 0;
            if active && now.saturating_sub(slot.last_activity) > idle_ms {
                slot.reset();
                reset += 1;
            }
        }
        reset
    }

    /// The channel with the most frames, lowest channel on ties. `None` when everything is quiet.
    pub fn busiest(&self) -> Option<&ChannelStats> {
        self.stats
            .iter()
            .filter(|slot| slot.frame_count > 0)
            .fold(None, |best: Option<&ChannelStats>, slot| match best {
                Some(best) if best.frame_count >= slot.frame_count => Some(best),
                _ => Some(slot),
            })
    }

    pub fn get_all_json(&self) -> String {
        self.stats
            .iter()
            .map(ChannelStats::to_json_str)
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Decides when to leave the current channel and where to go.
///
/// The scheduler never touches a radio. Whoever drives it hands the returned channel to a
/// [RadioControl](crate::hopper::RadioControl).
#[derive(Clone, Debug)]
pub struct ChannelScheduler {
    channels: Vec<u8>,
    position: usize,
    last_switch: u64,
    dwell_ms: u64,
}

impl ChannelScheduler {
    pub fn new(channels: Vec<u8>, dwell_ms: u64, now: u64) -> Result<Self, ConfigError> {
        if channels.is_empty() {
            return Err(ConfigError::EmptyHopList);
        }
        if let Some(&channel) = channels.iter().find(|ch| !is_valid_channel(**ch)) {
            return Err(ConfigError::InvalidChannel(channel));
        }
        if dwell_ms == 0 {
            return Err(ConfigError::Zero("dwell_ms"));
        }

        Ok(ChannelScheduler {
            channels,
            position: 0,
            last_switch: now,
            dwell_ms,
        })
    }

    pub fn current_channel(&self) -> u8 {
        self.channels[self.position]
    }

    /// Hop to the next channel in the list once the dwell time has passed.
    pub fn tick(&mut self, now: u64) -> Option<u8> {
        if now.saturating_sub(self.last_switch) < self.dwell_ms {
            return None;
        }

        self.position = (self.position + 1) % self.channels.len();
        self.last_switch = now;
        let channel = self.current_channel();
        trace!("Hopping to channel {}", channel);
        Some(channel)
    }
}
