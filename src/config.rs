use derive_setters::Setters;
use libwifi::frame::components::MacAddress;
use thiserror::Error;

/// Access points are dropped after this long without a beacon.
pub const AP_TTL_MS: u64 = 300_000;
/// Clients are dropped after this long without any frame.
pub const CLIENT_TTL_MS: u64 = 120_000;
/// Channel counters are zeroed after this long without activity.
pub const CHANNEL_IDLE_MS: u64 = 60_000;
/// The target counts as gone after this long.
pub const TARGET_TTL_MS: u64 = 60_000;
/// Only access points heard within this window are association candidates.
pub const ASSOCIATION_WINDOW_MS: u64 = 10_000;
pub const DWELL_MS: u64 = 3_000;
pub const SWEEP_INTERVAL_MS: u64 = 60_000;
pub const HISTORY_CAPACITY: usize = 20;

/// The 2.4 GHz channels the engine keeps statistics for.
pub const MIN_CHANNEL: u8 = 1;
pub const MAX_CHANNEL: u8 = 13;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Hop list is empty")]
    EmptyHopList,

    #[error("Channel {0} is outside 1-13")]
    InvalidChannel(u8),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Every tunable of the tracking engine.
///
/// ```
/// use air_census::config::TrackerConfig;
///
/// let config = TrackerConfig::default().dwell_ms(500).hop_channels(vec![1, 6, 11]);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Setters)]
pub struct TrackerConfig {
    pub ap_ttl_ms: u64,
    pub client_ttl_ms: u64,
    pub channel_idle_ms: u64,
    pub target_ttl_ms: u64,
    pub association_window_ms: u64,
    pub dwell_ms: u64,
    pub sweep_interval_ms: u64,
    pub hop_channels: Vec<u8>,
    #[setters(strip_option)]
    pub target: Option<MacAddress>,
    pub history_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            ap_ttl_ms: AP_TTL_MS,
            client_ttl_ms: CLIENT_TTL_MS,
            channel_idle_ms: CHANNEL_IDLE_MS,
            target_ttl_ms: TARGET_TTL_MS,
            association_window_ms: ASSOCIATION_WINDOW_MS,
            dwell_ms: DWELL_MS,
            sweep_interval_ms: SWEEP_INTERVAL_MS,
            hop_channels: (MIN_CHANNEL..=MAX_CHANNEL).collect(),
            target: None,
            history_capacity: HISTORY_CAPACITY,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hop_channels.is_empty() {
            return Err(ConfigError::EmptyHopList);
        }
        if let Some(&channel) = self.hop_channels.iter().find(|ch| !is_valid_channel(**ch)) {
            return Err(ConfigError::InvalidChannel(channel));
        }
        if self.dwell_ms == 0 {
            return Err(ConfigError::Zero("dwell_ms"));
        }
        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Zero("sweep_interval_ms"));
        }
        if self.history_capacity == 0 {
            return Err(ConfigError::Zero("history_capacity"));
        }
        Ok(())
    }
}

pub fn is_valid_channel(channel: u8) -> bool {
    (MIN_CHANNEL..=MAX_CHANNEL).contains(&channel)
}

/// Parse a hop list such as `1,6,11`.
pub fn parse_channel_list(input: &str) -> Result<Vec<u8>, ConfigError> {
    let mut channels = Vec::new();
    for part in input.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let channel = part.parse::<u8>().map_err(|_| ConfigError::InvalidChannel(0))?;
        if !is_valid_channel(channel) {
            return Err(ConfigError::InvalidChannel(channel));
        }
        channels.push(channel);
    }
    if channels.is_empty() {
        return Err(ConfigError::EmptyHopList);
    }
    Ok(channels)
}
