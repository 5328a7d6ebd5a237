use libwifi::error::Error;
use libwifi::frame::components::{MacAddress, Security};
use libwifi::frame::{FrameBody, FrameRecord, RawFrame};
use libwifi::{classify, FrameSubType, FrameType, PacketClass};
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::association;
use crate::channels::{ChannelActivity, ChannelScheduler, ChannelStats};
use crate::config::{ConfigError, TrackerConfig};
use crate::devices::{AccessPoint, AccessPointList, Client, ClientList};
use crate::targets::{TargetState, TargetTracker};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameCounters {
    pub total: u64,
    pub management: u64,
    pub control: u64,
    pub data: u64,
    /// Frames the capture layer couldn't place, or with the reserved type.
    pub misc: u64,
    pub truncated: u64,
}

impl FrameCounters {
    fn count(&mut self, class: PacketClass) {
        self.total += 1;
        match class {
            PacketClass::Management => self.management += 1,
            PacketClass::Control => self.control += 1,
            PacketClass::Data => self.data += 1,
            PacketClass::Misc => self.misc += 1,
        }
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"total\": {},\"management\": {},\"control\": {},\"data\": {},\"misc\": {},\"truncated\": {}}}",
            self.total, self.management, self.control, self.data, self.misc, self.truncated
        )
    }
}

/// Access points split by whether their beacons advertise any protection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SecurityBreakdown {
    pub secure: usize,
    pub open: usize,
}

impl SecurityBreakdown {
    pub fn from_access_points<'a>(access_points: impl IntoIterator<Item = &'a AccessPoint>) -> Self {
        access_points
            .into_iter()
            .fold(SecurityBreakdown::default(), |mut breakdown, ap| {
                match ap.security {
                    Security::Open => breakdown.open += 1,
                    _ => breakdown.secure += 1,
                }
                breakdown
            })
    }

    /// Whole percent of protected networks, `None` before the first access point.
    pub fn secure_percent(&self) -> Option<usize> {
        match self.secure + self.open {
            0 => None,
            total => Some(self.secure * 100 / total),
        }
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"secure\": {},\"open\": {},\"secure_percent\": {}}}",
            self.secure,
            self.open,
            self.secure_percent()
                .map_or("null".to_string(), |percent| percent.to_string())
        )
    }
}

/// What one sweep removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub access_points: usize,
    pub clients: usize,
    pub channels: usize,
    pub target_expired: bool,
}

/// A copy of everything the engine knows, detached from the lock.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub taken_at: u64,
    pub current_channel: u8,
    pub access_points: Vec<AccessPoint>,
    pub clients: Vec<Client>,
    pub channels: Vec<ChannelStats>,
    pub target: Option<TargetState>,
    pub counters: FrameCounters,
    pub security: SecurityBreakdown,
    /// Frames per second since the tracker started, over at least one second.
    pub frame_rate: f64,
    pub busiest_channel: Option<u8>,
}

/// The tracking engine: every registry plus the channel scheduler, mutated one frame at a
/// time. Time is always passed in, so tests drive it with plain numbers.
#[derive(Clone, Debug)]
pub struct Tracker {
    config: TrackerConfig,
    access_points: AccessPointList,
    clients: ClientList,
    channels: ChannelActivity,
    scheduler: ChannelScheduler,
    target: Option<TargetTracker>,
    counters: FrameCounters,
    started_at: u64,
}

impl Tracker {
    pub fn new(config: TrackerConfig, now: u64) -> Result<Self, ConfigError> {
        config.validate()?;
        let scheduler = ChannelScheduler::new(config.hop_channels.clone(), config.dwell_ms, now)?;
        let target = config
            .target
            .map(|mac| TargetTracker::new(mac, config.history_capacity));

        Ok(Tracker {
            config,
            access_points: AccessPointList::new(),
            clients: ClientList::new(),
            channels: ChannelActivity::new(),
            scheduler,
            target,
            counters: FrameCounters::default(),
            started_at: now,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn access_points(&self) -> &AccessPointList {
        &self.access_points
    }

    pub fn clients(&self) -> &ClientList {
        &self.clients
    }

    pub fn channels(&self) -> &ChannelActivity {
        &self.channels
    }

    pub fn target(&self) -> Option<&TargetTracker> {
        self.target.as_ref()
    }

    pub fn counters(&self) -> FrameCounters {
        self.counters
    }

    pub fn current_channel(&self) -> u8 {
        self.scheduler.current_channel()
    }

    /// Process one captured frame.
    ///
    /// The frame is counted and its channel credited before classification. Rejected frames
    /// (truncated, unknown class) stop there and are handed back as the error. A channel of 0
    /// means the capture layer didn't know, the scheduler's current channel is used instead.
    pub fn handle_frame(&mut self, raw: &RawFrame, now: u64) -> Result<(), Error> {
        let channel = match raw.channel {
            0 => self.scheduler.current_channel(),
            channel => channel,
        };
        let raw = RawFrame { channel, ..*raw };

        let class = raw.class_hint.unwrap_or_else(|| {
            raw.payload()
                .first()
                .map_or(PacketClass::Misc, |byte| PacketClass::from_frame_control(*byte))
        });
        self.counters.count(class);
        self.channels.record_frame(channel, now);

        let record = match classify(&raw) {
            Ok(record) => record,
            Err(error) => {
                if error.is_truncated() {
                    self.counters.truncated += 1;
                }
                debug!("Dropping frame on channel {}: {}", channel, error);
                return Err(error);
            }
        };

        if let Some(target) = self.target.as_mut() {
            target.observe(&record, now);
        }

        match record.frame_type() {
            FrameType::Management => self.handle_management(&record, now),
            FrameType::Data => self.handle_data(&record, now),
            _ => {}
        }
        Ok(())
    }

    /// Anything but the broadcast and all-zero addresses, and never an address we already know
    /// as an access point.
    fn is_client_candidate(&self, mac: &MacAddress) -> bool {
        !mac.is_broadcast() && *mac != MacAddress::zeroed() && !self.access_points.contains(mac)
    }

    fn handle_management(&mut self, record: &FrameRecord, now: u64) {
        let (Some(source), Some(destination), Some(bssid)) =
            (record.source, record.destination, record.bssid)
        else {
            return;
        };

        match record.frame_subtype() {
            FrameSubType::Beacon => {
                let FrameBody::Beacon { ssid, security } = &record.body else {
                    return;
                };
                if !bssid.is_real_device() {
                    return;
                }
                let created = self.access_points.upsert_from_beacon(
                    bssid,
                    record.channel,
                    record.rssi,
                    ssid.as_deref(),
                    *security,
                    now,
                );
                self.channels.record_ap(record.channel);
                if created {
                    info!(
                        "New access point {} \"{}\" on channel {} ({})",
                        bssid,
                        ssid.as_deref().unwrap_or_default(),
                        record.channel,
                        security
                    );
                }
            }
            FrameSubType::ProbeRequest => {
                if self.is_client_candidate(&source) {
                    self.clients.upsert_from_probe(source, record.rssi, now);
                }
            }
            FrameSubType::AssociationRequest | FrameSubType::ReassociationRequest => {
                if self.is_client_candidate(&source) {
                    self.clients
                        .upsert_from_association(source, bssid, record.rssi, now);
                }
            }
            subtype if subtype.is_association_response() => {
                self.clients.confirm_association(&destination, source);
            }
            FrameSubType::Disassociation | FrameSubType::Deauthentication => {
                // Either side may send these.
                let by_source = self.clients.disassociate(&source);
                let by_destination = self.clients.disassociate(&destination);
                if by_source || by_destination {
                    debug!("{} left {}", if by_source { source } else { destination }, bssid);
                }
            }
            _ => {}
        }
    }

    fn handle_data(&mut self, record: &FrameRecord, now: u64) {
        // From the distribution system means an access point transmitted it.
        if record.frame_control.from_ds() {
            return;
        }
        if let Some(source) = record.source {
            if self.is_client_candidate(&source) {
                self.clients.upsert_from_data(source, record.rssi, now);
            }
        }
    }

    /// The access point a client most plausibly talks to, see [association::closest_ap].
    pub fn closest_ap(
        &self,
        client_mac: &MacAddress,
        client_rssi: i8,
        client_time: u64,
        now: u64,
    ) -> Option<MacAddress> {
        association::closest_ap(
            &self.access_points,
            client_mac,
            client_rssi,
            client_time,
            now,
            self.config.association_window_ms,
        )
    }

    /// Rebuild all client sets and inferred links. Meant for the low frequency consumer,
    /// this is clients times access points.
    pub fn recompute_associations(&mut self, now: u64) -> usize {
        let placed = association::recompute_associations(
            &mut self.access_points,
            &mut self.clients,
            now,
            self.config.association_window_ms,
        );

        if let Some(target) = self.target.as_mut() {
            let link = self
                .clients
                .get_device(&target.target())
                .and_then(|client| client.access_point);
            target.adopt_client_link(link);
        }
        placed
    }

    /// Drop everything that went quiet. Driven by a timer, never per frame.
    pub fn sweep(&mut self, now: u64) -> SweepReport {
        let report = SweepReport {
            access_points: self.access_points.evict_stale(now, self.config.ap_ttl_ms),
            clients: self.clients.evict_stale(now, self.config.client_ttl_ms),
            channels: self.channels.reset_stale(now, self.config.channel_idle_ms),
            target_expired: self
                .target
                .as_mut()
                .is_some_and(|target| target.expire_if_stale(now, self.config.target_ttl_ms)),
        };

        debug!(
            "Sweep removed {} access points, {} clients, reset {} channels",
            report.access_points, report.clients, report.channels
        );
        report
    }

    /// Advance the channel scheduler. `Some` carries the channel to tune to.
    pub fn tick(&mut self, now: u64) -> Option<u8> {
        self.scheduler.tick(now)
    }

    /// Frames per second since the tracker started, counting elapsed time in whole seconds
    /// and never less than one.
    pub fn frame_rate(&self, now: u64) -> f64 {
        let seconds = (now.saturating_sub(self.started_at) / 1000).max(1);
        self.counters.total as f64 / seconds as f64
    }

    pub fn snapshot(&self, now: u64) -> Snapshot {
        Snapshot {
            taken_at: now,
            current_channel: self.scheduler.current_channel(),
            access_points: self.access_points.iter().cloned().collect(),
            clients: self.clients.iter().cloned().collect(),
            channels: self.channels.all().to_vec(),
            target: self.target.as_ref().map(|target| target.state().clone()),
            counters: self.counters,
            security: SecurityBreakdown::from_access_points(self.access_points.iter()),
            frame_rate: self.frame_rate(now),
            busiest_channel: self.channels.busiest().map(|stats| stats.channel),
        }
    }
}

/// The one lock every thread goes through.
#[derive(Clone, Debug)]
pub struct SharedTracker(Arc<Mutex<Tracker>>);

impl SharedTracker {
    pub fn new(tracker: Tracker) -> Self {
        SharedTracker(Arc::new(Mutex::new(tracker)))
    }

    /// A panicking holder leaves the registries as they were after its last complete
    /// update, so a poisoned lock is still usable.
    pub fn lock(&self) -> MutexGuard<'_, Tracker> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with<R>(&self, action: impl FnOnce(&mut Tracker) -> R) -> R {
        action(&mut self.lock())
    }
}
