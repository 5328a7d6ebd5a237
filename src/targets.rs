use libwifi::frame::components::MacAddress;
use libwifi::frame::{FrameBody, FrameRecord};
use libwifi::{FrameSubType, FrameType};
use log::info;
use std::collections::VecDeque;
use std::fmt;
use std::net::Ipv4Addr;
use strum_macros::Display;

use crate::devices::{escape_json, ApLink};

/// Start of the byte window scanned for an address, counted from the start of the frame.
const IP_SCAN_START: usize = 30;
/// End of the window, exclusive.
const IP_SCAN_END: usize = 50;
const PRIVATE_PREFIX: [u8; 2] = [192, 168];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum FrameLabel {
    #[strum(serialize = "BEACON")]
    Beacon,
    #[strum(serialize = "PROBE")]
    Probe,
    #[strum(serialize = "PROBE_R")]
    ProbeResponse,
    #[strum(serialize = "ASSOC")]
    Association,
    #[strum(serialize = "ASSOC_R")]
    AssociationResponse,
    #[strum(serialize = "DISASSOC")]
    Disassociation,
    #[strum(serialize = "AUTH")]
    Authentication,
    #[strum(serialize = "DEAUTH")]
    Deauthentication,
    #[strum(serialize = "MGMT")]
    Management,
    #[strum(serialize = "DATA")]
    Data,
}

impl FrameLabel {
    pub fn from_record(record: &FrameRecord) -> FrameLabel {
        if record.frame_type() == FrameType::Data {
            return FrameLabel::Data;
        }
        match record.frame_subtype() {
            FrameSubType::Beacon => FrameLabel::Beacon,
            FrameSubType::ProbeRequest => FrameLabel::Probe,
            FrameSubType::ProbeResponse => FrameLabel::ProbeResponse,
            FrameSubType::AssociationRequest | FrameSubType::ReassociationRequest => {
                FrameLabel::Association
            }
            FrameSubType::AssociationResponse | FrameSubType::ReassociationResponse => {
                FrameLabel::AssociationResponse
            }
            FrameSubType::Disassociation => FrameLabel::Disassociation,
            FrameSubType::Authentication => FrameLabel::Authentication,
            FrameSubType::Deauthentication => FrameLabel::Deauthentication,
            _ => FrameLabel::Management,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Direction {
    /// Sent by the target.
    #[strum(serialize = "TX")]
    Outbound,
    /// Addressed to the target.
    #[strum(serialize = "RX")]
    Inbound,
}

/// An IPv4 address spotted in a data frame. Pattern matched, never verified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IpGuess(pub Ipv4Addr);

impl IpGuess {
    /// First `192.168.x.y` in the scan window of `payload`, if any.
    pub fn scan(payload: &[u8]) -> Option<IpGuess> {
        let end = payload.len().saturating_sub(4).min(IP_SCAN_END);
        (IP_SCAN_START..end)
            .find(|&idx| payload[idx..idx + 2] == PRIVATE_PREFIX)
            .map(|idx| {
                IpGuess(Ipv4Addr::new(
                    payload[idx],
                    payload[idx + 1],
                    payload[idx + 2],
                    payload[idx + 3],
                ))
            })
    }

    pub fn addr(&self) -> Ipv4Addr {
        self.0
    }
}

impl fmt::Display for IpGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}?", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetPacket {
    pub timestamp: u64,
    pub label: FrameLabel,
    pub rssi: i8,
    pub direction: Direction,
    pub detail: String,
}

impl TargetPacket {
    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"timestamp\": {},\"label\": \"{}\",\"rssi\": {},\"direction\": \"{}\",\"detail\": \"{}\"}}",
            self.timestamp,
            self.label,
            self.rssi,
            self.direction,
            escape_json(&self.detail),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetState {
    pub target: MacAddress,
    pub found: bool,
    pub rssi: i8,
    pub access_point: Option<ApLink>,
    pub last_seen: u64,
    pub ssid: Option<String>,
    pub ip_guess: Option<IpGuess>,
    pub tx_packets: u64,
    pub rx_packets: u64,
    /// Oldest first.
    pub history: VecDeque<TargetPacket>,
}

impl TargetState {
    fn new(target: MacAddress) -> Self {
        TargetState {
            target,
            found: false,
            rssi: 0,
            access_point: None,
            last_seen: 0,
            ssid: None,
            ip_guess: None,
            tx_packets: 0,
            rx_packets: 0,
            history: VecDeque::new(),
        }
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"target\": \"{}\",\"found\": {},\"rssi\": {},\"access_point\": {},\"last_seen\": {},\"ssid\": {},\"ip_guess\": {},\"tx_packets\": {},\"rx_packets\": {},\"history\": [{}]}}",
            self.target,
            self.found,
            self.rssi,
            self.access_point
                .map_or("null".to_string(), |link| link.to_json_str()),
            self.last_seen,
            self.ssid
                .as_ref()
                .map_or("null".to_string(), |ssid| format!("\"{}\"", escape_json(ssid))),
            self.ip_guess
                .map_or("null".to_string(), |ip| format!("\"{}\"", ip.addr())),
            self.tx_packets,
            self.rx_packets,
            self.history
                .iter()
                .map(TargetPacket::to_json_str)
                .collect::<Vec<String>>()
                .join(", "),
        )
    }
}

/// Follows a single MAC through every frame it sends or receives.
#[derive(Clone, Debug)]
pub struct TargetTracker {
    state: TargetState,
    capacity: usize,
}

impl TargetTracker {
    pub fn new(target: MacAddress, capacity: usize) -> Self {
        TargetTracker {
            state: TargetState::new(target),
            capacity: capacity.max(1),
        }
    }

    pub fn target(&self) -> MacAddress {
        self.state.target
    }

    pub fn state(&self) -> &TargetState {
        &self.state
    }

    pub fn history(&self) -> &VecDeque<TargetPacket> {
        &self.state.history
    }

    /// Feed one classified frame. Returns `true` when the target was involved.
    pub fn observe(&mut self, record: &FrameRecord, now: u64) -> bool {
        let target = self.state.target;
        if !record.involves(&target) {
            return false;
        }
        let direction = if record.source == Some(target) {
            Direction::Outbound
        } else {
            Direction::Inbound
        };

        if !self.state.found {
            info!("Target {} sighted at {} dBm", target, record.rssi);
        }
        self.state.found = true;
        self.state.rssi = record.rssi;
        self.state.last_seen = now;
        match direction {
            Direction::Outbound => self.state.tx_packets += 1,
            Direction::Inbound => self.state.rx_packets += 1,
        }

        let label = FrameLabel::from_record(record);
        if direction == Direction::Outbound {
            self.learn_from_outbound(record);
        }
        // Encrypted bodies only look like addresses by accident.
        let protected = record.frame_control.protected();
        if label == FrameLabel::Data && !protected {
            if let Some(ip) = IpGuess::scan(record.payload) {
                self.state.ip_guess = Some(ip);
            }
        }

        let mut detail = match (direction, record.destination, record.source) {
            (Direction::Outbound, Some(peer), _) => format!("to {}", peer),
            (Direction::Inbound, _, Some(peer)) => format!("from {}", peer),
            _ => String::new(),
        };
        if protected {
            detail.push_str(" (protected)");
        }
        self.push(TargetPacket {
            timestamp: now,
            label,
            rssi: record.rssi,
            direction,
            detail,
        });
        true
    }

    /// Probe requests reveal the network the target looks for, association requests the
    /// one it joins.
    fn learn_from_outbound(&mut self, record: &FrameRecord) {
        match &record.body {
            FrameBody::ProbeRequest { ssid: Some(ssid) } if !ssid.is_empty() => {
                self.state.ssid = Some(ssid.clone());
            }
            _ => {}
        }

        if record.frame_subtype().is_association_request() {
            if let Some(bssid) = record.bssid {
                self.state.access_point = Some(ApLink::Observed(bssid));
            }
        }
    }

    fn push(&mut self, packet: TargetPacket) {
        while self.state.history.len() >= self.capacity {
            self.state.history.pop_front();
        }
        self.state.history.push_back(packet);
    }

    /// Take the link the client registry holds for the target.
    ///
    /// An observed link always wins. An inferred or missing one never replaces a link the
    /// target's own association frames established.
    pub fn adopt_client_link(&mut self, link: Option<ApLink>) {
        match link {
            Some(link) if link.is_observed() => self.state.access_point = Some(link),
            _ if self
                .state
                .access_point
                .is_some_and(|current| current.is_observed()) => {}
            other => self.state.access_point = other,
        }
    }

    /// Clear the found flag once the target has been silent for more than `ttl_ms`.
    pub fn expire_if_stale(&mut self, now: u64, ttl_ms: u64) -> bool {
        if self.state.found && now.saturating_sub(self.state.last_seen) > ttl_ms {
            info!("Target {} lost", self.state.target);
            self.state.found = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ip_scan_window() {
        let mut payload = vec![0u8; 60];
        payload[40..44].copy_from_slice(&[192, 168, 1, 23]);
        assert_eq!(
            IpGuess::scan(&payload),
            Some(IpGuess(Ipv4Addr::new(192, 168, 1, 23)))
        );

        // Outside the window.
        let mut payload = vec![0u8; 60];
        payload[50..54].copy_from_slice(&[192, 168, 1, 23]);
        assert_eq!(IpGuess::scan(&payload), None);

        // Needs four bytes of room.
        let mut payload = vec![0u8; 34];
        payload[30..34].copy_from_slice(&[192, 168, 1, 23]);
        assert_eq!(IpGuess::scan(&payload), None);
        assert_eq!(IpGuess::scan(&[192, 168]), None);
    }

    #[test]
    fn test_first_match_wins() {
        let mut payload = vec![0u8; 60];
        payload[31..35].copy_from_slice(&[192, 168, 0, 1]);
        payload[41..45].copy_from_slice(&[192, 168, 0, 2]);
        assert_eq!(
            IpGuess::scan(&payload).map(|ip| ip.addr()),
            Some(Ipv4Addr::new(192, 168, 0, 1))
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(FrameLabel::ProbeResponse.to_string(), "PROBE_R");
        assert_eq!(Direction::Outbound.to_string(), "TX");
        assert_eq!(Direction::Inbound.to_string(), "RX");
    }
}
