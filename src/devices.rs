use libwifi::frame::components::{MacAddress, Security};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use strum_macros::{Display, EnumString};

use crate::oui::vendor_of;

/// How a client's serving access point became known.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ApLink {
    /// Seen in an association exchange.
    Observed(MacAddress),
    /// Guessed from signal and timing proximity.
    Inferred(MacAddress),
}

impl ApLink {
    pub fn bssid(&self) -> MacAddress {
        match self {
            ApLink::Observed(bssid) | ApLink::Inferred(bssid) => *bssid,
        }
    }

    pub fn is_observed(&self) -> bool {
        matches!(self, ApLink::Observed(_))
    }

    pub fn to_json_str(&self) -> String {
        let kind = if self.is_observed() {
            "observed"
        } else {
            "inferred"
        };
        format!("{{\"bssid\": \"{}\",\"kind\": \"{}\"}}", self.bssid(), kind)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessPoint {
    pub bssid: MacAddress,
    /// Empty for hidden networks and for networks whose SSID hasn't been parsed yet.
    pub ssid: String,
    pub channel: u8,
    pub rssi: i8,
    pub security: Security,
    pub last_seen: u64,
    pub beacon_count: u32,
    /// Rebuilt by every association pass, empty in between frames.
    pub clients: BTreeSet<MacAddress>,
}

impl AccessPoint {
    pub fn new(bssid: MacAddress, now: u64) -> Self {
        AccessPoint {
            bssid,
            ssid: String::new(),
            channel: 0,
            rssi: 0,
            security: Security::Open,
            last_seen: now,
            beacon_count: 0,
            clients: BTreeSet::new(),
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn is_hidden(&self) -> bool {
        self.ssid.is_empty()
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"bssid\": \"{}\",\"ssid\": \"{}\",\"channel\": {},\"rssi\": {},\"security\": \"{}\",\"last_seen\": {},\"beacon_count\": {},\"clients\": [{}]}}",
            self.bssid,
            escape_json(&self.ssid),
            self.channel,
            self.rssi,
            self.security,
            self.last_seen,
            self.beacon_count,
            self.clients
                .iter()
                .map(|mac| format!("\"{}\"", mac))
                .collect::<Vec<String>>()
                .join(","),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Client {
    pub mac_address: MacAddress,
    pub rssi: i8,
    pub vendor: String,
    pub last_seen: u64,
    pub frame_count: u64,
    pub is_associated: bool,
    pub access_point: Option<ApLink>,
}

impl Client {
    pub fn new(mac_address: MacAddress, now: u64) -> Self {
        Client {
            mac_address,
            rssi: 0,
            vendor: vendor_of(&mac_address).to_string(),
            last_seen: now,
            frame_count: 0,
            is_associated: false,
            access_point: None,
        }
    }

    pub fn has_observed_link(&self) -> bool {
        self.access_point.is_some_and(|link| link.is_observed())
    }

    pub fn to_json_str(&self) -> String {
        format!(
            "{{\"mac_address\": \"{}\",\"rssi\": {},\"vendor\": \"{}\",\"last_seen\": {},\"frame_count\": {},\"is_associated\": {},\"access_point\": {}}}",
            self.mac_address,
            self.rssi,
            escape_json(&self.vendor),
            self.last_seen,
            self.frame_count,
            self.is_associated,
            self.access_point
                .map_or("null".to_string(), |link| link.to_json_str()),
        )
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ApSort {
    #[default]
    Rssi,
    Last,
    Clients,
    Channel,
    Beacons,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ClientSort {
    #[default]
    Rssi,
    Last,
    Frames,
}

/// Strongest first. 0 means no signal was reported and sorts last.
fn compare_rssi(a: i8, b: i8) -> Ordering {
    match (a, b) {
        _ if a == b => Ordering::Equal,
        (0, _) => Ordering::Greater,
        (_, 0) => Ordering::Less,
        _ => b.cmp(&a),
    }
}

/// Stable sort, so equal keys keep BSSID order when the input came from a list.
pub fn sort_access_points(access_points: &mut [AccessPoint], sort: ApSort, reverse: bool) {
    match sort {
        ApSort::Rssi => access_points.sort_by(|a, b| compare_rssi(a.rssi, b.rssi)),
        ApSort::Last => access_points.sort_by(|a, b| b.last_seen.cmp(&a.last_seen)),
        ApSort::Clients => access_points.sort_by(|a, b| b.client_count().cmp(&a.client_count())),
        ApSort::Channel => access_points.sort_by(|a, b| a.channel.cmp(&b.channel)),
        ApSort::Beacons => access_points.sort_by(|a, b| b.beacon_count.cmp(&a.beacon_count)),
    }

    if reverse {
        access_points.reverse();
    }
}

pub fn sort_clients(clients: &mut [Client], sort: ClientSort, reverse: bool) {
    match sort {
        ClientSort::Rssi => clients.sort_by(|a, b| compare_rssi(a.rssi, b.rssi)),
        ClientSort::Last => clients.sort_by(|a, b| b.last_seen.cmp(&a.last_seen)),
        ClientSort::Frames => clients.sort_by(|a, b| b.frame_count.cmp(&a.frame_count)),
    }

    if reverse {
        clients.reverse();
    }
}

/// Access points keyed by BSSID. Iteration is in BSSID order.
#[derive(Clone, Debug, Default)]
pub struct AccessPointList {
    devices: BTreeMap<MacAddress, AccessPoint>,
}

impl AccessPointList {
    pub fn new() -> Self {
        AccessPointList::default()
    }

    pub fn size(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn contains(&self, bssid: &MacAddress) -> bool {
        self.devices.contains_key(bssid)
    }

    pub fn get_device(&self, bssid: &MacAddress) -> Option<&AccessPoint> {
        self.devices.get(bssid)
    }

    pub fn get_devices(&self) -> &BTreeMap<MacAddress, AccessPoint> {
        &self.devices
    }

    pub(crate) fn get_devices_mut(&mut self) -> &mut BTreeMap<MacAddress, AccessPoint> {
        &mut self.devices
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccessPoint> {
        self.devices.values()
    }

    pub fn remove_device(&mut self, bssid: &MacAddress) -> Option<AccessPoint> {
        self.devices.remove(bssid)
    }

    /// Create or refresh an access point from one of its beacons.
    ///
    /// Channel, RSSI, security and last-seen are overwritten. The SSID is only replaced by a
    /// non-empty one, so a hidden beacon never erases a name learned earlier. `None` means the
    /// SSID element couldn't be read at all. Returns `true` when the access point is new.
    pub fn upsert_from_beacon(
        &mut self,
        bssid: MacAddress,
        channel: u8,
        rssi: i8,
        ssid: Option<&str>,
        security: Security,
        now: u64,
    ) -> bool {
        let mut created = false;
        let ap = self.devices.entry(bssid).or_insert_with(|| {
            created = true;
            AccessPoint::new(bssid, now)
        });

        ap.channel = channel;
        ap.rssi = rssi;
        ap.security = security;
        ap.last_seen = now;
        ap.beacon_count = ap.beacon_count.saturating_add(1);
        if let Some(ssid) = ssid.filter(|ssid| !ssid.is_empty()) {
            ap.ssid = ssid.to_string();
        }
        created
    }

    /// Drop every access point unseen for more than `ttl_ms`. Returns how many went.
    pub fn evict_stale(&mut self, now: u64, ttl_ms: u64) -> usize {
        let before = self.devices.len();
        self.devices
            .retain(|_, ap| now.saturating_sub(ap.last_seen) <= ttl_ms);
        before - self.devices.len()
    }

    pub fn clear_clients(&mut self) {
        for ap in self.devices.values_mut() {
            ap.clients.clear();
        }
    }

    pub fn total_clients(&self) -> usize {
        self.devices.values().map(AccessPoint::client_count).sum()
    }

    pub fn sorted(&self, sort: ApSort, reverse: bool) -> Vec<AccessPoint> {
        let mut access_points: Vec<AccessPoint> = self.devices.values().cloned().collect();
        sort_access_points(&mut access_points, sort, reverse);
        access_points
    }

    pub fn get_all_json(&self) -> String {
        self.devices
            .values()
            .map(AccessPoint::to_json_str)
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Client stations keyed by MAC. Iteration is in MAC order.
#[derive(Clone, Debug, Default)]
pub struct ClientList {
    devices: BTreeMap<MacAddress, Client>,
}

impl ClientList {
    pub fn new() -> Self {
        ClientList::default()
    }

    pub fn size(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    pub fn contains(&self, mac: &MacAddress) -> bool {
        self.devices.contains_key(mac)
    }

    pub fn get_device(&self, mac: &MacAddress) -> Option<&Client> {
        self.devices.get(mac)
    }

    pub fn get_devices(&self) -> &BTreeMap<MacAddress, Client> {
        &self.devices
    }

    pub(crate) fn get_devices_mut(&mut self) -> &mut BTreeMap<MacAddress, Client> {
        &mut self.devices
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.devices.values()
    }

    pub fn remove_device(&mut self, mac: &MacAddress) -> Option<Client> {
        self.devices.remove(mac)
    }

    /// Shared part of every upsert: create if needed, then refresh signal, time and count.
    fn touch(&mut self, mac: MacAddress, rssi: i8, now: u64) -> (&mut Client, bool) {
        let mut created = false;
        let client = self.devices.entry(mac).or_insert_with(|| {
            created = true;
            Client::new(mac, now)
        });
        client.rssi = rssi;
        client.last_seen = now;
        client.frame_count = client.frame_count.saturating_add(1);
        (client, created)
    }

    /// A probe request. Probing says nothing about association, the link is left alone.
    pub fn upsert_from_probe(&mut self, mac: MacAddress, rssi: i8, now: u64) -> bool {
        self.touch(mac, rssi, now).1
    }

    /// An association or reassociation request sent by `mac` to `bssid`.
    pub fn upsert_from_association(
        &mut self,
        mac: MacAddress,
        bssid: MacAddress,
        rssi: i8,
        now: u64,
    ) -> bool {
        let (client, created) = self.touch(mac, rssi, now);
        client.is_associated = true;
        client.access_point = Some(ApLink::Observed(bssid));
        created
    }

    pub fn upsert_from_data(&mut self, mac: MacAddress, rssi: i8, now: u64) -> bool {
        self.touch(mac, rssi, now).1
    }

    /// An association response from `bssid` to `mac`. Unknown clients are ignored and the
    /// RSSI is left alone since the access point transmitted the frame.
    pub fn confirm_association(&mut self, mac: &MacAddress, bssid: MacAddress) -> bool {
        match self.devices.get_mut(mac) {
            Some(client) => {
                client.is_associated = true;
                client.access_point = Some(ApLink::Observed(bssid));
                true
            }
            None => false,
        }
    }

    /// Disassociation or deauthentication. Unknown clients are ignored.
    pub fn disassociate(&mut self, mac: &MacAddress) -> bool {
        match self.devices.get_mut(mac) {
            Some(client) => {
                client.is_associated = false;
                client.access_point = None;
                true
            }
            None => false,
        }
    }

    pub fn evict_stale(&mut self, now: u64, ttl_ms: u64) -> usize {
        let before = self.devices.len();
        self.devices
            .retain(|_, client| now.saturating_sub(client.last_seen) <= ttl_ms);
        before - self.devices.len()
    }

    pub fn associated_count(&self) -> usize {
        self.devices.values().filter(|client| client.is_associated).count()
    }

    pub fn sorted(&self, sort: ClientSort, reverse: bool) -> Vec<Client> {
        let mut clients: Vec<Client> = self.devices.values().cloned().collect();
        sort_clients(&mut clients, sort, reverse);
        clients
    }

    pub fn get_all_json(&self) -> String {
        self.devices
            .values()
            .map(Client::to_json_str)
            .collect::<Vec<String>>()
            .join(", ")
    }
}

/// Quote and backslash escaping for SSIDs, which are arbitrary bytes off the air.
pub(crate) fn escape_json(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            ch if ch.is_control() => escaped.push_str(&format!("\\u{:04x}", ch as u32)),
            ch => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod test {
    use super::*;

    const AP: MacAddress = MacAddress([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);
    const STA: MacAddress = MacAddress([0x11, 0x22, 0x33, 0x44, 0x55, 0x66]);

    #[test]
    fn test_hidden_beacon_keeps_ssid() {
        let mut aps = AccessPointList::new();
        assert!(aps.upsert_from_beacon(AP, 6, -50, Some(""), Security::Open, 10));
        assert_eq!(aps.get_device(&AP).map(|ap| ap.ssid.as_str()), Some(""));

        assert!(!aps.upsert_from_beacon(AP, 6, -50, Some("Lab"), Security::Wpa2, 20));
        aps.upsert_from_beacon(AP, 6, -52, Some(""), Security::Wpa2, 30);
        aps.upsert_from_beacon(AP, 6, -52, None, Security::Wpa2, 40);

        let ap = aps.get_device(&AP).expect("AP should be registered");
        assert_eq!(ap.ssid, "Lab");
        assert_eq!(ap.beacon_count, 4);
        assert_eq!(ap.last_seen, 40);
    }

    #[test]
    fn test_rssi_sort_puts_unknown_last() {
        let mut aps = AccessPointList::new();
        aps.upsert_from_beacon(AP, 1, 0, None, Security::Open, 0);
        aps.upsert_from_beacon(STA, 1, -70, None, Security::Open, 0);
        let sorted = aps.sorted(ApSort::Rssi, false);
        assert_eq!(sorted[0].bssid, STA);
        assert_eq!(sorted[1].bssid, AP);
    }

    #[test]
    fn test_sort_names() {
        assert_eq!("clients".parse::<ApSort>(), Ok(ApSort::Clients));
        assert_eq!(ClientSort::Frames.to_string(), "frames");
    }

    #[test]
    fn test_escape_json() {
        assert_eq!(escape_json("a\"b\\c\n"), "a\\\"b\\\\c\\u000a");
    }
}
