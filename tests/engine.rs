use air_census::config::TrackerConfig;
use air_census::devices::ApLink;
use air_census::engine::Tracker;
use air_census::targets::{Direction, FrameLabel};
use libwifi::frame::components::{MacAddress, Security};
use libwifi::frame::RawFrame;
use std::collections::BTreeSet;
use std::net::Ipv4Addr;

const AP: MacAddress = MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x01]);
const CLIENT: MacAddress = MacAddress([0xF0, 0x18, 0x98, 0x00, 0x00, 0x02]);

const RSN_ELEMENT: [u8; 22] = [
    48, 20, 1, 0, 0, 15, 172, 4, 1, 0, 0, 15, 172, 4, 1, 0, 0, 15, 172, 2, 0, 0,
];

fn header(frame_control: [u8; 2], dst: MacAddress, src: MacAddress, bssid: MacAddress) -> Vec<u8> {
    let mut frame = frame_control.to_vec();
    frame.extend_from_slice(&[0x00, 0x00]); // Duration id
    frame.extend_from_slice(&dst.0);
    frame.extend_from_slice(&src.0);
    frame.extend_from_slice(&bssid.0);
    frame.extend_from_slice(&[0x10, 0x00]); // SequencControl
    frame
}

fn beacon(bssid: MacAddress, ssid: &str, wpa2: bool) -> Vec<u8> {
    let mut frame = header([0x80, 0x00], MacAddress::broadcast(), bssid, bssid);
    frame.extend_from_slice(&[0; 8]); // timestamp
    frame.extend_from_slice(&[0x64, 0x00]); // interval
    // Capability, privacy bit only with WPA2.
    let capability: [u8; 2] = if wpa2 { [0x11, 0x04] } else { [0x01, 0x04] };
    frame.extend_from_slice(&capability);
    frame.extend_from_slice(&[0, ssid.len() as u8]);
    frame.extend_from_slice(ssid.as_bytes());
    if wpa2 {
        frame.extend_from_slice(&RSN_ELEMENT);
    }
    frame
}

fn probe_request(src: MacAddress, ssid: &str) -> Vec<u8> {
    let mut frame = header(
        [0x40, 0x00],
        MacAddress::broadcast(),
        src,
        MacAddress::broadcast(),
    );
    frame.extend_from_slice(&[0, ssid.len() as u8]);
    frame.extend_from_slice(ssid.as_bytes());
    frame
}

fn data(flags: u8, src: MacAddress, dst: MacAddress, bssid: MacAddress) -> Vec<u8> {
    let mut frame = header([0x08, flags], dst, src, bssid);
    frame.resize(60, 0);
    frame
}

fn tracker() -> Tracker {
    Tracker::new(TrackerConfig::default(), 0).expect("Default config should be valid")
}

fn tracker_with_target(target: MacAddress) -> Tracker {
    Tracker::new(TrackerConfig::default().target(target), 0).expect("Config should be valid")
}

fn feed(tracker: &mut Tracker, frame: &[u8], rssi: i8, channel: u8, now: u64) {
    tracker
        .handle_frame(&RawFrame::new(frame, rssi, channel), now)
        .expect("Frame should classify");
}

#[test]
fn test_beacon_and_probe_build_topology() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 1000);
    feed(&mut tracker, &probe_request(CLIENT, "Home"), -45, 6, 2000);

    let ap = tracker.access_points().get_device(&AP).expect("AP should be registered");
    assert_eq!(ap.ssid, "Lab");
    assert_eq!(ap.security, Security::Wpa2);
    assert_eq!(ap.channel, 6);
    assert_eq!(ap.rssi, -40);
    assert_eq!(ap.beacon_count, 1);

    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert_eq!(client.vendor, "Apple");
    assert_eq!(client.frame_count, 1);
    assert!(!client.is_associated);

    assert_eq!(tracker.closest_ap(&CLIENT, -45, 2000, 3000), Some(AP));
    assert_eq!(tracker.recompute_associations(3000), 1);

    let ap = tracker.access_points().get_device(&AP).expect("AP should be registered");
    assert_eq!(ap.client_count(), 1);
    assert!(ap.clients.contains(&CLIENT));
    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert_eq!(client.access_point, Some(ApLink::Inferred(AP)));

    let stats = tracker.channels().get(6).expect("Channel 6 should exist");
    assert_eq!(stats.ap_count, 1);
    assert_eq!(stats.frame_count, 2);
    assert_eq!(stats.last_activity, 2000);

    let counters = tracker.counters();
    assert_eq!(counters.total, 2);
    assert_eq!(counters.management, 2);
    assert_eq!(counters.truncated, 0);
}

#[test]
fn test_truncated_frame_is_only_counted() {
    let mut tracker = tracker();
    let short = [0x80, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];

    let error = tracker
        .handle_frame(&RawFrame::new(&short, -30, 6), 100)
        .expect_err("Ten bytes can't hold a management header");
    assert!(error.is_truncated());

    let counters = tracker.counters();
    assert_eq!(counters.total, 1);
    assert_eq!(counters.management, 1);
    assert_eq!(counters.truncated, 1);
    assert!(tracker.access_points().is_empty());
    assert!(tracker.clients().is_empty());
    assert_eq!(tracker.channels().get(6).map(|stats| stats.frame_count), Some(1));
}

#[test]
fn test_management_header_without_sequence_control() {
    let mut tracker = tracker();
    let mut frame = probe_request(CLIENT, "");
    frame.truncate(22);
    feed(&mut tracker, &frame, -45, 6, 100);

    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert_eq!(client.last_seen, 100);
    assert_eq!(tracker.counters().truncated, 0);

    frame.truncate(21);
    let error = tracker
        .handle_frame(&RawFrame::new(&frame, -45, 6), 200)
        .expect_err("Third address is cut short");
    assert!(error.is_truncated());
    assert_eq!(tracker.counters().truncated, 1);
}

#[test]
fn test_unknown_channel_uses_scheduler_channel() {
    let mut tracker = tracker();
    assert_eq!(tracker.current_channel(), 1);
    feed(&mut tracker, &beacon(AP, "Lab", false), -40, 0, 10);

    let ap = tracker.access_points().get_device(&AP).expect("AP should be registered");
    assert_eq!(ap.channel, 1);
    assert_eq!(ap.security, Security::Open);
    assert_eq!(tracker.channels().get(1).map(|stats| stats.ap_count), Some(1));
}

#[test]
fn test_repeated_beacons() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);
    feed(&mut tracker, &beacon(AP, "", true), -42, 6, 100);
    feed(&mut tracker, &beacon(AP, "", true), -44, 6, 200);

    let ap = tracker.access_points().get_device(&AP).expect("AP should be registered");
    assert_eq!(ap.beacon_count, 3);
    assert_eq!(ap.ssid, "Lab");
    assert_eq!(ap.rssi, -44);
    assert_eq!(ap.last_seen, 200);
    // Counted per beacon, not per distinct access point.
    assert_eq!(tracker.channels().get(6).map(|stats| stats.ap_count), Some(3));
}

#[test]
fn test_group_bssid_is_not_an_access_point() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(MacAddress::broadcast(), "Lab", false), -40, 6, 0);
    assert!(tracker.access_points().is_empty());
    assert_eq!(tracker.counters().total, 1);
}

#[test]
fn test_target_found_and_lost() {
    let mut tracker = tracker_with_target(CLIENT);
    let state = tracker.target().expect("Target configured").state();
    assert!(!state.found);

    feed(&mut tracker, &probe_request(CLIENT, "Home"), -52, 6, 1000);

    let state = tracker.target().expect("Target configured").state();
    assert!(state.found);
    assert_eq!(state.rssi, -52);
    assert_eq!(state.last_seen, 1000);
    assert_eq!(state.ssid.as_deref(), Some("Home"));
    assert_eq!(state.tx_packets, 1);
    assert_eq!(state.rx_packets, 0);
    let packet = state.history.back().expect("History should hold the probe");
    assert_eq!(packet.label, FrameLabel::Probe);
    assert_eq!(packet.direction, Direction::Outbound);

    assert!(!tracker.sweep(61_000).target_expired);
    assert!(tracker.target().is_some_and(|target| target.state().found));
    assert!(tracker.sweep(61_001).target_expired);
    assert!(tracker.target().is_some_and(|target| !target.state().found));
}

#[test]
fn test_target_history_is_bounded() {
    let mut tracker = tracker_with_target(CLIENT);
    for now in 1..=21 {
        feed(&mut tracker, &probe_request(CLIENT, "Home"), -50, 6, now);
    }

    let target = tracker.target().expect("Target configured");
    assert_eq!(target.history().len(), 20);
    assert_eq!(target.history().front().map(|packet| packet.timestamp), Some(2));
    assert_eq!(target.history().back().map(|packet| packet.timestamp), Some(21));
    assert_eq!(target.state().tx_packets, 21);
}

#[test]
fn test_target_inbound_data_and_ip_guess() {
    let mut tracker = tracker_with_target(CLIENT);

    let mut frame = data(0x01, CLIENT, AP, AP);
    frame[32..36].copy_from_slice(&[192, 168, 1, 23]);
    feed(&mut tracker, &frame, -48, 6, 10);
    feed(&mut tracker, &data(0x02, AP, CLIENT, AP), -40, 6, 20);

    let state = tracker.target().expect("Target configured").state();
    assert_eq!(state.tx_packets, 1);
    assert_eq!(state.rx_packets, 1);
    assert_eq!(
        state.ip_guess.map(|ip| ip.addr()),
        Some(Ipv4Addr::new(192, 168, 1, 23))
    );
    let inbound = state.history.back().expect("History should hold both frames");
    assert_eq!(inbound.label, FrameLabel::Data);
    assert_eq!(inbound.direction, Direction::Inbound);
    assert_eq!(inbound.detail, format!("from {}", AP));
}

#[test]
fn test_target_protected_data_is_not_scanned() {
    let mut tracker = tracker_with_target(CLIENT);

    let mut frame = data(0x41, CLIENT, AP, AP);
    frame[32..36].copy_from_slice(&[192, 168, 1, 23]);
    feed(&mut tracker, &frame, -48, 6, 10);

    let state = tracker.target().expect("Target configured").state();
    assert_eq!(state.tx_packets, 1);
    assert_eq!(state.ip_guess, None);
    let outbound = state.history.back().expect("History should hold the frame");
    assert_eq!(outbound.detail, format!("to {} (protected)", AP));
}

#[test]
fn test_target_link_from_association_request() {
    let mut tracker = tracker_with_target(CLIENT);
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);
    feed(&mut tracker, &header([0x00, 0x00], AP, CLIENT, AP), -45, 6, 10);

    tracker.recompute_associations(20);
    let state = tracker.target().expect("Target configured").state();
    assert_eq!(state.access_point, Some(ApLink::Observed(AP)));
    assert_eq!(
        state.history.back().map(|packet| packet.label),
        Some(FrameLabel::Association)
    );
}

#[test]
fn test_target_link_from_association_response() {
    let mut tracker = tracker_with_target(CLIENT);
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);
    feed(&mut tracker, &probe_request(CLIENT, "Lab"), -45, 6, 10);
    feed(&mut tracker, &header([0x10, 0x00], CLIENT, AP, AP), -30, 6, 20);

    tracker.recompute_associations(30);
    let state = tracker.target().expect("Target configured").state();
    assert_eq!(state.access_point, Some(ApLink::Observed(AP)));

    // A later pass over the same registry keeps the confirmed link.
    tracker.recompute_associations(40);
    let state = tracker.target().expect("Target configured").state();
    assert_eq!(state.access_point, Some(ApLink::Observed(AP)));
}

#[test]
fn test_eviction_boundaries() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);
    feed(&mut tracker, &probe_request(CLIENT, ""), -45, 6, 0);

    assert_eq!(tracker.sweep(59_999).channels, 0);
    assert_eq!(tracker.sweep(60_001).channels, 1);
    assert_eq!(tracker.channels().get(6).map(|stats| stats.frame_count), Some(0));

    assert_eq!(tracker.sweep(119_999).clients, 0);
    assert!(tracker.clients().contains(&CLIENT));
    assert_eq!(tracker.sweep(120_001).clients, 1);
    assert!(!tracker.clients().contains(&CLIENT));

    assert_eq!(tracker.sweep(299_999).access_points, 0);
    assert!(tracker.access_points().contains(&AP));
    assert_eq!(tracker.sweep(300_001).access_points, 1);
    assert!(tracker.access_points().is_empty());
}

#[test]
fn test_ties_go_to_smallest_bssid() {
    let low = MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x03]);
    let high = MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x09]);
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(high, "High", false), -50, 1, 1000);
    feed(&mut tracker, &beacon(low, "Low", false), -50, 1, 1000);

    assert_eq!(tracker.closest_ap(&CLIENT, -50, 1000, 1000), Some(low));
}

#[test]
fn test_closest_ap_prefers_signal_and_time() {
    let near = MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x03]);
    let far = MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x09]);
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(near, "Near", false), -45, 1, 5000);
    feed(&mut tracker, &beacon(far, "Far", false), -80, 1, 5000);

    assert_eq!(tracker.closest_ap(&CLIENT, -78, 5000, 5000), Some(far));
    assert_eq!(tracker.closest_ap(&CLIENT, -47, 5000, 5000), Some(near));
    // Nothing heard inside the window.
    assert_eq!(tracker.closest_ap(&CLIENT, -47, 5000, 15_000), None);
}

#[test]
fn test_recompute_places_each_client_once() {
    let aps = [
        (MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x01]), -40),
        (MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x02]), -60),
        (MacAddress([0x00, 0x50, 0x56, 0x00, 0x00, 0x03]), -80),
    ];
    let mut tracker = tracker();
    for (bssid, rssi) in aps {
        feed(&mut tracker, &beacon(bssid, "Net", true), rssi, 11, 1000);
    }
    for (idx, rssi) in [-35, -58, -61, -79, -90].into_iter().enumerate() {
        let client = MacAddress([0x28, 0x11, 0xA5, 0x00, 0x01, idx as u8]);
        feed(&mut tracker, &probe_request(client, ""), rssi, 11, 1500);
    }

    let placed = tracker.recompute_associations(2000);
    assert_eq!(placed, 5);
    assert_eq!(tracker.access_points().total_clients(), placed);

    let mut seen = BTreeSet::new();
    for ap in tracker.access_points().iter() {
        for client in &ap.clients {
            assert!(seen.insert(*client), "{} placed twice", client);
        }
    }

    let strongest = MacAddress([0x28, 0x11, 0xA5, 0x00, 0x01, 0x00]);
    assert!(tracker
        .access_points()
        .get_device(&aps[0].0)
        .is_some_and(|ap| ap.clients.contains(&strongest)));

    // Recomputing again yields the same sets.
    let before = tracker.access_points().clone();
    tracker.recompute_associations(2000);
    assert_eq!(
        before.iter().map(|ap| ap.clients.clone()).collect::<Vec<_>>(),
        tracker
            .access_points()
            .iter()
            .map(|ap| ap.clients.clone())
            .collect::<Vec<_>>()
    );
}

#[test]
fn test_scheduler_wraps_after_dwell() {
    let config = TrackerConfig::default().hop_channels(vec![1, 6, 13]).dwell_ms(3000);
    let mut tracker = Tracker::new(config, 0).expect("Config should be valid");

    assert_eq!(tracker.current_channel(), 1);
    assert_eq!(tracker.tick(2999), None);
    assert_eq!(tracker.tick(3000), Some(6));
    assert_eq!(tracker.tick(4000), None);
    assert_eq!(tracker.tick(6000), Some(13));
    assert_eq!(tracker.tick(9000), Some(1));
    assert_eq!(tracker.current_channel(), 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    assert!(Tracker::new(TrackerConfig::default().hop_channels(vec![]), 0).is_err());
    assert!(Tracker::new(TrackerConfig::default().hop_channels(vec![1, 14]), 0).is_err());
    assert!(Tracker::new(TrackerConfig::default().dwell_ms(0), 0).is_err());
}

#[test]
fn test_association_frames() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);

    // Deauthenticating an unknown client does nothing.
    feed(&mut tracker, &header([0xc0, 0x00], CLIENT, AP, AP), -40, 6, 10);
    assert!(tracker.clients().is_empty());

    // Neither does a response to one.
    feed(&mut tracker, &header([0x10, 0x00], CLIENT, AP, AP), -40, 6, 15);
    assert!(tracker.clients().is_empty());

    feed(&mut tracker, &header([0x00, 0x00], AP, CLIENT, AP), -45, 6, 20);
    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert!(client.is_associated);
    assert_eq!(client.access_point, Some(ApLink::Observed(AP)));

    // An observed link survives the heuristic.
    tracker.recompute_associations(30);
    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert_eq!(client.access_point, Some(ApLink::Observed(AP)));

    feed(&mut tracker, &header([0xa0, 0x00], AP, CLIENT, AP), -45, 6, 40);
    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert!(!client.is_associated);
    assert_eq!(client.access_point, None);
}

#[test]
fn test_association_response_confirms_known_client() {
    let mut tracker = tracker();
    feed(&mut tracker, &probe_request(CLIENT, "Lab"), -45, 6, 0);
    feed(&mut tracker, &header([0x10, 0x00], CLIENT, AP, AP), -30, 6, 10);

    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert!(client.is_associated);
    assert_eq!(client.access_point, Some(ApLink::Observed(AP)));
    assert_eq!(client.rssi, -45);
    assert_eq!(tracker.clients().associated_count(), 1);
}

#[test]
fn test_data_frames() {
    let mut tracker = tracker();
    feed(&mut tracker, &beacon(AP, "Lab", true), -40, 6, 0);

    // Sent from the distribution system, so by the access point.
    feed(&mut tracker, &data(0x02, CLIENT, AP, AP), -40, 6, 10);
    assert!(tracker.clients().is_empty());

    // Known access points never become clients.
    feed(&mut tracker, &data(0x00, AP, CLIENT, AP), -40, 6, 20);
    assert!(tracker.clients().is_empty());

    feed(&mut tracker, &data(0x01, CLIENT, AP, AP), -55, 6, 30);
    feed(&mut tracker, &data(0x01, CLIENT, AP, AP), -57, 6, 40);
    let client = tracker.clients().get_device(&CLIENT).expect("Client should be registered");
    assert_eq!(client.frame_count, 2);
    assert_eq!(client.rssi, -57);
    assert_eq!(client.last_seen, 40);
    assert_eq!(tracker.counters().data, 4);
}

#[test]
fn test_unknown_vendor() {
    let random = MacAddress([0x02, 0x11, 0x22, 0x33, 0x44, 0x55]);
    let mut tracker = tracker();
    feed(&mut tracker, &probe_request(random, ""), -70, 3, 0);
    assert_eq!(
        tracker.clients().get_device(&random).map(|client| client.vendor.as_str()),
        Some("Unknown")
    );
}

#[test]
fn test_wpa2_lab_scenario() {
    let bssid: MacAddress = "AA:BB:CC:DD:EE:01".parse().expect("Valid MAC");
    let client: MacAddress = "11:22:33:44:55:66".parse().expect("Valid MAC");
    let mut tracker = tracker();

    feed(&mut tracker, &beacon(bssid, "Lab", true), -40, 1, 10_000);
    feed(&mut tracker, &probe_request(client, ""), -40, 1, 10_500);

    assert_eq!(tracker.access_points().size(), 1);
    let ap = tracker.access_points().get_device(&bssid).expect("AP should be registered");
    assert_eq!(ap.security, Security::Wpa2);
    assert_eq!(ap.beacon_count, 1);

    assert_eq!(tracker.closest_ap(&client, -40, 10_500, 10_500), Some(bssid));
    tracker.recompute_associations(10_500);
    assert_eq!(
        tracker.access_points().get_device(&bssid).map(|ap| ap.client_count()),
        Some(1)
    );
}

#[test]
fn test_target_as_data_source() {
    let target: MacAddress = "C4:EF:3D:B3:23:BD".parse().expect("Valid MAC");
    let mut tracker = tracker_with_target(target);

    feed(&mut tracker, &data(0x01, target, AP, AP), -55, 6, 1000);
    let state = tracker.target().expect("Target configured").state();
    assert!(state.found);
    assert_eq!(state.tx_packets, 1);
    assert_eq!(state.last_seen, 1000);

    tracker.sweep(61_001);
    assert!(tracker.target().is_some_and(|target| !target.state().found));
}
