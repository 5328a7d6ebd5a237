//! Proximity based guess of which access point a client talks to.
//!
//! Nothing here is protocol verified. A client is placed with the access point whose last
//! beacon is closest in signal strength and in time, among the access points heard within
//! the association window.

use libwifi::frame::components::MacAddress;
use log::debug;

use crate::devices::{AccessPoint, AccessPointList, ApLink, ClientList};

/// `-|Δrssi| - |Δt|` with the time difference in whole seconds.
pub fn score(client_rssi: i8, client_time: u64, ap: &AccessPoint) -> i64 {
    let rssi_diff = (i64::from(client_rssi) - i64::from(ap.rssi)).abs();
    let time_diff = (client_time.abs_diff(ap.last_seen) / 1000) as i64;
    -rssi_diff - time_diff
}

/// The best scoring candidate for a client, if any access point qualifies.
///
/// Candidates were heard less than `window_ms` before `now` and aren't the client itself.
/// Traversal is in BSSID order and only a strictly better score replaces the current best,
/// so ties go to the smallest BSSID.
pub fn closest_ap(
    access_points: &AccessPointList,
    client_mac: &MacAddress,
    client_rssi: i8,
    client_time: u64,
    now: u64,
    window_ms: u64,
) -> Option<MacAddress> {
    let mut best: Option<(MacAddress, i64)> = None;

    for ap in access_points.iter() {
        if ap.bssid == *client_mac || now.saturating_sub(ap.last_seen) >= window_ms {
            continue;
        }

        let candidate = score(client_rssi, client_time, ap);
        match best {
            Some((_, best_score)) if best_score >= candidate => {}
            _ => best = Some((ap.bssid, candidate)),
        }
    }

    best.map(|(bssid, _)| bssid)
}

/// Rebuild every access point's client set from scratch.
///
/// Each client goes to its closest access point. Clients with an observed link keep it,
/// every other client gets the inferred result (or loses a stale inferred link).
/// Returns how many clients were placed.
pub fn recompute_associations(
    access_points: &mut AccessPointList,
    clients: &mut ClientList,
    now: u64,
    window_ms: u64,
) -> usize {
    access_points.clear_clients();

    let mut placed = 0;
    for client in clients.get_devices_mut().values_mut() {
        let closest = closest_ap(
            access_points,
            &client.mac_address,
            client.rssi,
            client.last_seen,
            now,
            window_ms,
        );

        if let Some(bssid) = closest {
            if let Some(ap) = access_points.get_devices_mut().get_mut(&bssid) {
                ap.clients.insert(client.mac_address);
                placed += 1;
            }
        }

        if !client.has_observed_link() {
            client.access_point = closest.map(ApLink::Inferred);
        }
    }

    debug!(
        "Association pass placed {} of {} clients over {} access points",
        placed,
        clients.size(),
        access_points.size()
    );
    placed
}

#[cfg(test)]
mod test {
    use super::*;
    use libwifi::frame::components::Security;

    #[test]
    fn test_score_truncates_seconds() {
        let mut ap = AccessPoint::new(MacAddress([2, 0, 0, 0, 0, 1]), 10_000);
        ap.rssi = -50;
        assert_eq!(score(-40, 11_999, &ap), -11);
        assert_eq!(score(-60, 8_000, &ap), -12);
    }

    #[test]
    fn test_window_is_exclusive() {
        let bssid = MacAddress([2, 0, 0, 0, 0, 1]);
        let client = MacAddress([2, 0, 0, 0, 0, 2]);
        let mut aps = AccessPointList::new();
        aps.upsert_from_beacon(bssid, 1, -50, None, Security::Open, 0);

        assert_eq!(closest_ap(&aps, &client, -50, 0, 9_999, 10_000), Some(bssid));
        assert_eq!(closest_ap(&aps, &client, -50, 0, 10_000, 10_000), None);
        // An access point is never its own client.
        assert_eq!(closest_ap(&aps, &bssid, -50, 0, 0, 10_000), None);
    }
}
