use itertools::Itertools;
use std::fmt::Write;

use crate::devices::{sort_access_points, sort_clients, ApLink, ApSort, ClientSort};
use crate::engine::Snapshot;
use crate::util::{age_to_string, format_row, max_column_widths};

fn render_table(headers: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let widths = max_column_widths(&headers, &rows);
    let mut output = String::new();
    writeln!(output, "{}", format_row(&headers, &widths)).ok();
    writeln!(
        output,
        "{}",
        "-".repeat(widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1))
    )
    .ok();
    for row in rows {
        writeln!(output, "{}", format_row(&row, &widths)).ok();
    }
    output
}

fn rssi_cell(rssi: i8) -> String {
    match rssi {
        0 => String::new(),
        rssi => rssi.to_string(),
    }
}

fn link_cell(link: Option<ApLink>) -> String {
    match link {
        Some(ApLink::Observed(bssid)) => bssid.to_string(),
        Some(ApLink::Inferred(bssid)) => format!("{}?", bssid),
        None => String::new(),
    }
}

pub fn access_point_table(snapshot: &Snapshot, sort: ApSort) -> String {
    let headers = ["BSSID", "CH", "RSSI", "Last", "SSID", "Security", "Beacons", "Clients"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut access_points = snapshot.access_points.clone();
    sort_access_points(&mut access_points, sort, false);
    let rows = access_points
        .iter()
        .map(|ap| {
            vec![
                ap.bssid.to_string(),
                ap.channel.to_string(),
                rssi_cell(ap.rssi),
                age_to_string(ap.last_seen, snapshot.taken_at),
                if ap.is_hidden() {
                    "<hidden>".to_string()
                } else {
                    ap.ssid.clone()
                },
                ap.security.to_string(),
                ap.beacon_count.to_string(),
                ap.client_count().to_string(),
            ]
        })
        .collect();

    render_table(headers, rows)
}

pub fn client_table(snapshot: &Snapshot, sort: ClientSort) -> String {
    let headers = ["MAC Address", "Vendor", "RSSI", "Last", "Frames", "Assoc", "AP"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut clients = snapshot.clients.clone();
    sort_clients(&mut clients, sort, false);
    let rows = clients
        .iter()
        .map(|client| {
            vec![
                client.mac_address.to_string(),
                client.vendor.clone(),
                rssi_cell(client.rssi),
                age_to_string(client.last_seen, snapshot.taken_at),
                client.frame_count.to_string(),
                if client.is_associated { "yes" } else { "" }.to_string(),
                link_cell(client.access_point),
            ]
        })
        .collect();

    render_table(headers, rows)
}

/// Only channels with something to show.
pub fn channel_table(snapshot: &Snapshot) -> String {
    let headers = ["CH", "APs", "Frames", "Last"]
        .iter()
        .map(|h| h.to_string())
        .collect();

    let rows = snapshot
        .channels
        .iter()
        .filter(|stats| stats.frame_count > 0 || stats.channel == snapshot.current_channel)
        .map(|stats| {
            vec![
                if stats.channel == snapshot.current_channel {
                    format!("*{}", stats.channel)
                } else {
                    stats.channel.to_string()
                },
                stats.ap_count.to_string(),
                stats.frame_count.to_string(),
                if stats.frame_count > 0 {
                    age_to_string(stats.last_activity, snapshot.taken_at)
                } else {
                    String::new()
                },
            ]
        })
        .collect();

    render_table(headers, rows)
}

pub fn target_summary(snapshot: &Snapshot) -> String {
    let Some(target) = &snapshot.target else {
        return String::new();
    };

    let mut output = String::new();
    writeln!(
        output,
        "Target {} | {} | RSSI {} | Last {} | TX {} RX {}",
        target.target,
        if target.found { "FOUND" } else { "not seen" },
        rssi_cell(target.rssi),
        if target.last_seen > 0 {
            age_to_string(target.last_seen, snapshot.taken_at)
        } else {
            "-".to_string()
        },
        target.tx_packets,
        target.rx_packets,
    )
    .ok();
    writeln!(
        output,
        "AP {} | SSID {} | IP {}",
        match target.access_point {
            Some(link) => link_cell(Some(link)),
            None => "-".to_string(),
        },
        target.ssid.as_deref().unwrap_or("-"),
        target
            .ip_guess
            .map_or("-".to_string(), |ip| ip.to_string()),
    )
    .ok();

    for packet in target.history.iter().rev().take(5) {
        writeln!(
            output,
            "  {:>8} {:<8} {} {:>4} {}",
            age_to_string(packet.timestamp, snapshot.taken_at),
            packet.label.to_string(),
            packet.direction,
            packet.rssi,
            packet.detail
        )
        .ok();
    }
    output
}

/// Everything the headless binary prints per report interval.
pub fn render_text(snapshot: &Snapshot, ap_sort: ApSort, client_sort: ClientSort) -> String {
    let counters = snapshot.counters;
    let mut output = String::new();
    writeln!(
        output,
        "Channel: {} | Frames #: {} (mgmt {}, ctrl {}, data {}, misc {}) | Truncated: {} | APs: {} | Clients: {}",
        snapshot.current_channel,
        counters.total,
        counters.management,
        counters.control,
        counters.data,
        counters.misc,
        counters.truncated,
        snapshot.access_points.len(),
        snapshot.clients.len(),
    )
    .ok();
    let security = snapshot.security;
    writeln!(
        output,
        "Rate: {:.1} frames/sec | Secure: {} | Open: {}{} | Busiest: {}",
        snapshot.frame_rate,
        security.secure,
        security.open,
        security
            .secure_percent()
            .map_or(String::new(), |percent| format!(" ({}% secure)", percent)),
        snapshot
            .busiest_channel
            .map_or("-".to_string(), |channel| format!("ch {}", channel)),
    )
    .ok();

    output.push('\n');
    output.push_str(&access_point_table(snapshot, ap_sort));
    output.push('\n');
    output.push_str(&client_table(snapshot, client_sort));
    output.push('\n');
    output.push_str(&channel_table(snapshot));

    let target = target_summary(snapshot);
    if !target.is_empty() {
        output.push('\n');
        output.push_str(&target);
    }
    output
}

pub fn to_json_str(snapshot: &Snapshot) -> String {
    format!(
        "{{\"taken_at\": {},\"current_channel\": {},\"counters\": {},\"frame_rate\": {:.1},\"security\": {},\"busiest_channel\": {},\"access_points\": [{}],\"clients\": [{}],\"channels\": [{}],\"target\": {}}}",
        snapshot.taken_at,
        snapshot.current_channel,
        snapshot.counters.to_json_str(),
        snapshot.frame_rate,
        snapshot.security.to_json_str(),
        snapshot
            .busiest_channel
            .map_or("null".to_string(), |channel| channel.to_string()),
        snapshot.access_points.iter().map(|ap| ap.to_json_str()).join(", "),
        snapshot.clients.iter().map(|client| client.to_json_str()).join(", "),
        snapshot.channels.iter().map(|stats| stats.to_json_str()).join(", "),
        snapshot
            .target
            .as_ref()
            .map_or("null".to_string(), |target| target.to_json_str()),
    )
}
