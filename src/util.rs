use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of engine time in milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Milliseconds since the clock was created.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        MonotonicClock {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        MonotonicClock::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Time taken from the capture itself. It only moves forward: a frame stamped earlier than
/// one already seen leaves it where it is.
#[derive(Debug, Default)]
pub struct ReplayClock {
    now: AtomicU64,
}

impl ReplayClock {
    pub fn new() -> Self {
        ReplayClock::default()
    }

    /// Move to `now` unless the clock is already past it. Returns the clock's time afterwards.
    pub fn advance_to(&self, now: u64) -> u64 {
        self.now.fetch_max(now, Ordering::SeqCst).max(now)
    }
}

impl Clock for ReplayClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// How long ago `then` was, as "4s", "12m" or "3h".
pub fn age_to_string(then: u64, now: u64) -> String {
    let elapsed_seconds = now.saturating_sub(then) / 1000;
    if elapsed_seconds > 3600 {
        format!("{}h", elapsed_seconds / 3600)
    } else if elapsed_seconds > 60 {
        format!("{}m", elapsed_seconds / 60)
    } else {
        format!("{}s", elapsed_seconds)
    }
}

pub fn uptime_to_string(uptime: Duration) -> String {
    let total_seconds = uptime.as_secs();
    format!(
        "{:02}:{:02}:{:02}",
        total_seconds / 3600,
        (total_seconds % 3600) / 60,
        total_seconds % 60
    )
}

pub fn max_column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut max_widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();

    for row_data in rows {
        for (i, cell) in row_data.iter().enumerate() {
            if let Some(width) = max_widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    max_widths
}

pub fn format_row(row: &[String], widths: &[usize]) -> String {
    row.iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(" | ")
}
