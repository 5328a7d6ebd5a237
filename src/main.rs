use air_census::capture::{CaptureError, FrameSource, PcapReplay};
use air_census::config::{parse_channel_list, TrackerConfig};
use air_census::devices::{ApSort, ClientSort};
use air_census::engine::{SharedTracker, Tracker};
use air_census::hopper::LoggingRadio;
use air_census::replay::ReplayDriver;
use air_census::report;
use air_census::status::MessageLog;
use air_census::util::{uptime_to_string, Clock, MonotonicClock, ReplayClock};

use anyhow::{Context, Result};
use clap::Parser;
use libwifi::frame::components::MacAddress;
use log::{debug, warn};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "air-census")]
#[command(version, about = "Passive 802.11 topology census from captured traffic")]
struct Cli {
    /// Capture to replay (radiotap or raw 802.11 link type).
    #[arg(short, long)]
    pcap: PathBuf,

    /// MAC address of a device to follow frame by frame.
    #[arg(short, long)]
    target: Option<MacAddress>,

    /// How long the hopper stays on each channel.
    #[arg(short, long, default_value_t = 3000)]
    dwell_ms: u64,

    /// Comma separated hop list, e.g. "1,6,11".
    #[arg(short, long, default_value = "1,2,3,4,5,6,7,8,9,10,11,12,13")]
    channels: String,

    /// Seconds between eviction sweeps.
    #[arg(long, default_value_t = 60)]
    sweep_secs: u64,

    /// Seconds between reports.
    #[arg(short, long, default_value_t = 5)]
    report_secs: u64,

    /// Replay at the speed the frames were captured instead of as fast as possible.
    #[arg(long)]
    pace: bool,

    /// Print reports as JSON instead of tables.
    #[arg(long)]
    json: bool,

    /// Access point ordering: rssi, last, clients, channel or beacons.
    #[arg(long, default_value_t = ApSort::Rssi)]
    sort: ApSort,

    /// Client ordering: rssi, last or frames.
    #[arg(long, default_value_t = ClientSort::Rssi)]
    client_sort: ClientSort,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let cli = Cli::parse();
    let mut status_log = MessageLog::new(true, None);
    status_log.info("Starting...");

    let hop_channels = parse_channel_list(&cli.channels).context("Invalid --channels")?;
    let mut config = TrackerConfig::default()
        .dwell_ms(cli.dwell_ms)
        .hop_channels(hop_channels)
        .sweep_interval_ms(cli.sweep_secs.saturating_mul(1000));
    if let Some(target) = cli.target {
        config = config.target(target);
        status_log.priority(format!("Following target {}", target));
    }
    config.validate().context("Invalid configuration")?;

    let source = PcapReplay::open(&cli.pcap)
        .with_context(|| format!("Couldn't replay {}", cli.pcap.display()))?;
    status_log.info(format!(
        "Replaying {} ({:?})",
        cli.pcap.display(),
        source.datalink()
    ));

    let clock = Arc::new(ReplayClock::new());
    let tracker = SharedTracker::new(Tracker::new(config.clone(), clock.now_ms())?);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    status_log.info(format!(
        "Setting channel hopper: {:?}, {}ms dwell",
        config.hop_channels, config.dwell_ms
    ));
    let driver = ReplayDriver::new(
        tracker.clone(),
        Box::new(LoggingRadio::new()),
        clock.clone(),
        config.sweep_interval_ms,
    );

    let frames_read = Arc::new(AtomicU64::new(0));
    let capture = start_capture_thread(
        running.clone(),
        Box::new(source),
        driver,
        cli.pace,
        frames_read.clone(),
    );

    let uptime = MonotonicClock::new();
    let report_interval = Duration::from_secs(cli.report_secs.max(1));
    let mut last_report = Instant::now();
    while running.load(Ordering::SeqCst) {
        if capture.is_finished() {
            status_log.status(format!(
                "Capture exhausted after {} frames",
                frames_read.load(Ordering::SeqCst)
            ));
            break;
        }

        if last_report.elapsed() >= report_interval {
            last_report = Instant::now();
            print_report(&tracker, clock.as_ref(), &cli, &uptime);
        }
        thread::sleep(Duration::from_millis(50));
    }

    running.store(false, Ordering::SeqCst);
    if capture.join().is_err() {
        status_log.error("Capture thread panicked");
    }

    print_report(&tracker, clock.as_ref(), &cli, &uptime);
    status_log.info("Done.");
    Ok(())
}

/// Reports are stamped with capture time, uptime stays wall clock.
fn print_report(tracker: &SharedTracker, clock: &dyn Clock, cli: &Cli, uptime: &MonotonicClock) {
    let now = clock.now_ms();
    let snapshot = tracker.with(|tracker| {
        tracker.recompute_associations(now);
        tracker.snapshot(now)
    });

    if cli.json {
        println!("{}", report::to_json_str(&snapshot));
    } else {
        println!("Uptime: {}", uptime_to_string(Duration::from_millis(uptime.now_ms())));
        println!("{}", report::render_text(&snapshot, cli.sort, cli.client_sort));
    }
}

/// Pacing only sleeps between frames. Engine time comes from the frames either way.
fn start_capture_thread(
    running: Arc<AtomicBool>,
    mut source: Box<dyn FrameSource>,
    mut driver: ReplayDriver,
    pace: bool,
    frames_read: Arc<AtomicU64>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut previous: Option<Duration> = None;
        while running.load(Ordering::SeqCst) {
            let frame = match source.next_frame() {
                Some(Ok(frame)) => frame,
                Some(Err(e @ CaptureError::Radiotap(_))) => {
                    debug!("{}", e);
                    continue;
                }
                Some(Err(e)) => {
                    warn!("Stopping capture: {}", e);
                    break;
                }
                None => break,
            };

            if pace {
                if let Some(previous) = previous {
                    if let Some(gap) = frame.timestamp.checked_sub(previous) {
                        thread::sleep(gap);
                    }
                }
                previous = Some(frame.timestamp);
            }

            // Rejections are counted and logged by the tracker.
            let _ = driver.feed(&frame);
            frames_read.store(driver.frames(), Ordering::SeqCst);
        }
    })
}
