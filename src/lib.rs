//! air_census: a passive 802.11 topology census.
//!
//! Frames come in from a [capture::FrameSource], are classified by `libwifi` and folded into the
//! registries of an [engine::Tracker]: access points, clients, per-channel activity and an
//! optional target device. Recorded captures run on their own timeline through
//! [replay::ReplayDriver]; live sources get background threads that hop channels ([hopper])
//! and evict stale state ([sweeper]). [report] renders snapshots for the operator.

pub mod association;
pub mod capture;
pub mod channels;
pub mod config;
pub mod devices;
pub mod engine;
pub mod hopper;
pub mod oui;
pub mod replay;
pub mod report;
pub mod status;
pub mod sweeper;
pub mod targets;
pub mod util;
