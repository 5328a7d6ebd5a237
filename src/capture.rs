use libwifi::frame::RawFrame;
use libwifi::PacketClass;
use log::{debug, info};
use pcap_file::pcap::PcapReader;
use pcap_file::{DataLink, PcapError};
use radiotap::Radiotap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const FCS_LEN: usize = 4;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Couldn't open capture: {0}")]
    Io(#[from] std::io::Error),

    #[error("Couldn't read capture: {0}")]
    Pcap(#[from] PcapError),

    #[error("Link type {0:?} carries no 802.11 frames")]
    UnsupportedLinkType(DataLink),

    #[error("Couldn't read packet data with Radiotap: {0}")]
    Radiotap(String),
}

/// One frame as it came off the capture, owning its bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Capture timestamp, relative to whatever epoch the source uses.
    pub timestamp: Duration,
    /// The 802.11 frame, link-layer encapsulation already stripped.
    pub data: Vec<u8>,
    /// Length of the frame on the air, without encapsulation and FCS.
    pub declared_len: usize,
    pub class_hint: Option<PacketClass>,
    pub rssi: i8,
    /// 0 when the source doesn't know.
    pub channel: u8,
}

impl CapturedFrame {
    pub fn as_raw(&self) -> RawFrame<'_> {
        let raw = RawFrame::new(&self.data, self.rssi, self.channel)
            .with_declared_len(self.declared_len);
        match self.class_hint {
            Some(class) => raw.with_class_hint(class),
            None => raw,
        }
    }
}

/// Anything that produces captured frames, one at a time.
pub trait FrameSource: Send {
    /// `None` once the source is exhausted.
    fn next_frame(&mut self) -> Option<Result<CapturedFrame, CaptureError>>;
}

/// Map a 2.4 or 5 GHz centre frequency to its channel number, 0 if it is neither.
pub fn freq_to_channel(freq: u16) -> u8 {
    match freq {
        2484 => 14,
        2412..=2472 => ((freq - 2407) / 5) as u8,
        5000..=5895 => ((freq - 5000) / 5) as u8,
        _ => 0,
    }
}

/// Replays a pcap file recorded with radiotap or bare 802.11 encapsulation.
pub struct PcapReplay<R: Read> {
    reader: PcapReader<R>,
    datalink: DataLink,
    frames: u64,
}

impl PcapReplay<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let file = File::open(path.as_ref())?;
        info!("Replaying {}", path.as_ref().display());
        PcapReplay::new(BufReader::new(file))
    }
}

impl<R: Read> PcapReplay<R> {
    pub fn new(reader: R) -> Result<Self, CaptureError> {
        let reader = PcapReader::new(reader)?;
        let datalink = reader.header().datalink;
        match datalink {
            DataLink::IEEE802_11_RADIOTAP | DataLink::IEEE802_11 => {}
            other => return Err(CaptureError::UnsupportedLinkType(other)),
        }

        Ok(PcapReplay {
            reader,
            datalink,
            frames: 0,
        })
    }

    pub fn datalink(&self) -> DataLink {
        self.datalink
    }
}

/// Strip the radiotap header, keeping signal, channel and the FCS flag.
fn decapsulate_radiotap(
    timestamp: Duration,
    packet: &[u8],
    orig_len: usize,
) -> Result<CapturedFrame, CaptureError> {
    let radiotap =
        Radiotap::from_bytes(packet).map_err(|error| CaptureError::Radiotap(error.to_string()))?;
    let header_len = radiotap.header.length;
    let data = packet.get(header_len..).unwrap_or_default().to_vec();

    let fcs = radiotap.flags.map_or(false, |flags| flags.fcs);
    let mut declared_len = orig_len.saturating_sub(header_len);
    if fcs {
        declared_len = declared_len.saturating_sub(FCS_LEN);
    }

    Ok(CapturedFrame {
        timestamp,
        declared_len,
        class_hint: data.first().map(|byte| PacketClass::from_frame_control(*byte)),
        rssi: radiotap.antenna_signal.map_or(0, |signal| signal.value),
        channel: radiotap
            .channel
            .map_or(0, |channel| freq_to_channel(channel.freq)),
        data,
    })
}

impl<R: Read + Send> FrameSource for PcapReplay<R> {
    fn next_frame(&mut self) -> Option<Result<CapturedFrame, CaptureError>> {
        let packet = match self.reader.next_packet()? {
            Ok(packet) => packet,
            Err(error) => return Some(Err(error.into())),
        };
        self.frames += 1;

        let orig_len = packet.orig_len as usize;
        let frame = match self.datalink {
            DataLink::IEEE802_11_RADIOTAP => {
                decapsulate_radiotap(packet.timestamp, &packet.data, orig_len)
            }
            _ => Ok(CapturedFrame {
                timestamp: packet.timestamp,
                declared_len: orig_len,
                class_hint: packet
                    .data
                    .first()
                    .map(|byte| PacketClass::from_frame_control(*byte)),
                rssi: 0,
                channel: 0,
                data: packet.data.to_vec(),
            }),
        };

        if let Err(error) = &frame {
            debug!("Frame {} unreadable: {}", self.frames, error);
        }
        Some(frame)
    }
}

/// Replays frames that are already in memory. Handy for tests and demos.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: std::collections::VecDeque<CapturedFrame>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = CapturedFrame>) -> Self {
        MemorySource {
            frames: frames.into_iter().collect(),
        }
    }
}

impl FrameSource for MemorySource {
    fn next_frame(&mut self) -> Option<Result<CapturedFrame, CaptureError>> {
        self.frames.pop_front().map(Ok)
    }
}
