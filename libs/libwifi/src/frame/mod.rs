/// Contains structs representing recurring sets of structured data.
/// For instance, MAC-Addresses, the frame control field, security classes.
pub mod components;

use crate::frame::components::{FrameControl, MacAddress, Security};
use crate::frame_types::{FrameSubType, FrameType, PacketClass};

/// A raw buffer as delivered by a capture source, plus its out-of-band metadata.
///
/// `declared_len` is the length the capture layer claims for the frame. It may be shorter
/// than `bytes` (padding, FCS) and must never be trusted beyond `bytes.len()`.
#[derive(Clone, Copy, Debug)]
pub struct RawFrame<'a> {
    pub bytes: &'a [u8],
    pub declared_len: usize,
    pub class_hint: Option<PacketClass>,
    pub rssi: i8,
    pub channel: u8,
}

impl<'a> RawFrame<'a> {
    pub fn new(bytes: &'a [u8], rssi: i8, channel: u8) -> Self {
        RawFrame {
            bytes,
            declared_len: bytes.len(),
            class_hint: None,
            rssi,
            channel,
        }
    }

    pub fn with_class_hint(mut self, class_hint: PacketClass) -> Self {
        self.class_hint = Some(class_hint);
        self
    }

    pub fn with_declared_len(mut self, declared_len: usize) -> Self {
        self.declared_len = declared_len;
        self
    }

    /// The bytes that may be read: the declared length, capped at what was captured.
    pub fn payload(&self) -> &'a [u8] {
        &self.bytes[..self.declared_len.min(self.bytes.len())]
    }
}

/// Subtype specific information pulled out of the frame body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameBody {
    /// Nothing beyond the header is parsed for this subtype.
    Empty,
    Beacon {
        /// `None` when the SSID element is missing or doesn't fit the payload,
        /// `Some("")` for hidden networks.
        ssid: Option<String>,
        security: Security,
    },
    ProbeRequest {
        ssid: Option<String>,
    },
}

/// A classified frame. Borrows the payload of the [RawFrame] it came from.
#[derive(Clone, Debug)]
pub struct FrameRecord<'a> {
    pub frame_control: FrameControl,
    pub destination: Option<MacAddress>,
    pub source: Option<MacAddress>,
    pub bssid: Option<MacAddress>,
    pub rssi: i8,
    pub channel: u8,
    pub payload: &'a [u8],
    pub body: FrameBody,
}

impl FrameRecord<'_> {
    pub fn frame_type(&self) -> FrameType {
        self.frame_control.frame_type
    }

    pub fn frame_subtype(&self) -> FrameSubType {
        self.frame_control.frame_subtype
    }

    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Whether `mac` sent or is meant to receive this frame.
    pub fn involves(&self, mac: &MacAddress) -> bool {
        self.source.as_ref() == Some(mac) || self.destination.as_ref() == Some(mac)
    }
}
