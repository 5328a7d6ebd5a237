/// Libwifi's own [Error](error::Error) implementation
pub mod error;
/// The [RawFrame](frame::RawFrame) input, the [FrameRecord](frame::FrameRecord) output and their components.
pub mod frame;
/// Enums representing frame types and frame subtypes.
mod frame_types;
/// [nom] parsers and fixed offsets.
pub mod parsers;
/// All traits used or provided by this library.
mod traits;

use log::trace;

use crate::error::Error;
use crate::frame::{FrameBody, FrameRecord, RawFrame};
use crate::parsers::*;

// Re-exports for user convenience
pub use crate::frame_types::*;
pub use crate::parsers::security_of;
pub use crate::traits::*;

/// Classify a raw frame.
///
/// The class reported by the capture layer wins over the type bits in the frame control,
/// the subtype bits are then read in the context of that class. Without a hint the frame
/// control alone decides.
///
/// Every fixed-offset read is checked against the declared payload length first. A frame
/// that is too short for the fields its class needs comes back as [Error::Truncated],
/// nothing is read past the end.
///
/// Management frames yield their three addresses, beacons additionally their SSID and
/// security class, probe requests their SSID. Data frames yield their addresses.
/// Control frames only carry the frame control.
pub fn classify<'a>(raw: &RawFrame<'a>) -> Result<FrameRecord<'a>, Error> {
    let payload = raw.payload();
    require(payload, FRAME_CONTROL_LEN)?;

    let (remaining, frame_control) = parse_frame_control(payload)?;
    let frame_type = match raw.class_hint {
        Some(hint) => hint.frame_type(),
        None => frame_control.frame_type,
    };
    if frame_type == FrameType::Unknown {
        return Err(Error::UnknownClass(raw.class_hint));
    }
    let frame_control = frame_control.with_frame_type(frame_type);

    let mut record = FrameRecord {
        frame_control,
        destination: None,
        source: None,
        bssid: None,
        rssi: raw.rssi,
        channel: raw.channel,
        payload,
        body: FrameBody::Empty,
    };

    if frame_type == FrameType::Control {
        return Ok(record);
    }

    require(payload, ADDRESSES_END)?;
    let (_, header) = parse_header(remaining)?;
    record.destination = Some(header.address_1);
    record.source = Some(header.address_2);
    record.bssid = Some(header.address_3);

    if frame_type == FrameType::Management {
        record.body = match frame_control.frame_subtype {
            FrameSubType::Beacon => parse_beacon_body(payload)?,
            FrameSubType::ProbeRequest => FrameBody::ProbeRequest {
                ssid: parse_ssid_element(
                    payload
                        .get(PROBE_REQUEST_ELEMENTS_OFFSET..)
                        .unwrap_or_default(),
                ),
            },
            _ => FrameBody::Empty,
        };
    }

    trace!(
        "classified {} {} from {:?}",
        frame_type,
        frame_control.frame_subtype,
        record.source
    );
    Ok(record)
}

/// Beacon body: the fixed fields up to the capability must be present, the SSID element is
/// optional.
fn parse_beacon_body(payload: &[u8]) -> Result<FrameBody, Error> {
    require(payload, BEACON_ELEMENTS_OFFSET)?;

    Ok(FrameBody::Beacon {
        ssid: parse_ssid_element(&payload[BEACON_ELEMENTS_OFFSET..]),
        security: security_of(payload),
    })
}
