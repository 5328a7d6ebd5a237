use nom::bytes::complete::take;
use nom::IResult;

use crate::error::Error;
use crate::frame::components::MacAddress;

mod elements;
mod frame_control;
mod header;

pub use elements::{parse_ssid_element, security_of};
pub use frame_control::parse_frame_control;
pub use header::{parse_header, Header};

/// Length of the frame control field.
pub const FRAME_CONTROL_LEN: usize = 2;
/// Frame control, duration, three addresses and sequence control.
pub const HEADER_LEN: usize = 24;
/// Offset of the third address field, counted from the start of the frame.
pub const ADDRESS_3_OFFSET: usize = 16;
/// Frame control, duration and the three addresses. Sequence control is optional.
pub const ADDRESSES_END: usize = ADDRESS_3_OFFSET + 6;
/// Beacons carry timestamp (8) and interval (2) before the capability field.
pub const CAPABILITY_OFFSET: usize = HEADER_LEN + 10;
pub const BEACON_ELEMENTS_OFFSET: usize = CAPABILITY_OFFSET + 2;
/// Probe requests have no fixed fields, their elements follow the header directly.
pub const PROBE_REQUEST_ELEMENTS_OFFSET: usize = HEADER_LEN;

/// Fail with [Error::Truncated] unless `input` holds at least `needed` bytes.
///
/// Every fixed-offset read goes through this first.
pub fn require(input: &[u8], needed: usize) -> Result<(), Error> {
    if input.len() < needed {
        return Err(Error::Truncated {
            needed,
            available: input.len(),
        });
    }
    Ok(())
}

/// Parse mac addresses.
/// Just take 6 bytes, clone them and create a new MacAddress struct from those bytes.
pub fn parse_mac(input: &[u8]) -> IResult<&[u8], MacAddress> {
    let (remaining, bytes) = take(6usize)(input)?;
    Ok((remaining, MacAddress(clone_slice::<6>(bytes))))
}

/// A convenience method to get a fixed-size slice copy from any slice.
/// Callers make sure the slice holds at least `X` bytes.
pub(crate) fn clone_slice<const X: usize>(slice: &[u8]) -> [u8; X] {
    let mut cloned_slice: [u8; X] = [0; X];
    cloned_slice.copy_from_slice(&slice[0..X]);

    cloned_slice
}
