use nom::combinator::opt;
use nom::number::complete::le_u16;
use nom::sequence::tuple;

use super::parse_mac;
use crate::error::Error;
use crate::frame::components::MacAddress;

/// The part of the header shared by management and data frames, after the frame control.
///
/// Only the to-DS/from-DS flags decide what the addresses mean for data frames.
/// Here they are kept positional: `address_1` is the receiver, `address_2` the
/// transmitter, `address_3` the BSSID for management frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub duration: u16,
    pub address_1: MacAddress,
    pub address_2: MacAddress,
    pub address_3: MacAddress,
    /// `None` when the frame ends right after the third address.
    pub sequence_control: Option<u16>,
}

/// Parse and return the [Header] following a frame control field.
pub fn parse_header(input: &[u8]) -> Result<(&[u8], Header), Error> {
    let (remaining, (duration, address_1, address_2, address_3, sequence_control)) =
        tuple((le_u16, parse_mac, parse_mac, parse_mac, opt(le_u16)))(input)?;

    Ok((
        remaining,
        Header {
            duration,
            address_1,
            address_2,
            address_3,
            sequence_control,
        },
    ))
}
