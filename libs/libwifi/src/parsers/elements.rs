use nom::bytes::complete::take;
use nom::number::complete::u8 as get_u8;
use nom::sequence::tuple;
use nom::IResult;

use super::{BEACON_ELEMENTS_OFFSET, CAPABILITY_OFFSET};
use crate::frame::components::Security;

const SSID_TAG: u8 = 0x00;
const RSN_TAG: u8 = 0x30;
const VENDOR_TAG: u8 = 0xDD;
const WPA_OUI: [u8; 3] = [0x00, 0x50, 0xF2];
const CAPABILITY_PRIVACY: u16 = 0x0010;
pub(crate) const MAX_SSID_LEN: usize = 32;

/// Parse an SSID element sitting at the very start of `input`.
///
/// 1 byte: Element id (must be 0)
/// 1 byte: Element length (at most 32)
/// $element_length bytes: the SSID
///
/// Returns `None` when the element is something else, oversized, or runs past the input.
/// A zero length element yields an empty string, which is how hidden networks announce themselves.
pub fn parse_ssid_element(input: &[u8]) -> Option<String> {
    let parsed: IResult<&[u8], (u8, u8)> = tuple((get_u8, get_u8))(input);
    let (remaining, (element_id, length)) = parsed.ok()?;
    if element_id != SSID_TAG || length as usize > MAX_SSID_LEN {
        return None;
    }

    let data: IResult<&[u8], &[u8]> = take(length)(remaining);
    let (_, data) = data.ok()?;
    Some(String::from_utf8_lossy(data).into_owned())
}

/// Classify the security of a network from a full beacon (or probe response) frame.
///
/// The capability field's privacy bit decides between Open and the rest. With privacy set,
/// the bytes after the capability field are scanned one by one: an RSN tag means WPA2,
/// a vendor tag carrying the 00:50:F2 OUI means WPA, whichever comes first in the byte
/// stream. Privacy without either is WEP.
///
/// This is a byte scan, not an element walk. A stray 0x30 inside another element counts.
pub fn security_of(payload: &[u8]) -> Security {
    let capability = match payload.get(CAPABILITY_OFFSET..CAPABILITY_OFFSET + 2) {
        Some(bytes) => u16::from_le_bytes([bytes[0], bytes[1]]),
        None => return Security::Open,
    };

    if capability & CAPABILITY_PRIVACY == 0 {
        return Security::Open;
    }

    let scan_end = payload.len().saturating_sub(2);
    (BEACON_ELEMENTS_OFFSET..scan_end)
        .find_map(|idx| match payload[idx] {
            RSN_TAG => Some(Security::Wpa2),
            VENDOR_TAG if payload.get(idx + 2..idx + 5) == Some(&WPA_OUI[..]) => {
                Some(Security::Wpa)
            }
            _ => None,
        })
        .unwrap_or(Security::Wep)
}
