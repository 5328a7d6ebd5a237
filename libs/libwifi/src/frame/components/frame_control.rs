use crate::frame_types::*;

#[inline]
/// Mini helper to check, whether a bit is set or not.
fn flag_is_set(data: u8, bit: u8) -> bool {
    (data & (1 << bit)) > 0
}

/// The very first two bytes of every frame contain the FrameControl header.
///
/// First byte:
///
/// - **bit_0-1**: Protocol version.
/// - **bit_2-3**: [FrameType]
/// - **bit_4-7**: [FrameSubType]
///
/// Second byte (Flags):
/// - **bit_0** `to_ds`: Set if the frame is headed into the distribution system.
/// - **bit_1** `from_ds`: Set if the frame leaves the distribution system, i.e. an AP sent it.
/// - **bit_2** `more_frag`
/// - **bit_3** `retry`
/// - **bit_4** `power_mgmt`
/// - **bit_5** `more_data`
/// - **bit_6** `protected`: The body is encrypted.
/// - **bit_7** `order`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameControl {
    pub protocol_version: u8,
    pub frame_type: FrameType,
    pub frame_subtype: FrameSubType,
    /// The subtype bits as they were on the air, kept so the subtype can be
    /// re-read when the capture layer reports a different class.
    pub subtype_bits: u8,
    pub flags: u8,
}

impl FrameControl {
    /// Re-interpret this frame control under the class the capture layer reported.
    pub fn with_frame_type(self, frame_type: FrameType) -> FrameControl {
        FrameControl {
            frame_type,
            frame_subtype: FrameSubType::from_bits(frame_type, self.subtype_bits),
            ..self
        }
    }

    pub fn to_ds(&self) -> bool {
        flag_is_set(self.flags, 0)
    }

    pub fn from_ds(&self) -> bool {
        flag_is_set(self.flags, 1)
    }

    pub fn protected(&self) -> bool {
        flag_is_set(self.flags, 6)
    }
}
