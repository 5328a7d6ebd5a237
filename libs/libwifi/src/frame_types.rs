use strum_macros::Display;

/// Enum with all frame types.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameType {
    Management,
    Control,
    Data,
    Unknown,
}

/// The packet class as reported out-of-band by the capture layer.
///
/// Promiscuous-mode drivers usually tag every buffer with one of these before any byte
/// has been looked at. `Misc` covers everything the driver couldn't place.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum PacketClass {
    Management,
    Control,
    Data,
    Misc,
}

impl PacketClass {
    pub fn frame_type(&self) -> FrameType {
        match self {
            PacketClass::Management => FrameType::Management,
            PacketClass::Control => FrameType::Control,
            PacketClass::Data => FrameType::Data,
            PacketClass::Misc => FrameType::Unknown,
        }
    }

    /// Derive the class from the first frame control byte, for sources that carry no hint.
    pub fn from_frame_control(byte: u8) -> PacketClass {
        match (byte >> 2) & 0b11 {
            0 => PacketClass::Management,
            1 => PacketClass::Control,
            2 => PacketClass::Data,
            _ => PacketClass::Misc,
        }
    }
}

/// Enum with all frame subtypes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display)]
pub enum FrameSubType {
    // Management subtypes
    AssociationRequest,
    AssociationResponse,
    ReassociationRequest,
    ReassociationResponse,
    ProbeRequest,
    ProbeResponse,
    TimingAdvertisement,
    Beacon,
    Atim,
    Disassociation,
    Authentication,
    Deauthentication,
    Action,
    ActionNoAck,

    // Control subtypes
    Trigger,
    Tack,
    BeamformingReportPoll,
    NdpAnnouncement,
    ControlFrameExtension,
    ControlWrapper,
    BlockAckRequest,
    BlockAck,
    PsPoll,
    Rts,
    Cts,
    Ack,
    CfEnd,
    CfEndCfAck,

    // Data subtypes
    Data,
    DataCfAck,
    DataCfPoll,
    DataCfAckCfPoll,
    NullData,
    CfAck,
    CfPoll,
    CfAckCfPoll,
    QosData,
    QosDataCfAck,
    QosDataCfPoll,
    QosDataCfAckCfPoll,
    QosNull,
    QosCfPoll,
    QosCfAckCfPoll,

    // Special subtypes
    Reserved,
    Unhandled,
}

impl FrameSubType {
    /// Interpret the 4 subtype bits in the context of a frame type.
    pub fn from_bits(frame_type: FrameType, bits: u8) -> FrameSubType {
        match frame_type {
            FrameType::Management => management_frame_subtype(bits),
            FrameType::Control => control_frame_subtype(bits),
            FrameType::Data => data_frame_subtype(bits),
            FrameType::Unknown => FrameSubType::Unhandled,
        }
    }

    pub fn is_association_request(&self) -> bool {
        matches!(
            self,
            FrameSubType::AssociationRequest | FrameSubType::ReassociationRequest
        )
    }

    pub fn is_association_response(&self) -> bool {
        matches!(
            self,
            FrameSubType::AssociationResponse | FrameSubType::ReassociationResponse
        )
    }
}

fn management_frame_subtype(bits: u8) -> FrameSubType {
    match bits {
        0 => FrameSubType::AssociationRequest,
        1 => FrameSubType::AssociationResponse,
        2 => FrameSubType::ReassociationRequest,
        3 => FrameSubType::ReassociationResponse,
        4 => FrameSubType::ProbeRequest,
        5 => FrameSubType::ProbeResponse,
        6 => FrameSubType::TimingAdvertisement,
        8 => FrameSubType::Beacon,
        9 => FrameSubType::Atim,
        10 => FrameSubType::Disassociation,
        11 => FrameSubType::Authentication,
        12 => FrameSubType::Deauthentication,
        13 => FrameSubType::Action,
        14 => FrameSubType::ActionNoAck,
        7 | 15 => FrameSubType::Reserved,
        _ => FrameSubType::Unhandled,
    }
}

fn control_frame_subtype(bits: u8) -> FrameSubType {
    match bits {
        0 | 1 => FrameSubType::Reserved,
        2 => FrameSubType::Trigger,
        3 => FrameSubType::Tack,
        4 => FrameSubType::BeamformingReportPoll,
        5 => FrameSubType::NdpAnnouncement,
        6 => FrameSubType::ControlFrameExtension,
        7 => FrameSubType::ControlWrapper,
        8 => FrameSubType::BlockAckRequest,
        9 => FrameSubType::BlockAck,
        10 => FrameSubType::PsPoll,
        11 => FrameSubType::Rts,
        12 => FrameSubType::Cts,
        13 => FrameSubType::Ack,
        14 => FrameSubType::CfEnd,
        15 => FrameSubType::CfEndCfAck,
        _ => FrameSubType::Unhandled,
    }
}

fn data_frame_subtype(bits: u8) -> FrameSubType {
    match bits {
        0 => FrameSubType::Data,
        1 => FrameSubType::DataCfAck,
        2 => FrameSubType::DataCfPoll,
        3 => FrameSubType::DataCfAckCfPoll,
        4 => FrameSubType::NullData,
        5 => FrameSubType::CfAck,
        6 => FrameSubType::CfPoll,
        7 => FrameSubType::CfAckCfPoll,
        8 => FrameSubType::QosData,
        9 => FrameSubType::QosDataCfAck,
        10 => FrameSubType::QosDataCfPoll,
        11 => FrameSubType::QosDataCfAckCfPoll,
        12 => FrameSubType::QosNull,
        13 => FrameSubType::Reserved,
        14 => FrameSubType::QosCfPoll,
        15 => FrameSubType::QosCfAckCfPoll,
        _ => FrameSubType::Unhandled,
    }
}
